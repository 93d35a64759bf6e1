//! End-to-end tests: async render, reconcile, update, dispatch

use serde_json::json;
use tessera::{Attrs, Behavior, Config, DomEvent, HookCx, Input, RenderOut, Runtime, State, VElement};

struct Badge;

impl Behavior for Badge {
    fn render(&self, input: &Input, state: &State, out: &mut RenderOut) -> anyhow::Result<()> {
        let label = input.get("label").and_then(|v| v.as_str()).unwrap_or_default();
        let hits = state.get("hits").and_then(|v| v.as_u64()).unwrap_or(0);
        let el = VElement::new("button", Attrs::new().with("class", "badge")).on("click", "hit");
        out.begin_element_node(el, Some("btn"))?;
        out.text(&format!("{label}:{hits}"))?;
        out.end_element()?;
        Ok(())
    }

    fn handle_event(&self, method: &str, _event: &DomEvent, cx: &mut HookCx<'_>) -> Option<anyhow::Result<()>> {
        if method != "hit" {
            return None;
        }
        let hits = cx.get("hits").and_then(|v| v.as_u64()).unwrap_or(0);
        cx.set_state("hits", hits + 1);
        Some(Ok(()))
    }
}

// ============================================================================
// ASYNC RENDER INTO A CONTAINER
// ============================================================================

#[test]
fn test_async_render_then_reconcile() {
    let mut rt = Runtime::new(Config::default());
    rt.register("badge", || Badge);
    let body = rt.document().body();

    let mut out = RenderOut::new();
    out.element_with_text("h1", Attrs::new(), None, "Title").unwrap();
    let mut branch = out.begin_async().unwrap();
    out.end();
    let done = out.finished();

    let result = smol::block_on(async move {
        let writer = async {
            smol::future::yield_now().await;
            let input = tessera::input_from_json(r#"{"label":"late"}"#).unwrap();
            branch.component("badge", "b", input).unwrap();
            branch.end();
        };
        let (result, ()) = smol::future::zip(done, writer).await;
        result
    })
    .unwrap();

    rt.render_into(body, &result).unwrap();
    assert_eq!(rt.component_count(), 1);
    assert_eq!(rt.document().tree.text_content(body), "Titlelate:0");
}

// ============================================================================
// EVENTS DRIVE UPDATES
// ============================================================================

#[test]
fn test_click_updates_after_tick() {
    let mut rt = Runtime::new(Config::default());
    rt.register("badge", || Badge);
    let body = rt.document().body();
    let mut input = Input::new();
    input.insert("label".into(), json!("a"));
    let id = rt.mount("badge", input, body).unwrap();
    let button = rt.get_el(&id, "btn").unwrap();

    assert_eq!(rt.dispatch_event(button, "click", json!(null)).unwrap(), 1);
    assert_eq!(rt.document().tree.text_content(button), "a:0");
    assert!(rt.has_pending());

    rt.tick().unwrap();
    assert_eq!(rt.document().tree.text_content(button), "a:1");
    assert_eq!(rt.get_el(&id, "btn"), Some(button));
}
