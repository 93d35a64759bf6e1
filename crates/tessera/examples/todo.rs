//! Example: a keyed todo list driven by clicks

use serde_json::json;
use tessera::{Attrs, Behavior, Config, DomEvent, HookCx, Input, RenderOut, Runtime, State, VElement};

struct TodoList;

impl Behavior for TodoList {
    fn render(&self, _input: &Input, state: &State, out: &mut RenderOut) -> anyhow::Result<()> {
        let items = state.get("items").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        out.begin_element("ul", Attrs::new().with("class", "todos"), None)?;
        for item in &items {
            let text = item.as_str().unwrap_or_default();
            out.element_with_text("li", Attrs::new(), Some(&format!("item-{text}")), text)?;
        }
        out.end_element()?;
        let add = VElement::new("button", Attrs::new()).on("click", "add");
        out.begin_element_node(add, Some("add"))?;
        out.text("Add")?;
        out.end_element()?;
        Ok(())
    }

    fn handle_event(&self, method: &str, _event: &DomEvent, cx: &mut HookCx<'_>) -> Option<anyhow::Result<()>> {
        if method != "add" {
            return None;
        }
        let mut items = cx.get("items").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        items.push(json!(format!("task {}", items.len() + 1)));
        cx.set_state("items", items);
        Some(Ok(()))
    }
}

fn main() -> anyhow::Result<()> {
    tessera::init_logging();

    let mut runtime = Runtime::new(Config::default());
    runtime.register("todo-list", || TodoList);
    let body = runtime.document().body();
    let id = runtime.mount("todo-list", Input::new(), body)?;

    println!("Tessera v{} mounted {id}", tessera::VERSION);

    let add = runtime.get_el(&id, "add").ok_or_else(|| anyhow::anyhow!("add button missing"))?;
    for _ in 0..3 {
        runtime.dispatch_event(add, "click", json!(null))?;
        runtime.tick()?;
    }

    let first = runtime.get_el(&id, "item-task 1");
    println!("first item node: {first:?}");
    println!("text: {}", runtime.document().tree.text_content(body));
    Ok(())
}
