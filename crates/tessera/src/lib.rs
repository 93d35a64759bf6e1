//! Tessera
//!
//! Virtual DOM reconciliation for server-rendered UI components.
//!
//! # Example
//! ```rust,ignore
//! use tessera::{Attrs, Behavior, Config, Input, RenderOut, Runtime, State};
//!
//! struct Hello;
//!
//! impl Behavior for Hello {
//!     fn render(&self, _input: &Input, _state: &State, out: &mut RenderOut) -> anyhow::Result<()> {
//!         out.element_with_text("h1", Attrs::new(), None, "hello")?;
//!         Ok(())
//!     }
//! }
//!
//! tessera::init_logging();
//! let mut runtime = Runtime::new(Config::default());
//! runtime.register("hello", || Hello);
//! let body = runtime.document().body();
//! runtime.mount("hello", Input::new(), body)?;
//! ```

use tracing_subscriber::EnvFilter;

pub use tessera_dom::{Document, DomError, DomTree, MutationKind, NodeId, NodeType};
pub use tessera_runtime::{
    Behavior, ComponentRegistry, Config, DomEvent, HookCx, Phase, Runtime, RuntimeError, RuntimeResult, State,
    virtualize,
};
pub use tessera_vdom::{
    AttrValue, Attrs, ComponentId, ElementFlags, Input, RenderEventKind, RenderOut, RenderResult, VElement,
    VNodeKind, VTree, VdomError,
};

// Sub-crates for advanced usage
pub use tessera_dom as dom;
pub use tessera_runtime as runtime;
pub use tessera_vdom as vdom;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Install a `fmt` subscriber filtered by `RUST_LOG`, defaulting to `info`.
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Parse an input object from JSON text
pub fn input_from_json(text: &str) -> anyhow::Result<Input> {
    match serde_json::from_str(text)? {
        serde_json::Value::Object(map) => Ok(map),
        other => anyhow::bail!("component input must be an object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_from_json() {
        let input = input_from_json(r#"{"label":"a","count":2}"#).unwrap();
        assert_eq!(input.get("count"), Some(&serde_json::json!(2)));
        assert!(input_from_json("[1,2]").is_err());
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging();
        init_logging();
    }
}
