//! Tessera VDOM
//!
//! Virtual node model and the append-only builder that render functions
//! write into.
//!
//! # Example
//! ```rust,ignore
//! use tessera_vdom::{Attrs, RenderOut};
//!
//! let mut out = RenderOut::new();
//! out.begin_element("ul", Attrs::new(), None)?;
//! out.element_with_text("li", Attrs::new(), Some("x"), "1")?;
//! out.end_element()?;
//! out.end();
//! let result = out.result()?;
//! ```

mod attrs;
mod builder;
mod emitter;
mod error;
mod node;
mod result;
mod tree;

pub use attrs::{AttrValue, Attrs};
pub use builder::{RenderEvent, RenderEventKind, RenderOut};
pub use emitter::{EmitterEvent, EventEmitter};
pub use error::{VdomError, VdomResult};
pub use node::{ComponentId, ElementFlags, EventBinding, Input, VComponent, VElement, VNode, VNodeKind};
pub use result::RenderResult;
pub use tree::{VChildren, VNodeId, VTree};
