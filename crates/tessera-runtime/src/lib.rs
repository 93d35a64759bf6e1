//! Tessera Runtime
//!
//! Reconciles virtual trees into a [`tessera_dom::Document`], keeping
//! component instances alive across renders.
//!
//! # Example
//! ```rust,ignore
//! use tessera_runtime::{Behavior, Config, Runtime, State};
//! use tessera_vdom::{Attrs, Input, RenderOut};
//!
//! struct Hello;
//!
//! impl Behavior for Hello {
//!     fn render(&self, _input: &Input, _state: &State, out: &mut RenderOut) -> anyhow::Result<()> {
//!         out.element_with_text("p", Attrs::new(), None, "hello")?;
//!         Ok(())
//!     }
//! }
//!
//! let mut runtime = Runtime::new(Config::default());
//! runtime.register("hello", || Hello);
//! let body = runtime.document().body();
//! let id = runtime.mount("hello", Input::new(), body)?;
//! ```

mod component;
mod config;
mod delegation;
mod error;
mod hydrate;
mod keys;
mod morph;
mod registry;
mod runtime;
mod scheduler;
mod shadow;

pub use component::{Behavior, Component, ComponentState, HookCx, Phase, State, Teardown};
pub use config::Config;
pub use delegation::{DomEvent, EventDelegation};
pub use error::{RuntimeError, RuntimeResult};
pub use hydrate::virtualize;
pub use keys::KeySequence;
pub use registry::ComponentRegistry;
pub use runtime::Runtime;
pub use shadow::{ElementShadow, FragmentShadow};
