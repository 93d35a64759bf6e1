//! Runtime errors

use tessera_dom::{DomError, NodeId};
use tessera_vdom::{ComponentId, VdomError};

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime errors
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("DOM error: {0}")]
    Dom(#[from] DomError),

    #[error("render tree error: {0}")]
    Vdom(#[from] VdomError),

    /// No factory registered under this type name
    #[error("unknown component type `{0}`")]
    UnknownComponentType(String),

    /// Component id is not mounted (never was, or already destroyed)
    #[error("component `{0}` is not mounted")]
    UnknownComponent(ComponentId),

    /// An event binding names a method the component does not handle
    #[error("component `{component}` has no `{method}` handler for `{event}`")]
    MissingEventHandler {
        component: ComponentId,
        event: String,
        method: String,
    },

    #[error("render of `{component}` failed")]
    Render {
        component: ComponentId,
        #[source]
        source: anyhow::Error,
    },

    #[error("{hook} of `{component}` failed")]
    Hook {
        component: ComponentId,
        hook: &'static str,
        #[source]
        source: anyhow::Error,
    },

    /// The node has no parent to render around
    #[error("node {0} is not attached")]
    Detached(NodeId),
}
