//! Builder and virtual tree errors

use std::sync::Arc;

/// Result type for virtual tree operations
pub type VdomResult<T> = Result<T, VdomError>;

/// Errors raised while building a virtual tree
#[derive(Debug, Clone, thiserror::Error)]
pub enum VdomError {
    /// `<textarea>` received something other than text or a preserved node
    #[error("<textarea> only accepts text content, got {0}")]
    InvalidTextareaChild(&'static str),

    /// `end_element`/`end_fragment` with nothing open
    #[error("{0} called without a matching begin")]
    UnbalancedEnd(&'static str),

    /// Result requested while async branches are outstanding
    #[error("render still has {0} open branch(es)")]
    Pending(usize),

    /// Writing to a builder after `end`
    #[error("builder already ended")]
    Ended,

    /// An error event was emitted with no listener attached
    #[error("unhandled error event: {0}")]
    Unhandled(Arc<anyhow::Error>),

    /// The render reported an error through `RenderOut::error`
    #[error("render failed: {0}")]
    Failed(Arc<anyhow::Error>),
}
