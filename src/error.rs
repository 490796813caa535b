//! Error taxonomy for the update pipeline.

use thiserror::Error;

/// Errors surfaced by update submission and mode transitions.
///
/// Synchronization itself never fails: the update lock has no error paths,
/// and a failed cycle always releases it through its guard. These variants
/// cover the domain-level failures around it.
#[derive(Debug, Error)]
pub enum UpdateError {
    /// A mode name arrived that does not map to any known display mode.
    /// The current mode is left unchanged.
    #[error("unknown plot mode '{0}'")]
    InvalidMode(String),

    /// Dispatch was attempted after the window or its UI-owner context was
    /// torn down. The update is dropped without touching lock or mode state.
    #[error("plot window target is disposed")]
    DisposedTarget,

    /// The active plot UI failed while a payload was being applied to it.
    /// The update lock is still released; mode state is not corrupted.
    #[error("failed to apply plot update: {0}")]
    Apply(#[source] Box<dyn std::error::Error + Send + Sync>),
}
