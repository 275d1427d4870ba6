use std::error::Error;

/// An error surfaced by the federation engine while evaluating a query or
/// streaming its result.
///
/// Engines fail for reasons the relay cannot interpret (network failures,
/// malformed queries, timeouts), so the error is carried opaquely and is never
/// retried.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct EngineError(#[from] EngineErrorKind);

#[derive(Debug, thiserror::Error)]
enum EngineErrorKind {
    #[error("{0}")]
    Msg(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl EngineError {
    /// Builds an error from another error.
    #[inline]
    pub fn new(error: impl Into<Box<dyn Error + Send + Sync + 'static>>) -> Self {
        Self(EngineErrorKind::Other(error.into()))
    }

    /// Builds an error from a printable error message.
    #[inline]
    pub fn msg(msg: impl Into<String>) -> Self {
        Self(EngineErrorKind::Msg(msg.into()))
    }
}
