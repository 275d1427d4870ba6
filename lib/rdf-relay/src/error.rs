use rdf_relay_api::EngineError;

/// An error raised by source registry mutations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The requested id is already taken by a registered source.
    #[error("a source with id {0} is already registered")]
    DuplicateSourceId(String),
}

/// An error raised while dispatching a query or consuming its results.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum QueryError {
    /// An update was dispatched while no source is marked primary.
    #[error("no source is marked primary, updates have no target")]
    NoPrimarySource,
    /// The engine rejected the operation before a result stream existed.
    #[error(transparent)]
    Engine(#[from] EngineError),
    /// The result stream failed after the operation had started.
    #[error("result stream failed: {0}")]
    Stream(#[source] EngineError),
    /// A result chunk that looked like a row could not be parsed.
    #[error("malformed result row: {0}")]
    InvalidBinding(#[source] serde_json::Error),
    /// CONSTRUCT output requested as JSON-LD could not be parsed.
    #[error("malformed JSON-LD document: {0}")]
    InvalidJsonLd(#[source] serde_json::Error),
}
