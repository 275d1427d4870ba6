use crate::{EngineError, EngineSource, ExtensionFunctionsRef};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The media type in which SELECT results are streamed: one JSON object per
/// chunk, preceded by a head/vars chunk.
pub const SPARQL_RESULTS_JSON: &str = "application/sparql-results+json";

/// A stream of textual chunks produced by serializing an engine result.
///
/// The stream is finite and non-restartable. It ends either by running out of
/// chunks or with a single terminal error item.
pub type ChunkStream = BoxStream<'static, Result<String, EngineError>>;

/// A reference-counted pointer to an implementation of the [`QueryEngine`]
/// trait.
pub type QueryEngineRef = Arc<dyn QueryEngine>;

/// An opaque handle to an engine result that has not been serialized yet.
///
/// [`QueryEngine::query`] produces the handle and
/// [`QueryEngine::result_to_string`] consumes it. Callers never look inside,
/// engines downcast it back to their own result type.
pub struct EngineQueryResult(Box<dyn Any + Send>);

impl EngineQueryResult {
    /// Wraps an engine-specific result value.
    pub fn new(result: impl Any + Send) -> Self {
        Self(Box::new(result))
    }

    /// Recovers the engine-specific result value.
    ///
    /// Returns the handle unchanged when it holds a value of another type,
    /// e.g. because it was produced by a different engine.
    pub fn downcast<T: Any + Send>(self) -> Result<Box<T>, Self> {
        self.0.downcast().map_err(Self)
    }
}

impl fmt::Debug for EngineQueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EngineQueryResult")
    }
}

/// The context handed to the engine alongside the query string.
#[derive(Clone)]
pub struct EngineRequest {
    /// The sources the engine federates over, in registry order. May be
    /// empty, in which case the engine decides whether to fail or to answer
    /// from nothing.
    pub sources: Vec<EngineSource>,
    /// Custom functions forwarded to the engine, resolved by IRI during
    /// evaluation.
    pub extension_functions: Option<ExtensionFunctionsRef>,
}

impl EngineRequest {
    /// Creates a request over `sources` without extension functions.
    pub fn new(sources: Vec<EngineSource>) -> Self {
        Self {
            sources,
            extension_functions: None,
        }
    }

    /// Attaches extension functions to the request.
    #[must_use]
    pub fn with_extension_functions(mut self, functions: Option<ExtensionFunctionsRef>) -> Self {
        self.extension_functions = functions;
        self
    }
}

/// A federated SPARQL engine, consumed through exactly four entry points.
///
/// Implementations adapt a concrete engine. The relay stays ignorant of query
/// algebra and result internals, it only routes operations here and consumes
/// the streams that come back.
#[async_trait]
pub trait QueryEngine: Send + Sync {
    /// Evaluates a SELECT or CONSTRUCT query and returns an unserialized
    /// result handle.
    async fn query(
        &self,
        query: &str,
        request: EngineRequest,
    ) -> Result<EngineQueryResult, EngineError>;

    /// Evaluates an ASK query to its boolean answer.
    async fn query_boolean(
        &self,
        query: &str,
        request: EngineRequest,
    ) -> Result<bool, EngineError>;

    /// Executes an update query for its side effect on the request's sources.
    async fn query_void(&self, query: &str, request: EngineRequest) -> Result<(), EngineError>;

    /// Serializes a result handle into a stream of chunks of the requested
    /// media type.
    async fn result_to_string(
        &self,
        result: EngineQueryResult,
        media_type: &str,
    ) -> Result<ChunkStream, EngineError>;
}
