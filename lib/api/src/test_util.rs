//! Utilities for driving relay code against a scripted engine instead of a
//! real SPARQL engine.
//!
//! [`ScriptedEngine`] answers the four engine entry points from queues filled
//! by the test, recording every call for later inspection. [`CountingStore`]
//! stands in for an in-memory store whose only observable property is its
//! quad count.

use crate::{
    ChunkStream, EngineError, EngineQueryResult, EngineRequest, EngineSource, QueryEngine,
};
use async_trait::async_trait;
use futures::StreamExt;
use rdf_relay_model::{QuadStore, SourceKind};
use std::any::Any;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A head/vars chunk like the one preceding rows in a SPARQL-results-JSON
/// stream.
pub const RESULT_HEADER: &str = r#"{"head": {"vars": ["x"]}}"#;

/// Builds an all-successful chunk script from string literals.
pub fn ok_chunks(chunks: &[&str]) -> Vec<Result<String, EngineError>> {
    chunks.iter().map(|chunk| Ok((*chunk).to_owned())).collect()
}

/// A quad store stub that only tracks a count.
#[derive(Debug, Default)]
pub struct CountingStore {
    len: AtomicUsize,
}

impl CountingStore {
    pub fn new(len: usize) -> Self {
        Self {
            len: AtomicUsize::new(len),
        }
    }

    /// Pretends that an update changed the store to `len` quads.
    pub fn set_len(&self, len: usize) {
        self.len.store(len, Ordering::SeqCst);
    }
}

impl QuadStore for CountingStore {
    fn len(&self) -> usize {
        self.len.load(Ordering::SeqCst)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// One observed engine invocation.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum RecordedCall {
    Query {
        query: String,
        source_kinds: Vec<SourceKind>,
        extension_functions: Vec<String>,
    },
    QueryBoolean {
        query: String,
        source_kinds: Vec<SourceKind>,
        extension_functions: Vec<String>,
    },
    QueryVoid {
        query: String,
        source_kinds: Vec<SourceKind>,
        extension_functions: Vec<String>,
    },
    ResultToString {
        media_type: String,
    },
}

type VoidAction = Box<dyn FnMut() + Send>;

#[derive(Default)]
struct ScriptState {
    chunk_scripts: VecDeque<Vec<Result<String, EngineError>>>,
    boolean_answers: VecDeque<Result<bool, EngineError>>,
    query_failures: VecDeque<EngineError>,
    serialize_failures: VecDeque<EngineError>,
    void_outcomes: VecDeque<Result<(), EngineError>>,
    void_action: Option<VoidAction>,
    calls: Vec<RecordedCall>,
}

/// The marker value wrapped into result handles issued by [`ScriptedEngine`].
struct ScriptedResult;

/// A [`QueryEngine`] whose behavior is scripted up front.
///
/// Unscripted calls fall back to benign defaults: queries succeed, serialized
/// results contain no chunks, ASK answers `false`, updates do nothing.
#[derive(Default)]
pub struct ScriptedEngine {
    state: Mutex<ScriptState>,
}

impl ScriptedEngine {
    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues the chunks emitted for the next serialized result.
    pub fn push_chunks(&self, chunks: Vec<Result<String, EngineError>>) {
        self.state().chunk_scripts.push_back(chunks);
    }

    /// Queues the answer of the next ASK query.
    pub fn push_boolean(&self, answer: bool) {
        self.state().boolean_answers.push_back(Ok(answer));
    }

    /// Makes the next `query` call fail.
    pub fn fail_next_query(&self, message: impl Into<String>) {
        self.state().query_failures.push_back(EngineError::msg(message));
    }

    /// Makes the next `result_to_string` call fail before producing a stream.
    pub fn fail_next_serialization(&self, message: impl Into<String>) {
        self.state()
            .serialize_failures
            .push_back(EngineError::msg(message));
    }

    /// Makes the next ASK query fail.
    pub fn fail_next_boolean(&self, message: impl Into<String>) {
        self.state()
            .boolean_answers
            .push_back(Err(EngineError::msg(message)));
    }

    /// Makes the next update execution fail.
    pub fn fail_next_void(&self, message: impl Into<String>) {
        self.state()
            .void_outcomes
            .push_back(Err(EngineError::msg(message)));
    }

    /// Runs `action` on every update execution, e.g. to move a
    /// [`CountingStore`] to its post-update count.
    pub fn on_void(&self, action: impl FnMut() + Send + 'static) {
        self.state().void_action = Some(Box::new(action));
    }

    /// All calls observed so far, in order.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }
}

fn source_kinds(request: &EngineRequest) -> Vec<SourceKind> {
    request.sources.iter().map(EngineSource::kind).collect()
}

fn extension_iris(request: &EngineRequest) -> Vec<String> {
    request
        .extension_functions
        .as_ref()
        .map_or_else(Vec::new, |functions| functions.iris())
}

#[async_trait]
impl QueryEngine for ScriptedEngine {
    async fn query(
        &self,
        query: &str,
        request: EngineRequest,
    ) -> Result<EngineQueryResult, EngineError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::Query {
            query: query.to_owned(),
            source_kinds: source_kinds(&request),
            extension_functions: extension_iris(&request),
        });
        match state.query_failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(EngineQueryResult::new(ScriptedResult)),
        }
    }

    async fn query_boolean(
        &self,
        query: &str,
        request: EngineRequest,
    ) -> Result<bool, EngineError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::QueryBoolean {
            query: query.to_owned(),
            source_kinds: source_kinds(&request),
            extension_functions: extension_iris(&request),
        });
        state.boolean_answers.pop_front().unwrap_or(Ok(false))
    }

    async fn query_void(&self, query: &str, request: EngineRequest) -> Result<(), EngineError> {
        let mut state = self.state();
        state.calls.push(RecordedCall::QueryVoid {
            query: query.to_owned(),
            source_kinds: source_kinds(&request),
            extension_functions: extension_iris(&request),
        });
        if let Some(action) = state.void_action.as_mut() {
            action();
        }
        state.void_outcomes.pop_front().unwrap_or(Ok(()))
    }

    async fn result_to_string(
        &self,
        result: EngineQueryResult,
        media_type: &str,
    ) -> Result<ChunkStream, EngineError> {
        result
            .downcast::<ScriptedResult>()
            .map_err(|_| EngineError::msg("result does not belong to this engine"))?;
        let mut state = self.state();
        state.calls.push(RecordedCall::ResultToString {
            media_type: media_type.to_owned(),
        });
        if let Some(error) = state.serialize_failures.pop_front() {
            return Err(error);
        }
        let chunks = state.chunk_scripts.pop_front().unwrap_or_default();
        Ok(futures::stream::iter(chunks).boxed())
    }
}
