//! The facade that routes SPARQL operations to an engine.
//!
//! The entry point of the module is the [`Relay`] struct.

use crate::error::QueryError;
use crate::registry::SourceRegistry;
use crate::results::{AccumulatedBindingStream, BindingStream, SelectResults};
use futures::StreamExt;
use rdf_relay_api::{
    EngineRequest, EngineSource, ExtensionFunctionsRef, QueryEngineRef, SPARQL_RESULTS_JSON,
};
use rdf_relay_model::{
    ConstructOutput, DeliveryMode, QueryForm, QueryProgress, RdfSerialization, UpdateSummary,
};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};

/// Options of a SELECT evaluation.
#[derive(Clone, Default)]
pub struct SelectOptions {
    /// Custom functions the engine resolves by IRI during evaluation.
    pub extension_functions: Option<ExtensionFunctionsRef>,
    /// How decoded rows are handed to the caller.
    pub delivery_mode: DeliveryMode,
}

/// Options of an ASK or CONSTRUCT evaluation.
#[derive(Clone, Default)]
pub struct QueryOptions {
    /// Custom functions the engine resolves by IRI during evaluation.
    pub extension_functions: Option<ExtensionFunctionsRef>,
}

/// Options of an update execution.
#[derive(Clone, Default)]
pub struct UpdateOptions {
    /// Custom functions the engine resolves by IRI during evaluation.
    pub extension_functions: Option<ExtensionFunctionsRef>,
}

impl From<QueryOptions> for SelectOptions {
    #[inline]
    fn from(options: QueryOptions) -> Self {
        Self {
            extension_functions: options.extension_functions,
            delivery_mode: DeliveryMode::default(),
        }
    }
}

impl From<QueryOptions> for UpdateOptions {
    #[inline]
    fn from(options: QueryOptions) -> Self {
        Self {
            extension_functions: options.extension_functions,
        }
    }
}

/// A federation facade over a SPARQL [`QueryEngine`](rdf_relay_api::QueryEngine).
///
/// Read queries (SELECT, ASK, CONSTRUCT) are evaluated against every active
/// source of the relay's [`SourceRegistry`] in a single federated request.
/// Update queries execute against the one primary source and are serialized
/// among themselves, reads are never blocked. Next to per-call results, the
/// relay maintains a single-slot [`QueryProgress`] projection of the most
/// recent SELECT, see [`Relay::query_progress`].
///
/// Usage example:
/// ```
/// use rdf_relay::api::test_util::ScriptedEngine;
/// use rdf_relay::model::{Source, SourceTarget};
/// use rdf_relay::relay::Relay;
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let engine = Arc::new(ScriptedEngine::default());
/// engine.push_boolean(true);
///
/// let relay = Relay::new(engine);
/// relay.registry().add(Source::with_id(
///     "endpoint",
///     SourceTarget::SparqlEndpoint("https://example.com/sparql".to_owned()),
/// ))?;
///
/// assert!(relay.ask("ASK { ?s ?p ?o }").await?);
/// # Result::<_, Box<dyn std::error::Error>>::Ok(())
/// # }).unwrap();
/// ```
pub struct Relay {
    engine: QueryEngineRef,
    registry: Arc<SourceRegistry>,
    progress: watch::Sender<QueryProgress>,
    update_lock: Mutex<()>,
}

impl Relay {
    /// Creates a relay with an empty source registry.
    pub fn new(engine: QueryEngineRef) -> Self {
        Self::new_with_registry(engine, Arc::new(SourceRegistry::new()))
    }

    /// Creates a relay over an existing registry.
    ///
    /// Several relays can share one registry, each evaluating against the
    /// same source collection through its own engine.
    pub fn new_with_registry(engine: QueryEngineRef, registry: Arc<SourceRegistry>) -> Self {
        let (progress, _receiver) = watch::channel(QueryProgress::default());
        Self {
            engine,
            registry,
            progress,
            update_lock: Mutex::new(()),
        }
    }

    /// The registry holding this relay's sources.
    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Subscribes to the progress of the most recently started SELECT query.
    ///
    /// The projection is a single slot. Starting a SELECT resets it, every
    /// decoded row republishes it with the rows so far, a cleanly ended
    /// stream freezes it as complete. A failed or dropped query leaves the
    /// slot `running` and not `complete`, which observers read as aborted.
    ///
    /// ```
    /// use futures::StreamExt;
    /// use rdf_relay::api::test_util::{ok_chunks, ScriptedEngine, RESULT_HEADER};
    /// use rdf_relay::relay::Relay;
    /// use rdf_relay::results::SelectResults;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = Arc::new(ScriptedEngine::default());
    /// engine.push_chunks(ok_chunks(&[
    ///     RESULT_HEADER,
    ///     r#"{"x": {"type": "literal", "value": "1"}}"#,
    /// ]));
    /// let relay = Relay::new(engine);
    ///
    /// if let SelectResults::Accumulated(mut rows) =
    ///     relay.select("SELECT ?x WHERE { ?s ?p ?x }").await?
    /// {
    ///     while rows.next().await.transpose()?.is_some() {}
    /// }
    ///
    /// let progress = relay.query_progress();
    /// assert!(progress.borrow().complete);
    /// assert_eq!(progress.borrow().rows.len(), 1);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub fn query_progress(&self) -> watch::Receiver<QueryProgress> {
        self.progress.subscribe()
    }

    /// Evaluates a SPARQL SELECT query against all active sources.
    ///
    /// Rows are decoded lazily while the returned stream is polled, dropping
    /// the stream abandons the query. The active source set may be empty, the
    /// engine decides what an empty federation answers.
    ///
    /// Usage example:
    /// ```
    /// use futures::StreamExt;
    /// use rdf_relay::api::test_util::{ok_chunks, ScriptedEngine, RESULT_HEADER};
    /// use rdf_relay::relay::Relay;
    /// use rdf_relay::results::SelectResults;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = Arc::new(ScriptedEngine::default());
    /// engine.push_chunks(ok_chunks(&[
    ///     RESULT_HEADER,
    ///     r#"{"x": {"type": "literal", "value": "1"}}"#,
    ///     r#"{"x": {"type": "literal", "value": "2"}}"#,
    /// ]));
    /// let relay = Relay::new(engine);
    ///
    /// if let SelectResults::Accumulated(mut rows) =
    ///     relay.select("SELECT ?x WHERE { ?s ?p ?x }").await?
    /// {
    ///     while let Some(rows) = rows.next().await {
    ///         println!("{} rows so far", rows?.len());
    ///     }
    /// }
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn select(&self, query: &str) -> Result<SelectResults, QueryError> {
        self.select_opt(query, SelectOptions::default()).await
    }

    /// Evaluates a SPARQL SELECT query with the given [`SelectOptions`].
    ///
    /// Usage example:
    /// ```
    /// use futures::StreamExt;
    /// use rdf_relay::api::test_util::{ok_chunks, ScriptedEngine, RESULT_HEADER};
    /// use rdf_relay::relay::{Relay, SelectOptions};
    /// use rdf_relay::model::DeliveryMode;
    /// use rdf_relay::results::SelectResults;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = Arc::new(ScriptedEngine::default());
    /// engine.push_chunks(ok_chunks(&[
    ///     RESULT_HEADER,
    ///     r#"{"x": {"type": "literal", "value": "1"}}"#,
    /// ]));
    /// let relay = Relay::new(engine);
    ///
    /// let options = SelectOptions {
    ///     delivery_mode: DeliveryMode::Single,
    ///     ..SelectOptions::default()
    /// };
    /// if let SelectResults::Single(mut rows) =
    ///     relay.select_opt("SELECT ?x WHERE { ?s ?p ?x }", options).await?
    /// {
    ///     while let Some(row) = rows.next().await {
    ///         println!("{}", row?);
    ///     }
    /// }
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn select_opt(
        &self,
        query: &str,
        options: SelectOptions,
    ) -> Result<SelectResults, QueryError> {
        // Reset the projection before anything can fail, so an errored query
        // stays visible as aborted.
        self.progress
            .send_replace(QueryProgress::started(QueryForm::Select));

        let sources = self.engine_sources();
        tracing::debug!(sources = sources.len(), "dispatching select query");
        let request =
            EngineRequest::new(sources).with_extension_functions(options.extension_functions);
        let result = self.engine.query(query, request).await?;
        let chunks = self
            .engine
            .result_to_string(result, SPARQL_RESULTS_JSON)
            .await?;

        let rows = BindingStream::new(chunks, self.progress.clone(), QueryForm::Select);
        Ok(match options.delivery_mode {
            DeliveryMode::Accumulated => {
                SelectResults::Accumulated(AccumulatedBindingStream::new(rows))
            }
            DeliveryMode::Single => SelectResults::Single(rows),
        })
    }

    /// Evaluates a SPARQL ASK query against all active sources.
    pub async fn ask(&self, query: &str) -> Result<bool, QueryError> {
        self.ask_opt(query, QueryOptions::default()).await
    }

    /// Evaluates a SPARQL ASK query with the given [`QueryOptions`].
    pub async fn ask_opt(&self, query: &str, options: QueryOptions) -> Result<bool, QueryError> {
        let sources = self.engine_sources();
        tracing::debug!(sources = sources.len(), "dispatching ask query");
        let request =
            EngineRequest::new(sources).with_extension_functions(options.extension_functions);
        Ok(self.engine.query_boolean(query, request).await?)
    }

    /// Evaluates a SPARQL CONSTRUCT query and materializes the output in the
    /// requested serialization.
    ///
    /// The engine stream is drained before returning. JSON-LD output comes
    /// back parsed, every other serialization as raw text.
    ///
    /// Usage example:
    /// ```
    /// use rdf_relay::api::test_util::{ok_chunks, ScriptedEngine};
    /// use rdf_relay::model::RdfSerialization;
    /// use rdf_relay::relay::Relay;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = Arc::new(ScriptedEngine::default());
    /// engine.push_chunks(ok_chunks(&[
    ///     "<http://example.com/s> <http://example.com/p> ",
    ///     "<http://example.com/o> .\n",
    /// ]));
    /// let relay = Relay::new(engine);
    ///
    /// let output = relay
    ///     .construct("CONSTRUCT WHERE { ?s ?p ?o }", RdfSerialization::NTriples)
    ///     .await?;
    /// assert!(output.as_text().is_some_and(|text| text.ends_with(".\n")));
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn construct(
        &self,
        query: &str,
        serialization: RdfSerialization,
    ) -> Result<ConstructOutput, QueryError> {
        self.construct_opt(query, serialization, QueryOptions::default())
            .await
    }

    /// Evaluates a SPARQL CONSTRUCT query with the given [`QueryOptions`].
    pub async fn construct_opt(
        &self,
        query: &str,
        serialization: RdfSerialization,
        options: QueryOptions,
    ) -> Result<ConstructOutput, QueryError> {
        let sources = self.engine_sources();
        tracing::debug!(
            sources = sources.len(),
            serialization = %serialization,
            "dispatching construct query"
        );
        let request =
            EngineRequest::new(sources).with_extension_functions(options.extension_functions);
        let result = self.engine.query(query, request).await?;
        let mut chunks = self
            .engine
            .result_to_string(result, serialization.media_type())
            .await?;

        let mut document = String::new();
        while let Some(chunk) = chunks.next().await {
            document.push_str(&chunk.map_err(QueryError::Stream)?);
        }
        Ok(match serialization {
            RdfSerialization::JsonLd => ConstructOutput::JsonLd(
                serde_json::from_str(&document).map_err(QueryError::InvalidJsonLd)?,
            ),
            _ => ConstructOutput::Text(document),
        })
    }

    /// Executes a SPARQL update query against the primary source.
    ///
    /// Concurrent updates on the same relay run one at a time. The returned
    /// [`UpdateSummary`] reports the net quad count movement when the primary
    /// source is an in-memory store, and zeroes otherwise. Afterwards the
    /// registry republishes its collection so subscribers can re-read the
    /// mutated store.
    ///
    /// Fails with [`QueryError::NoPrimarySource`] when no source carries the
    /// primary flag, without consulting the engine.
    ///
    /// Usage example:
    /// ```
    /// use rdf_relay::api::test_util::{CountingStore, ScriptedEngine};
    /// use rdf_relay::model::{Source, SourceTarget};
    /// use rdf_relay::relay::Relay;
    /// use std::sync::Arc;
    ///
    /// # tokio_test::block_on(async {
    /// let engine = Arc::new(ScriptedEngine::default());
    /// let store = Arc::new(CountingStore::new(10));
    /// let mutated = Arc::clone(&store);
    /// engine.on_void(move || mutated.set_len(13));
    ///
    /// let relay = Relay::new(engine);
    /// let id = relay
    ///     .registry()
    ///     .add(Source::with_id("store", SourceTarget::InMemory(store)))?;
    /// relay.registry().make_primary(&id);
    ///
    /// let summary = relay.update("INSERT DATA { <s> <p> <o> }").await?;
    /// assert_eq!(summary.added, 3);
    /// assert_eq!(summary.deleted, 0);
    /// # Result::<_, Box<dyn std::error::Error>>::Ok(())
    /// # }).unwrap();
    /// ```
    pub async fn update(&self, query: &str) -> Result<UpdateSummary, QueryError> {
        self.update_opt(query, UpdateOptions::default()).await
    }

    /// Executes a SPARQL update query with the given [`UpdateOptions`].
    pub async fn update_opt(
        &self,
        query: &str,
        options: UpdateOptions,
    ) -> Result<UpdateSummary, QueryError> {
        let _guard = self.update_lock.lock().await;

        let Some(primary) = self.registry.primary_source() else {
            return Err(QueryError::NoPrimarySource);
        };
        let store = primary.store().map(Arc::clone);
        let size_before = store.as_ref().map(|store| store.len());

        tracing::debug!(kind = %primary.kind(), "dispatching update query");
        let request = EngineRequest::new(vec![EngineSource::from(&primary)])
            .with_extension_functions(options.extension_functions);
        self.engine.query_void(query, request).await?;

        let summary = match store.zip(size_before) {
            Some((store, before)) => UpdateSummary::from_sizes(before, store.len()),
            None => UpdateSummary {
                added: 0,
                deleted: 0,
                message: "Successfully updated store; the primary source does not expose a quad count"
                    .to_owned(),
            },
        };
        self.registry.refresh();
        tracing::debug!(
            added = summary.added,
            deleted = summary.deleted,
            "update finished"
        );
        Ok(summary)
    }

    fn engine_sources(&self) -> Vec<EngineSource> {
        self.registry
            .active_sources()
            .iter()
            .map(EngineSource::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_sync() {
        fn is_send_sync<T: Send + Sync>() {}
        fn is_send<T: Send>() {}
        is_send_sync::<Relay>();
        is_send_sync::<SourceRegistry>();
        is_send::<SelectResults>();
    }

    #[test]
    fn query_options_convert_into_the_specialized_options() {
        let options = QueryOptions::default();

        let select = SelectOptions::from(options.clone());
        assert_eq!(select.delivery_mode, DeliveryMode::Accumulated);
        assert!(select.extension_functions.is_none());

        let update = UpdateOptions::from(options);
        assert!(update.extension_functions.is_none());
    }
}
