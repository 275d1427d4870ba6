//! The ordered collection of data sources a relay queries.
//!
//! The entry point of the module is the [`SourceRegistry`] struct.

use crate::error::RegistryError;
use rdf_relay_model::{Source, SourceTarget};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;

#[derive(Debug, Default)]
struct RegistryState {
    sources: Vec<Source>,
    next_auto_id: usize,
}

/// The ordered set of [`Source`] entries known to a relay.
///
/// The registry enforces id uniqueness, owns the single-primary selection and
/// exposes two read projections: the active sources queried by reads and the
/// primary source targeted by updates. Every mutation publishes the full
/// collection to subscribers, each emission is the authoritative state, not a
/// diff.
///
/// Usage example:
/// ```
/// use rdf_relay::model::{Source, SourceTarget};
/// use rdf_relay::registry::SourceRegistry;
///
/// let registry = SourceRegistry::new();
///
/// // ids are generated when left empty
/// let id = registry.add(Source::new(SourceTarget::SparqlEndpoint(
///     "https://example.com/sparql".to_owned(),
/// )))?;
/// assert_eq!(id, "data-source-0");
///
/// registry.make_primary(&id);
/// assert!(registry.primary_source().is_some());
/// # Result::<_, rdf_relay::error::RegistryError>::Ok(())
/// ```
pub struct SourceRegistry {
    state: Mutex<RegistryState>,
    sender: watch::Sender<Arc<[Source]>>,
}

impl SourceRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        let (sender, _receiver) = watch::channel(Arc::from(Vec::new()));
        Self {
            state: Mutex::new(RegistryState::default()),
            sender,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &RegistryState) {
        self.sender.send_replace(Arc::from(state.sources.as_slice()));
    }

    /// Registers `source` and returns its effective id.
    ///
    /// An empty id is replaced with a generated `data-source-<n>` one. The
    /// generation counter advances even when the call fails afterwards, ids
    /// of failed adds are not reused.
    ///
    /// Fails with [`RegistryError::DuplicateSourceId`] when the (possibly
    /// generated) id is already registered, leaving the collection unchanged.
    pub fn add(&self, mut source: Source) -> Result<String, RegistryError> {
        let mut state = self.lock();
        if source.id.is_empty() {
            source.id = format!("data-source-{}", state.next_auto_id);
            state.next_auto_id += 1;
        }
        if state.sources.iter().any(|existing| existing.id == source.id) {
            return Err(RegistryError::DuplicateSourceId(source.id));
        }

        tracing::debug!(id = %source.id, kind = %source.target.kind(), "registered source");
        let id = source.id.clone();
        state.sources.push(source);
        self.publish(&state);
        Ok(id)
    }

    /// Renames the source `old_id` to `new_id`.
    ///
    /// Fails when `new_id` is taken by any registered source. The renamed
    /// entry counts as well, so renaming a source to its current id is an
    /// error. An unknown `old_id` is not an error, the collection is
    /// republished unchanged.
    pub fn rename(&self, old_id: &str, new_id: impl Into<String>) -> Result<(), RegistryError> {
        let new_id = new_id.into();
        let mut state = self.lock();
        if state.sources.iter().any(|existing| existing.id == new_id) {
            return Err(RegistryError::DuplicateSourceId(new_id));
        }
        if let Some(source) = state.sources.iter_mut().find(|source| source.id == old_id) {
            source.id = new_id;
        }
        self.publish(&state);
        Ok(())
    }

    /// Marks the source `id` as the single update target.
    ///
    /// Every source loses its primary flag first, then the matching entry is
    /// flagged. When `id` is unknown the clearing still happens and no source
    /// ends up primary. Idempotent.
    pub fn make_primary(&self, id: &str) {
        let mut state = self.lock();
        for source in &mut state.sources {
            source.primary = source.id == id;
        }
        self.publish(&state);
    }

    /// Sets whether the source `id` participates in read queries.
    ///
    /// An unknown `id` republishes the collection unchanged. Idempotent.
    pub fn set_active(&self, id: &str, active: bool) {
        let mut state = self.lock();
        if let Some(source) = state.sources.iter_mut().find(|source| source.id == id) {
            source.active = active;
        }
        self.publish(&state);
    }

    /// Removes the source `id`.
    ///
    /// The registry's handle to an in-memory store is dropped with the entry.
    /// The store itself is freed once the last published snapshot holding it
    /// is dropped as well. An unknown `id` republishes the collection
    /// unchanged.
    pub fn remove(&self, id: &str) {
        let mut state = self.lock();
        if let Some(position) = state.sources.iter().position(|source| source.id == id) {
            state.sources.remove(position);
            tracing::debug!(id, "removed source");
        }
        self.publish(&state);
    }

    /// The targets of all active sources, in registration order.
    pub fn active_sources(&self) -> Vec<SourceTarget> {
        self.lock()
            .sources
            .iter()
            .filter(|source| source.active)
            .map(|source| source.target.clone())
            .collect()
    }

    /// The target of the first source marked primary.
    pub fn primary_source(&self) -> Option<SourceTarget> {
        self.lock()
            .sources
            .iter()
            .find(|source| source.primary)
            .map(|source| source.target.clone())
    }

    /// The current collection.
    pub fn sources(&self) -> Arc<[Source]> {
        Arc::clone(&self.sender.borrow())
    }

    /// The number of registered sources.
    pub fn len(&self) -> usize {
        self.lock().sources.len()
    }

    /// Returns whether no source is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribes to the source collection.
    ///
    /// The receiver immediately holds the current collection and observes
    /// every subsequent mutation.
    ///
    /// ```
    /// use rdf_relay::model::{Source, SourceTarget};
    /// use rdf_relay::registry::SourceRegistry;
    ///
    /// let registry = SourceRegistry::new();
    /// let subscriber = registry.subscribe();
    /// assert!(subscriber.borrow().is_empty());
    ///
    /// registry.add(Source::with_id(
    ///     "a",
    ///     SourceTarget::File("http://example.com/a.ttl".to_owned()),
    /// ))?;
    /// assert_eq!(subscriber.borrow().len(), 1);
    /// # Result::<_, rdf_relay::error::RegistryError>::Ok(())
    /// ```
    pub fn subscribe(&self) -> watch::Receiver<Arc<[Source]>> {
        self.sender.subscribe()
    }

    /// Republishes the current collection without changing it.
    ///
    /// Collaborators call this after mutating the world behind a source, e.g.
    /// after an update query changed the primary store.
    pub fn refresh(&self) {
        let state = self.lock();
        self.publish(&state);
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use rdf_relay_model::QuadStore;
    use std::any::Any;

    struct DummyStore;

    impl QuadStore for DummyStore {
        fn len(&self) -> usize {
            0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn endpoint(id: &str) -> Source {
        Source::with_id(
            id,
            SourceTarget::SparqlEndpoint(format!("https://example.com/{id}")),
        )
    }

    #[test]
    fn generated_ids_count_up_even_when_an_add_fails() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("data-source-0"))?;

        // The generated id collides, the consumed counter value is not reused.
        let error = registry
            .add(Source::new(SourceTarget::File("http://x/a.ttl".to_owned())))
            .unwrap_err();
        assert!(matches!(error, RegistryError::DuplicateSourceId(id) if id == "data-source-0"));

        let id = registry.add(Source::new(SourceTarget::File("http://x/b.ttl".to_owned())))?;
        assert_eq!(id, "data-source-1");
        Ok(())
    }

    #[test]
    fn duplicate_ids_are_rejected_and_leave_the_registry_unchanged() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("s1"))?;

        let error = registry.add(endpoint("s1")).unwrap_err();
        assert!(matches!(error, RegistryError::DuplicateSourceId(id) if id == "s1"));

        let sources = registry.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "s1");
        Ok(())
    }

    #[test]
    fn rename_rejects_taken_ids_including_the_own_one() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        registry.add(endpoint("b"))?;

        assert!(registry.rename("a", "b").is_err());
        // The uniqueness scan covers the whole collection, so a is taken too.
        assert!(registry.rename("a", "a").is_err());

        registry.rename("a", "c")?;
        let sources = registry.sources();
        assert_eq!(sources[0].id, "c");
        assert_eq!(sources[1].id, "b");
        Ok(())
    }

    #[test]
    fn renaming_an_unknown_source_republishes_unchanged() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        let mut subscriber = registry.subscribe();
        subscriber.mark_unchanged();

        registry.rename("missing", "b")?;

        assert!(subscriber.has_changed().is_ok_and(|changed| changed));
        assert_eq!(registry.sources()[0].id, "a");
        Ok(())
    }

    #[test]
    fn make_primary_moves_the_flag_exclusively() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        registry.add(endpoint("b"))?;

        registry.make_primary("a");
        registry.make_primary("b");

        let sources = registry.sources();
        assert!(!sources[0].primary);
        assert!(sources[1].primary);
        Ok(())
    }

    #[test]
    fn make_primary_with_an_unknown_id_clears_every_flag() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        registry.make_primary("a");

        registry.make_primary("missing");

        assert!(registry.primary_source().is_none());
        Ok(())
    }

    #[test]
    fn sources_constructed_as_primary_are_reported_first_come_first() -> Result<(), RegistryError>
    {
        let registry = SourceRegistry::new();
        let mut first = endpoint("a");
        first.make_primary();
        let mut second = endpoint("b");
        second.make_primary();

        // Exclusivity is only enforced by make_primary, both stay flagged.
        registry.add(first)?;
        registry.add(second)?;

        let primary = registry.primary_source();
        assert_eq!(
            primary.as_ref().and_then(SourceTarget::url),
            Some("https://example.com/a")
        );
        Ok(())
    }

    #[test]
    fn active_sources_projects_in_insertion_order() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        let mut inactive = endpoint("b");
        inactive.deactivate();
        registry.add(inactive)?;
        registry.add(endpoint("c"))?;

        let urls: Vec<_> = registry
            .active_sources()
            .iter()
            .filter_map(SourceTarget::url)
            .map(str::to_owned)
            .collect();
        assert_eq!(urls, vec!["https://example.com/a", "https://example.com/c"]);
        Ok(())
    }

    #[test]
    fn set_active_toggles_read_participation() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        registry.add(endpoint("b"))?;

        registry.set_active("a", false);
        let urls: Vec<_> = registry
            .active_sources()
            .iter()
            .filter_map(SourceTarget::url)
            .map(str::to_owned)
            .collect();
        assert_eq!(urls, vec!["https://example.com/b"]);

        registry.set_active("a", true);
        assert_eq!(registry.active_sources().len(), 2);
        Ok(())
    }

    #[test]
    fn remove_drops_the_entry_and_republishes() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;
        registry.add(endpoint("b"))?;
        let mut subscriber = registry.subscribe();
        subscriber.mark_unchanged();

        registry.remove("a");

        assert!(subscriber.has_changed().is_ok_and(|changed| changed));
        let sources = registry.sources();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].id, "b");
        Ok(())
    }

    #[test]
    fn subscribers_replay_the_latest_collection() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(endpoint("a"))?;

        let late = registry.subscribe();
        assert_eq!(late.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn refresh_republishes_without_change() -> Result<(), RegistryError> {
        let registry = SourceRegistry::new();
        registry.add(Source::with_id(
            "mem",
            SourceTarget::InMemory(Arc::new(DummyStore)),
        ))?;
        let mut subscriber = registry.subscribe();
        subscriber.mark_unchanged();

        registry.refresh();

        assert!(subscriber.has_changed().is_ok_and(|changed| changed));
        assert_eq!(registry.len(), 1);
        Ok(())
    }
}
