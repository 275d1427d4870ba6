use std::any::Any;
use std::sync::Arc;

/// Read-only view of an in-memory quad store registered as a data source.
///
/// The facade never interprets quads. It reads the total quad count before and
/// after an update to approximate the effect of the write, and engine adapters
/// use [`as_any`](QuadStore::as_any) to recover the concrete store type they
/// were originally handed.
pub trait QuadStore: Send + Sync {
    /// Returns the number of quads currently in the store.
    fn len(&self) -> usize;

    /// Returns whether the store holds no quads.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `self` as [`Any`] for downcasting to the concrete store.
    fn as_any(&self) -> &dyn Any;
}

/// A shared handle to a [`QuadStore`].
pub type QuadStoreRef = Arc<dyn QuadStore>;
