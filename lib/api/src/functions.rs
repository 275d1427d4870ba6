use std::any::Any;
use std::sync::Arc;

/// A reference-counted pointer to an implementation of the
/// [`ExtensionFunctions`] trait.
///
/// This type alias is used to pass extension functions around without tying
/// callers to a specific engine's function representation.
pub type ExtensionFunctionsRef = Arc<dyn ExtensionFunctions>;

/// A set of custom SPARQL extension functions forwarded to the engine.
///
/// The relay never invokes these. It only carries them from the caller to the
/// engine, which resolves each function by IRI during evaluation and downcasts
/// the set to its own representation.
pub trait ExtensionFunctions: Send + Sync {
    /// The IRIs of the provided functions.
    fn iris(&self) -> Vec<String>;

    /// Returns `self` as [`Any`] for downcasting by the engine adapter.
    fn as_any(&self) -> &dyn Any;
}
