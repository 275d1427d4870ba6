use crate::QuadStoreRef;
use std::fmt;
use std::sync::Arc;

/// The kind of a registered data source.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum SourceKind {
    /// A remote SPARQL endpoint.
    Sparql,
    /// An RDF document reachable via URL.
    File,
    /// An HDT archive reachable via URL.
    HdtFile,
    /// An OSTRICH archive reachable via URL.
    OstrichFile,
    /// A hypermedia interface, e.g. Triple Pattern Fragments.
    Hypermedia,
    /// An in-memory quad store owned by this process.
    Memory,
}

impl SourceKind {
    /// Returns the identifier used when describing this kind to the
    /// federation engine.
    pub const fn as_str(self) -> &'static str {
        match self {
            SourceKind::Sparql => "sparql",
            SourceKind::File => "file",
            SourceKind::HdtFile => "hdtFile",
            SourceKind::OstrichFile => "ostrichFile",
            SourceKind::Hypermedia => "hypermedia",
            SourceKind::Memory => "memory",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The queryable target behind a [`Source`], keyed by [`SourceKind`].
///
/// URL-backed variants carry the location of remote data. The
/// [`InMemory`](SourceTarget::InMemory) variant carries a shared handle to the
/// store itself.
#[derive(Clone)]
pub enum SourceTarget {
    SparqlEndpoint(String),
    File(String),
    HdtFile(String),
    OstrichFile(String),
    Hypermedia(String),
    InMemory(QuadStoreRef),
}

impl SourceTarget {
    /// Returns the kind of this target.
    pub const fn kind(&self) -> SourceKind {
        match self {
            SourceTarget::SparqlEndpoint(_) => SourceKind::Sparql,
            SourceTarget::File(_) => SourceKind::File,
            SourceTarget::HdtFile(_) => SourceKind::HdtFile,
            SourceTarget::OstrichFile(_) => SourceKind::OstrichFile,
            SourceTarget::Hypermedia(_) => SourceKind::Hypermedia,
            SourceTarget::InMemory(_) => SourceKind::Memory,
        }
    }

    /// Returns the URL of this target, unless it is an in-memory store.
    pub fn url(&self) -> Option<&str> {
        match self {
            SourceTarget::SparqlEndpoint(url)
            | SourceTarget::File(url)
            | SourceTarget::HdtFile(url)
            | SourceTarget::OstrichFile(url)
            | SourceTarget::Hypermedia(url) => Some(url),
            SourceTarget::InMemory(_) => None,
        }
    }

    /// Returns the store handle of an in-memory target.
    pub fn store(&self) -> Option<&QuadStoreRef> {
        match self {
            SourceTarget::InMemory(store) => Some(store),
            SourceTarget::SparqlEndpoint(_)
            | SourceTarget::File(_)
            | SourceTarget::HdtFile(_)
            | SourceTarget::OstrichFile(_)
            | SourceTarget::Hypermedia(_) => None,
        }
    }

    pub(crate) fn trimmed(self) -> Self {
        match self {
            SourceTarget::SparqlEndpoint(url) => {
                SourceTarget::SparqlEndpoint(url.trim().to_owned())
            }
            SourceTarget::File(url) => SourceTarget::File(url.trim().to_owned()),
            SourceTarget::HdtFile(url) => SourceTarget::HdtFile(url.trim().to_owned()),
            SourceTarget::OstrichFile(url) => SourceTarget::OstrichFile(url.trim().to_owned()),
            SourceTarget::Hypermedia(url) => SourceTarget::Hypermedia(url.trim().to_owned()),
            SourceTarget::InMemory(store) => SourceTarget::InMemory(store),
        }
    }
}

impl PartialEq for SourceTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (SourceTarget::SparqlEndpoint(lhs), SourceTarget::SparqlEndpoint(rhs))
            | (SourceTarget::File(lhs), SourceTarget::File(rhs))
            | (SourceTarget::HdtFile(lhs), SourceTarget::HdtFile(rhs))
            | (SourceTarget::OstrichFile(lhs), SourceTarget::OstrichFile(rhs))
            | (SourceTarget::Hypermedia(lhs), SourceTarget::Hypermedia(rhs)) => lhs == rhs,
            // In-memory stores have no general equality, identity is what the
            // registry cares about.
            (SourceTarget::InMemory(lhs), SourceTarget::InMemory(rhs)) => Arc::ptr_eq(lhs, rhs),
            _ => false,
        }
    }
}

impl fmt::Debug for SourceTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceTarget::SparqlEndpoint(url) => {
                f.debug_tuple("SparqlEndpoint").field(url).finish()
            }
            SourceTarget::File(url) => f.debug_tuple("File").field(url).finish(),
            SourceTarget::HdtFile(url) => f.debug_tuple("HdtFile").field(url).finish(),
            SourceTarget::OstrichFile(url) => f.debug_tuple("OstrichFile").field(url).finish(),
            SourceTarget::Hypermedia(url) => f.debug_tuple("Hypermedia").field(url).finish(),
            SourceTarget::InMemory(_) => f.write_str("InMemory"),
        }
    }
}

/// A named handle to a queryable RDF endpoint or in-memory store.
///
/// Sources are plain data. Id uniqueness and primary exclusivity are owned by
/// the registry holding the source, a `Source` on its own enforces neither. In
/// particular a source can be constructed with `primary` already set, which
/// loaders use to mark a freshly loaded model as the mutation target before
/// registering it.
#[derive(Clone, PartialEq, Debug)]
pub struct Source {
    /// Unique name within a registry. Leave empty to have the registry assign
    /// a generated one.
    pub id: String,
    /// What this source points at.
    pub target: SourceTarget,
    /// Whether update queries execute against this source.
    pub primary: bool,
    /// Whether read queries include this source.
    pub active: bool,
}

impl Source {
    /// Creates an active, non-primary source with an empty id.
    ///
    /// URL payloads are trimmed here, not when mutating the fields later.
    pub fn new(target: SourceTarget) -> Self {
        Self {
            id: String::new(),
            target: target.trimmed(),
            primary: false,
            active: true,
        }
    }

    /// Creates a source with an explicit id.
    pub fn with_id(id: impl Into<String>, target: SourceTarget) -> Self {
        Self {
            id: id.into(),
            ..Self::new(target)
        }
    }

    /// Marks this source as the target of update queries.
    pub fn make_primary(&mut self) {
        self.primary = true;
    }

    /// Removes the update-target mark from this source.
    pub fn make_secondary(&mut self) {
        self.primary = false;
    }

    /// Includes this source in the read query source set.
    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Excludes this source from the read query source set.
    pub fn deactivate(&mut self) {
        self.active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::QuadStore;
    use std::any::Any;

    struct FixedLen(usize);

    impl QuadStore for FixedLen {
        fn len(&self) -> usize {
            self.0
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn new_trims_url_payloads() {
        let source = Source::new(SourceTarget::SparqlEndpoint(
            "  https://example.com/sparql \n".to_owned(),
        ));
        assert_eq!(source.target.url(), Some("https://example.com/sparql"));
        assert!(source.active);
        assert!(!source.primary);
        assert!(source.id.is_empty());
    }

    #[test]
    fn with_id_keeps_the_given_id() {
        let source = Source::with_id("model", SourceTarget::File("http://x/m.ttl".to_owned()));
        assert_eq!(source.id, "model");
        assert_eq!(source.target.kind(), SourceKind::File);
    }

    #[test]
    fn kind_strings_match_engine_identifiers() {
        assert_eq!(SourceKind::Sparql.as_str(), "sparql");
        assert_eq!(SourceKind::File.as_str(), "file");
        assert_eq!(SourceKind::HdtFile.as_str(), "hdtFile");
        assert_eq!(SourceKind::OstrichFile.as_str(), "ostrichFile");
        assert_eq!(SourceKind::Hypermedia.as_str(), "hypermedia");
        assert_eq!(SourceKind::Memory.as_str(), "memory");
    }

    #[test]
    fn in_memory_targets_compare_by_identity() {
        let store: QuadStoreRef = Arc::new(FixedLen(3));
        let same = SourceTarget::InMemory(Arc::clone(&store));
        let other = SourceTarget::InMemory(Arc::new(FixedLen(3)));

        assert_eq!(SourceTarget::InMemory(Arc::clone(&store)), same);
        assert_ne!(same, other);
        assert_eq!(same.kind(), SourceKind::Memory);
        assert!(same.url().is_none());
        assert_eq!(same.store().map(|store| store.len()), Some(3));
    }

    #[test]
    fn mutators_flip_the_flags() {
        let mut source = Source::new(SourceTarget::Hypermedia("http://frag".to_owned()));
        source.make_primary();
        assert!(source.primary);
        source.make_secondary();
        assert!(!source.primary);
        source.deactivate();
        assert!(!source.active);
        source.activate();
        assert!(source.active);
    }
}
