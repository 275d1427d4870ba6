use rdf_relay_model::{QuadStoreRef, SourceKind, SourceTarget};
use std::fmt;
use std::sync::Arc;

/// A source description in the shape the engine consumes.
///
/// URL-backed kinds travel as a source-type identifier plus location.
/// In-memory stores travel as the store handle itself.
#[derive(Clone)]
pub enum EngineSource {
    /// Remote data addressed by URL.
    Url { kind: SourceKind, url: String },
    /// An in-memory store passed through by handle.
    Store(QuadStoreRef),
}

impl EngineSource {
    /// The source-type identifier communicated to the engine.
    pub fn kind(&self) -> SourceKind {
        match self {
            EngineSource::Url { kind, .. } => *kind,
            EngineSource::Store(_) => SourceKind::Memory,
        }
    }
}

impl From<&SourceTarget> for EngineSource {
    /// One arm per target variant: each source kind states explicitly how it
    /// is presented to the engine.
    fn from(target: &SourceTarget) -> Self {
        match target {
            SourceTarget::SparqlEndpoint(url) => EngineSource::Url {
                kind: SourceKind::Sparql,
                url: url.clone(),
            },
            SourceTarget::File(url) => EngineSource::Url {
                kind: SourceKind::File,
                url: url.clone(),
            },
            SourceTarget::HdtFile(url) => EngineSource::Url {
                kind: SourceKind::HdtFile,
                url: url.clone(),
            },
            SourceTarget::OstrichFile(url) => EngineSource::Url {
                kind: SourceKind::OstrichFile,
                url: url.clone(),
            },
            SourceTarget::Hypermedia(url) => EngineSource::Url {
                kind: SourceKind::Hypermedia,
                url: url.clone(),
            },
            SourceTarget::InMemory(store) => EngineSource::Store(Arc::clone(store)),
        }
    }
}

impl fmt::Debug for EngineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineSource::Url { kind, url } => f
                .debug_struct("Url")
                .field("kind", kind)
                .field("url", url)
                .finish(),
            EngineSource::Store(_) => f.write_str("Store"),
        }
    }
}
