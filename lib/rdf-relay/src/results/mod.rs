//! Result types for the query operations of a relay.

mod bindings;

pub use bindings::{AccumulatedBindingStream, BindingStream};
use rdf_relay_model::DeliveryMode;

/// The results of a SPARQL SELECT query, in one of the two delivery modes.
///
/// Both variants drive the same decoding and accumulation machinery, they
/// only differ in what each stream item carries: a single new row, or the
/// full list of rows decoded so far.
pub enum SelectResults {
    /// Every item is the complete result set decoded up to that point.
    Accumulated(AccumulatedBindingStream),
    /// Every item is one newly decoded row.
    Single(BindingStream),
}

impl SelectResults {
    /// The delivery mode these results were requested with.
    pub fn delivery_mode(&self) -> DeliveryMode {
        match self {
            SelectResults::Accumulated(_) => DeliveryMode::Accumulated,
            SelectResults::Single(_) => DeliveryMode::Single,
        }
    }
}
