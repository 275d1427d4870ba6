use std::fmt;

/// One row of a SELECT result, mapping variable names to RDF term values.
///
/// Rows arrive as individual objects of the engine's SPARQL-results-JSON
/// stream and are kept as parsed JSON. The facade does not interpret
/// individual terms.
pub type Binding = serde_json::Value;

/// How a caller consumes a SELECT result sequence.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum DeliveryMode {
    /// Emit the full list of rows seen so far, reissued on every new row.
    #[default]
    Accumulated,
    /// Emit each new row on its own.
    Single,
}

/// The four SPARQL operation kinds dispatched by the facade.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Default)]
pub enum QueryForm {
    #[default]
    Select,
    Ask,
    Construct,
    Update,
}

impl QueryForm {
    pub const fn as_str(self) -> &'static str {
        match self {
            QueryForm::Select => "SELECT",
            QueryForm::Ask => "ASK",
            QueryForm::Construct => "CONSTRUCT",
            QueryForm::Update => "UPDATE",
        }
    }
}

impl fmt::Display for QueryForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of the most recently started SELECT query.
///
/// `running` and `complete` are not complementary. A query whose stream failed
/// or was dropped mid-way stays `running = true, complete = false`, which
/// observers must read as "aborted", not "finished".
#[derive(Clone, PartialEq, Debug, Default)]
pub struct QueryProgress {
    /// Whether a query has started and not yet finished cleanly.
    pub running: bool,
    /// Whether the result stream ended without an error.
    pub complete: bool,
    /// The operation kind of the observed query.
    pub form: QueryForm,
    /// The rows received so far, in arrival order.
    pub rows: Vec<Binding>,
}

impl QueryProgress {
    /// The state published when a query starts: running, no rows yet.
    pub fn started(form: QueryForm) -> Self {
        Self {
            running: true,
            complete: false,
            form,
            rows: Vec::new(),
        }
    }
}

/// The approximate effect of an update query on the primary source.
///
/// Computed by diffing the store's quad count around the execution. A balanced
/// insert-and-delete therefore reports zero and a mixed update reports only
/// the net movement, attributed entirely to the dominating direction. At most
/// one of `added` and `deleted` is non-zero.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct UpdateSummary {
    pub added: usize,
    pub deleted: usize,
    pub message: String,
}

impl UpdateSummary {
    /// Builds a summary from the quad counts observed around the update.
    pub fn from_sizes(before: usize, after: usize) -> Self {
        Self {
            added: after.saturating_sub(before),
            deleted: before.saturating_sub(after),
            message: "Successfully updated store".to_owned(),
        }
    }
}

/// The materialized output of a CONSTRUCT query.
///
/// JSON-LD output is parsed into a JSON value. Every other serialization is
/// returned as the raw text drained from the engine stream.
#[derive(Clone, PartialEq, Debug)]
pub enum ConstructOutput {
    JsonLd(serde_json::Value),
    Text(String),
}

impl ConstructOutput {
    /// Returns the raw text, unless the output was parsed as JSON-LD.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ConstructOutput::Text(text) => Some(text),
            ConstructOutput::JsonLd(_) => None,
        }
    }

    /// Returns the parsed document of a JSON-LD construct.
    pub fn as_json_ld(&self) -> Option<&serde_json::Value> {
        match self {
            ConstructOutput::JsonLd(value) => Some(value),
            ConstructOutput::Text(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_summary_reports_growth_as_added() {
        let summary = UpdateSummary::from_sizes(10, 13);
        assert_eq!(summary.added, 3);
        assert_eq!(summary.deleted, 0);
        assert_eq!(summary.message, "Successfully updated store");
    }

    #[test]
    fn update_summary_reports_shrinkage_as_deleted() {
        let summary = UpdateSummary::from_sizes(10, 7);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.deleted, 3);
    }

    #[test]
    fn update_summary_reports_no_change_as_zero() {
        let summary = UpdateSummary::from_sizes(10, 10);
        assert_eq!(summary.added, 0);
        assert_eq!(summary.deleted, 0);
    }

    #[test]
    fn progress_starts_running_without_rows() {
        let progress = QueryProgress::started(QueryForm::Select);
        assert!(progress.running);
        assert!(!progress.complete);
        assert_eq!(progress.form, QueryForm::Select);
        assert!(progress.rows.is_empty());
    }

    #[test]
    fn default_progress_is_idle() {
        let progress = QueryProgress::default();
        assert!(!progress.running);
        assert!(!progress.complete);
    }

    #[test]
    fn query_forms_display_in_upper_case() {
        assert_eq!(QueryForm::Select.to_string(), "SELECT");
        assert_eq!(QueryForm::Ask.to_string(), "ASK");
        assert_eq!(QueryForm::Construct.to_string(), "CONSTRUCT");
        assert_eq!(QueryForm::Update.to_string(), "UPDATE");
    }
}
