use crate::error::QueryError;
use futures::{ready, Stream, StreamExt};
use rdf_relay_api::ChunkStream;
use rdf_relay_model::{Binding, QueryForm, QueryProgress};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;

/// The first chunk of a serialized SPARQL results document carries the
/// variable head. Rows are the later chunks that also start with a brace.
const HEAD_CHUNK_PREFIX: &str = r#"{"head": {"vars""#;

fn is_row_chunk(chunk: &str) -> bool {
    chunk.starts_with('{') && !chunk.starts_with(HEAD_CHUNK_PREFIX)
}

/// A stream of solution [`Binding`]s decoded from an engine's chunk stream.
///
/// Chunks that do not look like rows (the head chunk, separators, whitespace)
/// are skipped. Every decoded row is appended to an internal accumulator and
/// the owning relay's progress projection is republished with the rows so
/// far. Reaching the end of the chunk stream marks the projection complete. A
/// failing chunk or an undecodable row ends the stream after yielding the
/// error without touching the projection, the last published state stays
/// visible as an aborted query.
pub struct BindingStream {
    chunks: Option<ChunkStream>,
    accumulated: Vec<Binding>,
    progress: Option<watch::Sender<QueryProgress>>,
    form: QueryForm,
}

impl BindingStream {
    pub(crate) fn new(
        chunks: ChunkStream,
        progress: watch::Sender<QueryProgress>,
        form: QueryForm,
    ) -> Self {
        Self {
            chunks: Some(chunks),
            accumulated: Vec::new(),
            progress: Some(progress),
            form,
        }
    }

    fn publish_rows(&self) {
        if let Some(progress) = &self.progress {
            progress.send_replace(QueryProgress {
                running: true,
                complete: false,
                form: self.form,
                rows: self.accumulated.clone(),
            });
        }
    }

    fn finish(&mut self) {
        tracing::debug!(bindings = self.accumulated.len(), "result stream complete");
        if let Some(progress) = self.progress.take() {
            progress.send_replace(QueryProgress {
                running: false,
                complete: true,
                form: self.form,
                rows: std::mem::take(&mut self.accumulated),
            });
        }
    }

    fn poll_row(&mut self, cx: &mut Context<'_>) -> Poll<Option<Result<Binding, QueryError>>> {
        loop {
            let Some(chunks) = self.chunks.as_mut() else {
                return Poll::Ready(None);
            };
            let Some(chunk) = ready!(chunks.poll_next_unpin(cx)) else {
                self.chunks = None;
                self.finish();
                return Poll::Ready(None);
            };
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(error) => {
                    self.chunks = None;
                    tracing::warn!(error = %error, "result stream failed");
                    return Poll::Ready(Some(Err(QueryError::Stream(error))));
                }
            };
            if !is_row_chunk(&chunk) {
                continue;
            }
            return match serde_json::from_str::<Binding>(&chunk) {
                Ok(row) => {
                    self.accumulated.push(row.clone());
                    self.publish_rows();
                    Poll::Ready(Some(Ok(row)))
                }
                Err(error) => {
                    self.chunks = None;
                    Poll::Ready(Some(Err(QueryError::InvalidBinding(error))))
                }
            };
        }
    }
}

impl Stream for BindingStream {
    type Item = Result<Binding, QueryError>;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.poll_row(cx)
    }
}

/// A [`BindingStream`] that re-emits the whole accumulator on every row.
///
/// Each item is the list of all rows decoded so far, so consumers that render
/// a complete result set can replace their state with the latest item instead
/// of appending.
pub struct AccumulatedBindingStream {
    inner: BindingStream,
}

impl AccumulatedBindingStream {
    pub(crate) fn new(inner: BindingStream) -> Self {
        Self { inner }
    }
}

impl Stream for AccumulatedBindingStream {
    type Item = Result<Vec<Binding>, QueryError>;

    #[inline]
    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match ready!(self.inner.poll_row(cx)) {
            Some(Ok(_)) => Poll::Ready(Some(Ok(self.inner.accumulated.clone()))),
            Some(Err(error)) => Poll::Ready(Some(Err(error))),
            None => Poll::Ready(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;
    use rdf_relay_api::test_util::{ok_chunks, RESULT_HEADER};
    use rdf_relay_api::EngineError;
    use serde_json::json;

    fn scripted(
        chunks: Vec<Result<String, EngineError>>,
    ) -> (BindingStream, watch::Receiver<QueryProgress>) {
        let (sender, receiver) = watch::channel(QueryProgress::started(QueryForm::Select));
        let stream = BindingStream::new(stream::iter(chunks).boxed(), sender, QueryForm::Select);
        (stream, receiver)
    }

    #[tokio::test]
    async fn non_row_chunks_are_skipped() {
        let (mut stream, _progress) = scripted(ok_chunks(&[
            RESULT_HEADER,
            ",\n",
            r#"{"x": {"type": "literal", "value": "1"}}"#,
            "not json at all",
            r#"{"x": {"type": "literal", "value": "2"}}"#,
        ]));

        let mut rows = Vec::new();
        while let Some(row) = stream.next().await {
            rows.push(row.unwrap());
        }
        assert_eq!(
            rows,
            vec![
                json!({"x": {"type": "literal", "value": "1"}}),
                json!({"x": {"type": "literal", "value": "2"}}),
            ]
        );
    }

    #[tokio::test]
    async fn completion_publishes_the_final_projection() {
        let row = r#"{"x": {"type": "literal", "value": "1"}}"#;
        let (mut stream, progress) = scripted(ok_chunks(&[RESULT_HEADER, row]));

        while let Some(row) = stream.next().await {
            row.unwrap();
        }

        let snapshot = progress.borrow().clone();
        assert!(!snapshot.running);
        assert!(snapshot.complete);
        assert_eq!(snapshot.rows, vec![json!({"x": {"type": "literal", "value": "1"}})]);
    }

    #[tokio::test]
    async fn a_failing_chunk_ends_the_stream_and_leaves_the_projection_running() {
        let row = r#"{"x": {"type": "literal", "value": "1"}}"#;
        let mut chunks = ok_chunks(&[RESULT_HEADER, row]);
        chunks.push(Err(EngineError::msg("connection reset")));
        let (mut stream, progress) = scripted(chunks);

        assert!(stream.next().await.is_some_and(|row| row.is_ok()));
        let error = stream.next().await;
        assert!(matches!(error, Some(Err(QueryError::Stream(_)))));
        assert!(stream.next().await.is_none());

        let snapshot = progress.borrow().clone();
        assert!(snapshot.running);
        assert!(!snapshot.complete);
        assert_eq!(snapshot.rows.len(), 1);
    }

    #[tokio::test]
    async fn an_undecodable_row_is_a_terminal_error() {
        let (mut stream, _progress) = scripted(ok_chunks(&[RESULT_HEADER, r#"{"x": again not json"#]));

        let error = stream.next().await;
        assert!(matches!(error, Some(Err(QueryError::InvalidBinding(_)))));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn the_accumulated_mode_reissues_all_rows() {
        let (stream, _progress) = scripted(ok_chunks(&[
            RESULT_HEADER,
            r#"{"x": {"type": "literal", "value": "1"}}"#,
            r#"{"x": {"type": "literal", "value": "2"}}"#,
        ]));
        let mut stream = AccumulatedBindingStream::new(stream);

        let first = stream.next().await;
        assert!(matches!(&first, Some(Ok(rows)) if rows.len() == 1));
        let second = stream.next().await;
        assert!(matches!(&second, Some(Ok(rows)) if rows.len() == 2));
        assert!(stream.next().await.is_none());
    }
}
