// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Streaming driver: the state machine around one in-flight reply.
//!
//! One logical stream-consumption loop exists per assistant reply slot.
//! Each received chunk appends to the accumulated raw text and triggers
//! one full re-render; the splitter always reprocesses the whole string.
//! That is the documented cost/simplicity trade - quadratic over the
//! stream, bounded in practice by message length.
//!
//! ```text
//! Idle ──begin──▶ Streaming ──complete──▶ Completed
//!                     │ └──────fail──────▶ Failed
//!                     └──────cancel─────▶ Idle
//! ```
//!
//! `Completed` performs exactly one final re-render in which
//! end-of-stream is absolute, so every block is genuinely closed.
//! `Failed` replaces the in-progress output with a literal error notice,
//! bypassing the renderer entirely. Cancellation stops chunk consumption
//! and discards partial state.

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::render::{escape_html, Renderer};

/// Lifecycle phase of one reply slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Streaming,
    Completed,
    Failed,
}

/// Ordered source of text chunks, abstracting the wire protocol.
///
/// The driver is agnostic to framing: the contract is "ordered chunks of
/// text, then end". `Ok(None)` signals a clean end of stream.
#[async_trait]
pub trait ChunkSource {
    async fn next_chunk(&mut self) -> Result<Option<String>, TransportError>;
}

/// Driver for one reply slot: owns the accumulated raw text, the
/// reconciling renderer, and the phase machine.
#[derive(Debug, Default)]
pub struct StreamDriver {
    raw: String,
    renderer: Renderer,
    phase: StreamPhase,
    html: String,
    stream_id: Uuid,
}

impl Default for StreamPhase {
    fn default() -> Self {
        StreamPhase::Idle
    }
}

impl StreamDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Driver whose renderer resolves relative links against `origin`.
    pub fn with_origin(origin: impl Into<String>) -> Self {
        Self {
            renderer: Renderer::with_origin(origin),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    /// The full accumulated raw text so far.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The committed HTML for this slot.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Identifier of the current stream run, for log correlation.
    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    /// Enter `Streaming`, discarding any previous content in this slot.
    pub fn begin(&mut self) {
        self.raw.clear();
        self.html.clear();
        self.renderer.reset();
        self.stream_id = Uuid::new_v4();
        self.phase = StreamPhase::Streaming;
        debug!(stream = %self.stream_id, "stream started");
    }

    /// Append one chunk and re-render the whole accumulated string.
    ///
    /// Chunks arriving outside `Streaming` are dropped: a cancelled loop
    /// may still be draining its transport.
    pub fn push_chunk(&mut self, chunk: &str) -> &str {
        if self.phase != StreamPhase::Streaming {
            warn!(stream = %self.stream_id, phase = ?self.phase, "dropping chunk outside streaming phase");
            return &self.html;
        }
        self.raw.push_str(chunk);
        self.renderer.render(&self.raw);
        self.html = self.renderer.html();
        &self.html
    }

    /// End of stream: one final render in which every block is closed
    /// for real rather than implicitly.
    pub fn complete(&mut self) -> &str {
        if self.phase == StreamPhase::Streaming {
            self.renderer.render(&self.raw);
            self.html = self.renderer.html();
            self.phase = StreamPhase::Completed;
            debug!(stream = %self.stream_id, bytes = self.raw.len(), "stream completed");
        }
        &self.html
    }

    /// Transport failure: replace the in-progress output with a literal
    /// error notice. The renderer is bypassed on purpose.
    pub fn fail(&mut self, message: &str) -> &str {
        self.html = format!(
            r#"<p class="error-notice">Error: {}</p>"#,
            escape_html(message)
        );
        self.phase = StreamPhase::Failed;
        &self.html
    }

    /// Abandon the stream. No partial state is persisted.
    pub fn cancel(&mut self) {
        self.raw.clear();
        self.html.clear();
        self.renderer.reset();
        self.phase = StreamPhase::Idle;
    }

    /// Record a user toggle on a think block, by ordinal.
    pub fn set_expanded(&mut self, ordinal: usize, value: bool) {
        self.renderer.set_expanded(ordinal, value);
        self.html = self.renderer.html();
    }

    /// Drive the full state machine over a chunk source.
    ///
    /// Runs until end-of-stream or error. The caller must ensure the
    /// previous consumption loop for this slot has terminated before
    /// starting a new one; two loops writing into the same visible
    /// output target is a contract violation, not a supported mode.
    pub async fn consume<S: ChunkSource + Send>(
        &mut self,
        source: &mut S,
    ) -> Result<(), TransportError> {
        self.begin();
        loop {
            match source.next_chunk().await {
                Ok(Some(chunk)) => {
                    self.push_chunk(&chunk);
                }
                Ok(None) => {
                    self.complete();
                    return Ok(());
                }
                Err(err) => {
                    self.fail(&err.to_string());
                    return Err(err);
                }
            }
        }
    }

    /// Like [`consume`](Self::consume), but aborts when `cancel` fires.
    ///
    /// On cancellation the driver returns to `Idle` with no partial
    /// state, and the underlying transport is simply dropped mid-flight.
    pub async fn consume_with_cancel<S: ChunkSource + Send>(
        &mut self,
        source: &mut S,
        mut cancel: tokio::sync::oneshot::Receiver<()>,
    ) -> Result<(), TransportError> {
        self.begin();
        loop {
            tokio::select! {
                _ = &mut cancel => {
                    self.cancel();
                    return Err(TransportError::Cancelled);
                }
                chunk = source.next_chunk() => match chunk {
                    Ok(Some(chunk)) => {
                        self.push_chunk(&chunk);
                    }
                    Ok(None) => {
                        self.complete();
                        return Ok(());
                    }
                    Err(err) => {
                        self.fail(&err.to_string());
                        return Err(err);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Chunk source backed by a fixed script of results.
    struct ScriptedSource {
        chunks: std::vec::IntoIter<Result<Option<String>, TransportError>>,
    }

    impl ScriptedSource {
        fn ok(chunks: &[&str]) -> Self {
            let mut script: Vec<Result<Option<String>, TransportError>> =
                chunks.iter().map(|c| Ok(Some(c.to_string()))).collect();
            script.push(Ok(None));
            Self {
                chunks: script.into_iter(),
            }
        }
    }

    #[async_trait]
    impl ChunkSource for ScriptedSource {
        async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
            self.chunks.next().unwrap_or(Ok(None))
        }
    }

    #[test]
    fn test_phases() {
        let mut driver = StreamDriver::new();
        assert_eq!(driver.phase(), StreamPhase::Idle);
        driver.begin();
        assert_eq!(driver.phase(), StreamPhase::Streaming);
        driver.push_chunk("hello");
        driver.complete();
        assert_eq!(driver.phase(), StreamPhase::Completed);
    }

    #[test]
    fn test_chunks_outside_streaming_dropped() {
        let mut driver = StreamDriver::new();
        driver.push_chunk("ignored");
        assert_eq!(driver.raw(), "");
        assert_eq!(driver.html(), "");
    }

    #[test]
    fn test_progressive_think_scenario() {
        let mut driver = StreamDriver::new();
        driver.begin();

        // No complete opener yet: treated as plain text.
        driver.push_chunk("<thi");
        assert_eq!(driver.html(), "<p>&lt;thi</p>");

        // Opener complete, closer absent: open, unclosed think block.
        driver.push_chunk("nk>hello");
        assert!(driver.html().contains("hello"));
        assert!(driver.html().contains("loading-indicator"));

        // Closer arrives, followed by plain text.
        let html = driver.push_chunk("</think>world").to_string();
        assert!(!html.contains("loading-indicator"));
        assert!(html.contains("<p>world</p>"));
    }

    #[test]
    fn test_fail_replaces_output_literally() {
        let mut driver = StreamDriver::new();
        driver.begin();
        driver.push_chunk("**partial markdown");
        driver.fail("connection reset <mid-stream>");
        assert_eq!(
            driver.html(),
            r#"<p class="error-notice">Error: connection reset &lt;mid-stream&gt;</p>"#
        );
        assert_eq!(driver.phase(), StreamPhase::Failed);
    }

    #[test]
    fn test_cancel_discards_partial_state() {
        let mut driver = StreamDriver::new();
        driver.begin();
        driver.push_chunk("half a mess");
        driver.cancel();
        assert_eq!(driver.phase(), StreamPhase::Idle);
        assert_eq!(driver.raw(), "");
        assert_eq!(driver.html(), "");
    }

    #[tokio::test]
    async fn test_consume_to_completion() {
        let mut driver = StreamDriver::new();
        let mut source = ScriptedSource::ok(&["Hello ", "**world**", "!"]);
        driver.consume(&mut source).await.unwrap();
        assert_eq!(driver.phase(), StreamPhase::Completed);
        assert_eq!(driver.html(), "<p>Hello <strong>world</strong>!</p>");
    }

    #[tokio::test]
    async fn test_consume_transport_error() {
        struct FailingSource;

        #[async_trait]
        impl ChunkSource for FailingSource {
            async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
                Err(TransportError::Network("boom".into()))
            }
        }

        let mut driver = StreamDriver::new();
        let err = driver.consume(&mut FailingSource).await.unwrap_err();
        assert!(matches!(err, TransportError::Network(_)));
        assert!(driver.html().contains("error-notice"));
    }

    #[tokio::test]
    async fn test_consume_with_cancel() {
        struct PendingSource;

        #[async_trait]
        impl ChunkSource for PendingSource {
            async fn next_chunk(&mut self) -> Result<Option<String>, TransportError> {
                // Never yields; the select must resolve via cancellation.
                std::future::pending().await
            }
        }

        let (tx, rx) = tokio::sync::oneshot::channel();
        let mut driver = StreamDriver::new();
        tx.send(()).unwrap();
        let err = driver
            .consume_with_cancel(&mut PendingSource, rx)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Cancelled));
        assert_eq!(driver.phase(), StreamPhase::Idle);
    }

    #[test]
    fn test_driver_origin_reaches_links() {
        let mut driver = StreamDriver::with_origin("ftp://files.local");
        driver.begin();
        driver.push_chunk("[report](/q3.pdf)");
        assert!(!driver.html().contains("<a"));
        assert!(driver.html().contains("report"));
    }

    #[test]
    fn test_completed_render_idempotent() {
        let mut a = StreamDriver::new();
        a.begin();
        a.push_chunk("x **y**\n\nH|I\n-|-\n1|2\n");
        let first = a.complete().to_string();
        let second = a.complete().to_string();
        assert_eq!(first, second);
    }
}
