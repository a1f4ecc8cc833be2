//! Frame stream over an SSE connection

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use canlink_core::FrameEvent;
use futures::stream::{Stream, StreamExt};
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::parser::SseParser;
use super::types::{StreamError, StreamResult};

type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>;

/// An open subscription streaming frame events from the server
///
/// Implements `Stream<Item = Result<FrameEvent, StreamError>>`. The stream
/// ends when the server closes the subscription (session disconnected or
/// replay exhausted). Dropping it closes the connection, which the server
/// treats as cancellation.
///
/// # Example
///
/// ```ignore
/// let mut frames = client.subscribe(&session_id, 0x123).await?;
///
/// while let Some(event) = frames.next().await {
///     println!("{}", event?.frame);
/// }
/// ```
pub struct FrameStream {
    session_id: String,
    can_id: u32,
    byte_stream: ByteStream,
    parser: SseParser,
    pending: VecDeque<StreamResult<FrameEvent>>,
}

impl FrameStream {
    /// Open the SSE stream at `url` for `session_id` / `can_id`
    pub(crate) async fn connect(
        mut url: Url,
        http_client: &Client,
        session_id: &str,
        can_id: u32,
    ) -> StreamResult<Self> {
        url.query_pairs_mut()
            .append_pair("id", session_id)
            .append_pair("canId", &can_id.to_string());

        debug!(%url, "Opening frame stream");

        let response = http_client
            .get(url)
            .header("Accept", "text/event-stream")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(StreamError::Server { status, message });
        }

        Ok(Self {
            session_id: session_id.to_string(),
            can_id,
            byte_stream: Box::pin(response.bytes_stream()),
            parser: SseParser::new(),
            pending: VecDeque::new(),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn can_id(&self) -> u32 {
        self.can_id
    }

    /// Sequence number of the last event received
    pub fn last_sequence(&self) -> Option<u64> {
        self.parser.last_id().and_then(|id| id.parse().ok())
    }

    /// Get the next event from the stream
    ///
    /// Returns `None` when the stream ends.
    pub async fn next(&mut self) -> Option<StreamResult<FrameEvent>> {
        <Self as StreamExt>::next(self).await
    }

    /// Close the subscription
    pub fn cancel(self) {
        debug!(session_id = %self.session_id, can_id = self.can_id, "Subscription cancelled");
    }
}

impl Stream for FrameStream {
    type Item = StreamResult<FrameEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;

        loop {
            if let Some(event) = this.pending.pop_front() {
                return Poll::Ready(Some(event));
            }

            match this.byte_stream.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.pending.extend(this.parser.feed(bytes));
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(StreamError::Connection(e))))
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
