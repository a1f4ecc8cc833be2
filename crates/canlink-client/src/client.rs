//! canlink HTTP client implementation

use std::time::Duration;

use canlink_core::Frame;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};
use url::Url;

use crate::error::{CanLinkClientError, Result};
use crate::streaming::{FrameStream, StreamError};
use crate::types::*;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// canlink REST API client
#[derive(Debug, Clone)]
pub struct CanLinkClient {
    client: Client,
    /// Client without a request timeout, for long-lived SSE streams
    stream_client: Client,
    base_url: Url,
}

impl CanLinkClient {
    /// Client for the server at `base_url`, e.g. `http://localhost:18090`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_config(base_url, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    /// `timeout` applies to request/response calls; subscriptions only use
    /// `connect_timeout`.
    pub fn with_config(
        base_url: &str,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .build()?;
        let stream_client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;

        let base_url = Url::parse(base_url)?;

        Ok(Self {
            client,
            stream_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    /// `/api/can/sessions/<id>` with the id percent-encoded as one segment
    fn session_url(&self, session_id: &str) -> Result<Url> {
        let mut url = self.endpoint("/api/can/sessions")?;
        url.path_segments_mut()
            .map_err(|_| url::ParseError::RelativeUrlWithCannotBeABaseBase)?
            .push(session_id);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url).send().await?;
        decode(response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;
        decode(response).await
    }

    /// Check server health
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<String> {
        let response = self.client.get(self.endpoint("/health")?).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        Ok(response.text().await?)
    }

    // --- sessions ---

    /// Open a session on a channel
    #[instrument(skip(self))]
    pub async fn connect(&self, channel: &str) -> Result<ConnectResponse> {
        let request = ConnectRequest {
            channel: channel.to_string(),
        };
        let connected: ConnectResponse = self.post_json("/api/can/connect", &request).await?;
        debug!(session_id = %connected.id, "Connected");
        Ok(connected)
    }

    /// Close a session (succeeds for unknown sessions too)
    #[instrument(skip(self))]
    pub async fn disconnect(&self, session_id: &str) -> Result<DisconnectResponse> {
        let request = DisconnectRequest {
            id: session_id.to_string(),
        };
        self.post_json("/api/can/disconnect", &request).await
    }

    #[instrument(skip(self))]
    pub async fn list_sessions(&self) -> Result<Vec<SessionInfo>> {
        let list: SessionList = self.get_json(self.endpoint("/api/can/sessions")?).await?;
        Ok(list.items)
    }

    #[instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> Result<SessionInfo> {
        self.get_json(self.session_url(session_id)?).await
    }

    // --- frames ---

    /// Transmit a frame on a session's bus
    #[instrument(skip(self, frame), fields(frame = %frame))]
    pub async fn send(&self, session_id: &str, frame: &Frame) -> Result<SendResponse> {
        let request = SendRequest {
            id: session_id.to_string(),
            frame: frame.clone(),
        };
        self.post_json("/api/can/send", &request).await
    }

    /// Subscribe to frames with identifier `can_id` on a session
    ///
    /// Fails with [`CanLinkClientError::SessionNotFound`] when the server
    /// does not know the session.
    #[instrument(skip(self))]
    pub async fn subscribe(&self, session_id: &str, can_id: u32) -> Result<FrameStream> {
        let url = self.endpoint("/api/can/subscribe")?;
        FrameStream::connect(url, &self.stream_client, session_id, can_id)
            .await
            .map_err(|e| match e {
                StreamError::Server { status: 404, .. } => {
                    CanLinkClientError::SessionNotFound(session_id.to_string())
                }
                e => e.into(),
            })
    }
}

/// Deserialize a success body, or turn the response into an error
async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        return Err(error_from(response).await);
    }
    response
        .json()
        .await
        .map_err(|e| CanLinkClientError::ParseError(e.to_string()))
}

async fn error_from(response: reqwest::Response) -> CanLinkClientError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) if body.message.is_empty() => body.error,
        Ok(body) => body.message,
        Err(_) => format!("HTTP {}", status),
    };

    match status {
        StatusCode::NOT_FOUND => CanLinkClientError::SessionNotFound(message),
        StatusCode::BAD_REQUEST => CanLinkClientError::BadRequest(message),
        StatusCode::SERVICE_UNAVAILABLE => CanLinkClientError::Unavailable(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => CanLinkClientError::Timeout,
        _ => CanLinkClientError::server_error(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_join() {
        let client = CanLinkClient::new("http://localhost:18090").unwrap();
        assert_eq!(
            client.endpoint("/api/can/send").unwrap().as_str(),
            "http://localhost:18090/api/can/send"
        );
    }

    #[test]
    fn test_session_id_is_one_path_segment() {
        let client = CanLinkClient::new("http://localhost:18090").unwrap();
        assert_eq!(
            client.session_url("session_1_0").unwrap().as_str(),
            "http://localhost:18090/api/can/sessions/session_1_0"
        );
        assert_eq!(
            client.session_url("a/b?c#d").unwrap().as_str(),
            "http://localhost:18090/api/can/sessions/a%2Fb%3Fc%23d"
        );
    }

    #[test]
    fn test_invalid_url() {
        let client = CanLinkClient::new("not a url");
        assert!(matches!(client, Err(CanLinkClientError::InvalidUrl(_))));
    }
}
