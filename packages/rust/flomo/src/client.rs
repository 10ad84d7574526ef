//! HTTP client for the Flomo incoming-webhook API.

use chatsync_shared::{ChatSyncError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use url::Url;

/// User-Agent string for webhook requests.
const USER_AGENT: &str = concat!("chatsync/", env!("CARGO_PKG_VERSION"));

/// Message used when the sink rejects a note without saying why.
pub const UNKNOWN_SINK_ERROR: &str = "Unknown error from Flomo API";

#[derive(Debug, Serialize)]
struct NoteRequest<'a> {
    content: &'a str,
}

/// Decoded webhook answer. `code == 0` means the note was stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlomoResponse {
    pub code: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Posts notes to a Flomo webhook endpoint.
///
/// No timeout and no retries: one request per note.
#[derive(Debug, Clone)]
pub struct FlomoClient {
    http: Client,
    origin_override: Option<Url>,
}

impl FlomoClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ChatSyncError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            origin_override: None,
        })
    }

    /// Post to `origin` instead of the webhook's own scheme, host and port,
    /// keeping the webhook path. Used to point at staging or mock sinks.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin_override = Some(origin);
        self
    }

    fn target(&self, endpoint: &str) -> Result<Url> {
        let mut url = Url::parse(endpoint)
            .map_err(|e| ChatSyncError::validation(format!("invalid webhook URL {endpoint:?}: {e}")))?;
        if let Some(origin) = &self.origin_override {
            let rebase_err = || ChatSyncError::validation(format!("cannot rebase webhook onto {origin}"));
            url.set_scheme(origin.scheme()).map_err(|()| rebase_err())?;
            url.set_host(origin.host_str()).map_err(|_| rebase_err())?;
            url.set_port(origin.port()).map_err(|()| rebase_err())?;
        }
        Ok(url)
    }

    /// POST `content` as `{"content": ...}` to `endpoint`.
    ///
    /// Returns the decoded response for `code == 0`. A non-zero code becomes a
    /// [`ChatSyncError::Delivery`] carrying the sink's message; transport and
    /// decoding failures become [`ChatSyncError::Network`].
    #[instrument(skip_all, fields(bytes = content.len()))]
    pub async fn send(&self, endpoint: &str, content: &str) -> Result<FlomoResponse> {
        let target = self.target(endpoint)?;
        debug!(host = target.host_str(), "posting note to flomo");

        let response = self
            .http
            .post(target)
            .json(&NoteRequest { content })
            .send()
            .await
            .map_err(|e| ChatSyncError::Network(format!("flomo request failed: {e}")))?;

        let status = response.status();
        let body: FlomoResponse = response.json().await.map_err(|e| {
            ChatSyncError::Network(format!("flomo returned an unreadable response (HTTP {status}): {e}"))
        })?;

        if body.code == 0 {
            info!(%status, "note stored");
            return Ok(body);
        }

        let message = body
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| UNKNOWN_SINK_ERROR.to_string());
        warn!(code = body.code, %message, "flomo rejected note");
        Err(ChatSyncError::delivery(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn sink(response: ResponseTemplate) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iwh/abc/def/"))
            .respond_with(response)
            .mount(&server)
            .await;
        server
    }

    fn endpoint(server: &MockServer) -> String {
        format!("{}/iwh/abc/def/", server.uri())
    }

    #[tokio::test]
    async fn origin_override_keeps_webhook_path() {
        let server = sink(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": 0 }))).await;
        let client = FlomoClient::new()
            .unwrap()
            .with_origin(Url::parse(&server.uri()).unwrap());
        let resp = client.send("https://flomoapp.com/iwh/abc/def/", "x").await.unwrap();
        assert_eq!(resp.code, 0);
    }

    #[tokio::test]
    async fn code_zero_is_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/iwh/abc/def/"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({ "content": "# Hi\n\nbody" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": 0, "message": "ok" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = FlomoClient::new().unwrap();
        let resp = client.send(&endpoint(&server), "# Hi\n\nbody").await.unwrap();
        assert_eq!(resp.code, 0);
    }

    #[tokio::test]
    async fn nonzero_code_carries_sink_message() {
        let server = sink(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": 1, "message": "bad" }))).await;
        let err = FlomoClient::new().unwrap().send(&endpoint(&server), "x").await.unwrap_err();
        assert!(matches!(&err, ChatSyncError::Delivery { message } if message == "bad"));
    }

    #[tokio::test]
    async fn nonzero_code_without_message_uses_fallback() {
        let server = sink(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "code": -1 }))).await;
        let err = FlomoClient::new().unwrap().send(&endpoint(&server), "x").await.unwrap_err();
        assert_eq!(err.user_message(), UNKNOWN_SINK_ERROR);
    }

    #[tokio::test]
    async fn non_json_body_is_network_error() {
        let server = sink(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>")).await;
        let err = FlomoClient::new().unwrap().send(&endpoint(&server), "x").await.unwrap_err();
        assert!(matches!(err, ChatSyncError::Network(_)));
    }

    #[tokio::test]
    async fn unreachable_sink_is_network_error() {
        let server = MockServer::start().await;
        let url = endpoint(&server);
        drop(server);
        let err = FlomoClient::new().unwrap().send(&url, "x").await.unwrap_err();
        assert!(matches!(err, ChatSyncError::Network(_)));
    }
}
