//! Sync coordinator: one user-initiated sync from request to settled outcome.
//!
//! ```text
//! Idle -> Requesting -> Delivering -> Settled(Success | Failure)
//! ```
//!
//! Hop one asks the content context for the transcript, hop two hands it to
//! the delivery context. Each hop is awaited in turn; nothing is retried.

use std::sync::Arc;

use chatsync_flomo::{FlomoClient, UNKNOWN_SINK_ERROR};
use chatsync_platforms::{PageSnapshot, PlatformRegistry, is_apology};
use chatsync_shared::{ExtensionConfig, Result, SyncId};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::content::ContentContext;
use crate::delivery::DeliveryContext;
use crate::messages::{ContentRequest, ContentResponse, DeliveryRequest, DeliveryResponse, SyncData};
use crate::port::ContextPort;

// ---------------------------------------------------------------------------
// States and outcomes
// ---------------------------------------------------------------------------

/// Where a failed sync stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// No usable webhook; nothing was sent.
    Configuration,
    /// The page could not be read (unsupported platform, no transcript).
    Content,
    /// The sink refused the note or could not be reached.
    Delivery,
    /// A context stopped answering.
    Channel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SyncFailure {
    fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            FailureKind::Configuration => write!(f, "{}", self.message),
            FailureKind::Content => write!(f, "Failed to get chat content: {}", self.message),
            FailureKind::Delivery => write!(f, "Failed to sync to Flomo: {}", self.message),
            FailureKind::Channel => write!(f, "Error: {}", self.message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Success,
    Failure(SyncFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    Idle,
    Requesting,
    Delivering,
    Settled(SyncOutcome),
}

impl SyncState {
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Settled(_))
    }
}

/// Summary of one finished sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub sync_id: SyncId,
    pub outcome: SyncOutcome,
    /// Platform and title, once the content hop succeeded.
    pub platform: Option<String>,
    pub title: Option<String>,
    pub started_at: DateTime<Utc>,
    pub settled_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn succeeded(&self) -> bool {
        self.outcome == SyncOutcome::Success
    }
}

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

/// Receives every state change of a sync (button animation, notifications).
pub trait SyncObserver: Send + Sync {
    fn state_changed(&self, sync_id: SyncId, state: &SyncState);
}

/// No-op observer for headless/test usage.
pub struct SilentObserver;

impl SyncObserver for SilentObserver {
    fn state_changed(&self, _sync_id: SyncId, _state: &SyncState) {}
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

pub struct SyncCoordinator {
    config: ExtensionConfig,
    content: ContextPort<ContentRequest, ContentResponse>,
    delivery: ContextPort<DeliveryRequest, DeliveryResponse>,
    state: SyncState,
}

impl SyncCoordinator {
    pub fn new(
        config: ExtensionConfig,
        content: ContextPort<ContentRequest, ContentResponse>,
        delivery: ContextPort<DeliveryRequest, DeliveryResponse>,
    ) -> Self {
        Self {
            config,
            content,
            delivery,
            state: SyncState::Idle,
        }
    }

    /// Start both contexts for `page` on the current runtime.
    pub fn start(config: ExtensionConfig, page: PageSnapshot, client: FlomoClient) -> Self {
        let content = ContextPort::spawn(
            "content",
            ContentContext::new(Arc::new(PlatformRegistry::new()), Arc::new(page)),
        );
        let delivery = ContextPort::spawn("delivery", DeliveryContext::new(config.clone(), client));
        Self::new(config, content, delivery)
    }

    /// Convenience for [`start`](Self::start) with a default HTTP client.
    pub fn start_default(config: ExtensionConfig, page: PageSnapshot) -> Result<Self> {
        Ok(Self::start(config, page, FlomoClient::new()?))
    }

    pub fn state(&self) -> &SyncState {
        &self.state
    }

    /// Run one sync to completion.
    ///
    /// A blank or absent `user_title` lets the platform pick the title.
    pub async fn sync(&mut self, user_title: Option<&str>, observer: &dyn SyncObserver) -> SyncReport {
        let sync_id = SyncId::new();
        let started_at = Utc::now();
        let chat_title = user_title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from);

        let (outcome, extracted) = self.run(sync_id, chat_title, observer).await;

        let report = SyncReport {
            sync_id,
            outcome,
            platform: extracted.as_ref().map(|d| d.platform.clone()),
            title: extracted.map(|d| d.title),
            started_at,
            settled_at: Utc::now(),
        };
        self.transition(sync_id, SyncState::Settled(report.outcome.clone()), observer);
        report
    }

    fn transition(&mut self, sync_id: SyncId, state: SyncState, observer: &dyn SyncObserver) {
        observer.state_changed(sync_id, &state);
        self.state = state;
    }

    #[instrument(skip_all, fields(sync_id = %sync_id))]
    async fn run(
        &mut self,
        sync_id: SyncId,
        chat_title: Option<String>,
        observer: &dyn SyncObserver,
    ) -> (SyncOutcome, Option<SyncData>) {
        self.transition(sync_id, SyncState::Idle, observer);

        if let Err(e) = self.config.require_webhook() {
            warn!(error = %e, "sync refused");
            let failure = SyncFailure::new(FailureKind::Configuration, e.user_message());
            return (SyncOutcome::Failure(failure), None);
        }

        // Hop one: content.
        self.transition(sync_id, SyncState::Requesting, observer);
        let response = match self.content.send(ContentRequest::GetChatContent { chat_title }).await {
            Ok(response) => response,
            Err(e) => return (channel_failure(e), None),
        };
        let data = match content_data(response) {
            Ok(data) => data,
            Err(failure) => {
                warn!(message = %failure.message, "no content to deliver");
                return (SyncOutcome::Failure(failure), None);
            }
        };
        info!(platform = %data.platform, title = %data.title, "content received");

        // Hop two: delivery.
        self.transition(sync_id, SyncState::Delivering, observer);
        let request = DeliveryRequest::SyncToFlomo { data: data.clone() };
        let outcome = match self.delivery.send(request).await {
            Ok(response) if response.success => SyncOutcome::Success,
            Ok(response) => {
                let message = response
                    .error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| UNKNOWN_SINK_ERROR.to_string());
                SyncOutcome::Failure(SyncFailure::new(FailureKind::Delivery, message))
            }
            Err(e) => channel_failure(e),
        };
        info!(?outcome, "sync settled");
        (outcome, Some(data))
    }
}

fn channel_failure(e: chatsync_shared::ChatSyncError) -> SyncOutcome {
    warn!(error = %e, "context unavailable");
    SyncOutcome::Failure(SyncFailure::new(FailureKind::Channel, e.to_string()))
}

/// Validate the content hop's answer into the delivery request body.
fn content_data(response: ContentResponse) -> std::result::Result<SyncData, SyncFailure> {
    if !response.success {
        let message = response.message.unwrap_or_else(|| "Unknown error".to_string());
        return Err(SyncFailure::new(FailureKind::Content, message));
    }
    let content = response.chat_content.unwrap_or_default();
    if content.trim().is_empty() || is_apology(&content) {
        let message = if content.trim().is_empty() {
            "the page returned no content".to_string()
        } else {
            content
        };
        return Err(SyncFailure::new(FailureKind::Content, message));
    }
    Ok(SyncData {
        title: response.chat_title.unwrap_or_default(),
        content,
        platform: response.platform.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use url::Url;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const WEBHOOK: &str = "https://flomoapp.com/iwh/abc/def/";

    const TWO_MESSAGES: &str = r#"<html><body><main><div class="thread">
        <div data-message-author-role="user"><div class="markdown"><p>Ping?</p></div></div>
        <div data-message-author-role="assistant"><div class="markdown"><p>Pong.</p></div></div>
    </div></main></body></html>"#;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<SyncState>>);

    impl SyncObserver for Recorder {
        fn state_changed(&self, _sync_id: SyncId, state: &SyncState) {
            self.0.lock().unwrap().push(state.clone());
        }
    }

    fn config() -> ExtensionConfig {
        ExtensionConfig {
            webhook_url: Some(WEBHOOK.into()),
            default_tag: "#ai-chat".into(),
        }
    }

    async fn sink(body: serde_json::Value, expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    fn coordinator(server: &MockServer, config: ExtensionConfig, url: &str, html: &str) -> SyncCoordinator {
        let client = FlomoClient::new()
            .unwrap()
            .with_origin(Url::parse(&server.uri()).unwrap());
        SyncCoordinator::start(config, PageSnapshot::new(url, html).unwrap(), client)
    }

    #[tokio::test]
    async fn code_zero_settles_success() {
        let server = sink(serde_json::json!({ "code": 0 }), 1).await;
        let mut coord = coordinator(&server, config(), "https://chatgpt.com/c/1", TWO_MESSAGES);
        let recorder = Recorder::default();

        let report = coord.sync(None, &recorder).await;

        assert!(report.succeeded(), "{:?}", report.outcome);
        assert_eq!(report.platform.as_deref(), Some("openai"));
        assert!(report.settled_at >= report.started_at);
        assert_eq!(
            *recorder.0.lock().unwrap(),
            vec![
                SyncState::Idle,
                SyncState::Requesting,
                SyncState::Delivering,
                SyncState::Settled(SyncOutcome::Success),
            ]
        );
        assert!(coord.state().is_settled());
    }

    #[tokio::test]
    async fn sink_error_settles_failure_with_its_message() {
        let server = sink(serde_json::json!({ "code": 1, "message": "bad" }), 1).await;
        let mut coord = coordinator(&server, config(), "https://chatgpt.com/c/1", TWO_MESSAGES);

        let report = coord.sync(Some("Ping pong"), &SilentObserver).await;

        assert_eq!(
            report.outcome,
            SyncOutcome::Failure(SyncFailure::new(FailureKind::Delivery, "bad"))
        );
        assert_eq!(report.title.as_deref(), Some("Ping pong"));
        if let SyncOutcome::Failure(failure) = &report.outcome {
            assert_eq!(failure.to_string(), "Failed to sync to Flomo: bad");
        }
    }

    #[tokio::test]
    async fn missing_webhook_never_reaches_the_sink() {
        let server = sink(serde_json::json!({ "code": 0 }), 0).await;
        let mut coord = coordinator(
            &server,
            ExtensionConfig::default(),
            "https://chatgpt.com/c/1",
            TWO_MESSAGES,
        );
        let recorder = Recorder::default();

        let report = coord.sync(None, &recorder).await;

        assert!(matches!(
            &report.outcome,
            SyncOutcome::Failure(f) if f.kind == FailureKind::Configuration
        ));
        assert_eq!(recorder.0.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn unsupported_page_fails_in_content_hop() {
        let server = sink(serde_json::json!({ "code": 0 }), 0).await;
        let mut coord = coordinator(&server, config(), "https://example.com/chat", TWO_MESSAGES);

        let report = coord.sync(None, &SilentObserver).await;

        let SyncOutcome::Failure(failure) = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Content);
        assert!(failure.message.contains("Unsupported platform"));
    }

    #[tokio::test]
    async fn apology_content_is_not_delivered() {
        let server = sink(serde_json::json!({ "code": 0 }), 0).await;
        let mut coord = coordinator(
            &server,
            config(),
            "https://kimi.moonshot.cn/chat/1",
            "<html><body><p>loading</p></body></html>",
        );

        let report = coord.sync(None, &SilentObserver).await;

        let SyncOutcome::Failure(failure) = report.outcome else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, FailureKind::Content);
        assert!(failure.message.starts_with("Could not extract chat content from Kimi."));
    }

    #[tokio::test]
    async fn stopped_context_settles_channel_failure() {
        let mut coord = SyncCoordinator::new(
            config(),
            ContextPort::disconnected("content"),
            ContextPort::disconnected("delivery"),
        );

        let report = coord.sync(None, &SilentObserver).await;

        assert!(matches!(
            &report.outcome,
            SyncOutcome::Failure(f) if f.kind == FailureKind::Channel
        ));
    }

    #[tokio::test]
    async fn settled_coordinator_can_sync_again() {
        let server = sink(serde_json::json!({ "code": 0 }), 2).await;
        let mut coord = coordinator(&server, config(), "https://chatgpt.com/c/1", TWO_MESSAGES);

        let first = coord.sync(None, &SilentObserver).await;
        let second = coord.sync(None, &SilentObserver).await;

        assert!(first.succeeded() && second.succeeded());
        assert_ne!(first.sync_id, second.sync_id);
    }
}
