//! The content context: owns one page snapshot and answers extraction requests.

use std::sync::Arc;

use chatsync_platforms::{PageSnapshot, PlatformRegistry, extract_conversation};
use tracing::debug;

use crate::messages::{ContentRequest, ContentResponse};
use crate::port::ContextHandler;

/// Serves `getChatContent` for the page it was created with.
pub struct ContentContext {
    registry: Arc<PlatformRegistry>,
    page: Arc<PageSnapshot>,
}

impl ContentContext {
    pub fn new(registry: Arc<PlatformRegistry>, page: Arc<PageSnapshot>) -> Self {
        Self { registry, page }
    }
}

impl ContextHandler for ContentContext {
    type Request = ContentRequest;
    type Response = ContentResponse;

    async fn handle(&self, request: ContentRequest) -> ContentResponse {
        let ContentRequest::GetChatContent { chat_title } = request;
        debug!(url = self.page.url(), "content requested");
        extract_conversation(&self.registry, &self.page, chat_title.as_deref()).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(url: &str, html: &str) -> ContentContext {
        ContentContext::new(
            Arc::new(PlatformRegistry::new()),
            Arc::new(PageSnapshot::new(url, html).unwrap()),
        )
    }

    #[tokio::test]
    async fn answers_with_transcript() {
        let ctx = context(
            "https://www.kimi.com/chat/1",
            r#"<div class="segment segment-user">hello kimi</div><div class="segment segment-assistant">hello human</div>"#,
        );
        let resp = ctx
            .handle(ContentRequest::GetChatContent {
                chat_title: Some("Greeting".into()),
            })
            .await;
        assert!(resp.success);
        assert_eq!(resp.platform.as_deref(), Some("kimi"));
        assert_eq!(resp.chat_title.as_deref(), Some("Greeting"));
        assert!(resp.chat_content.unwrap().starts_with("# Kimi Chat Conversation"));
    }

    #[tokio::test]
    async fn unsupported_page_is_unsuccessful() {
        let ctx = context("https://example.org/", "<p>hi</p>");
        let resp = ctx.handle(ContentRequest::GetChatContent { chat_title: None }).await;
        assert!(!resp.success);
        assert!(resp.message.unwrap().starts_with("Unsupported platform"));
    }
}
