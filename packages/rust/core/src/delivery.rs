//! The delivery context: formats notes and posts them to the configured sink.

use chatsync_flomo::{FlomoClient, FlomoResponse, format_flomo_content};
use chatsync_shared::{ExtensionConfig, Result};
use tracing::{info, warn};

use crate::messages::{DeliveryRequest, DeliveryResponse, SyncData};
use crate::port::ContextHandler;

/// Serves `syncToFlomo` with the configuration it was started with.
pub struct DeliveryContext {
    config: ExtensionConfig,
    client: FlomoClient,
}

impl DeliveryContext {
    pub fn new(config: ExtensionConfig, client: FlomoClient) -> Self {
        Self { config, client }
    }

    async fn deliver(&self, data: &SyncData) -> Result<FlomoResponse> {
        let endpoint = self.config.require_webhook()?;
        let note = format_flomo_content(&data.title, &data.content, &data.platform, self.config.tag_prefix());
        self.client.send(endpoint, &note).await
    }
}

impl ContextHandler for DeliveryContext {
    type Request = DeliveryRequest;
    type Response = DeliveryResponse;

    async fn handle(&self, request: DeliveryRequest) -> DeliveryResponse {
        let DeliveryRequest::SyncToFlomo { data } = request;
        match self.deliver(&data).await {
            Ok(resp) => {
                info!(platform = %data.platform, title = %data.title, "delivered");
                DeliveryResponse::delivered(serde_json::to_value(resp).ok())
            }
            Err(e) => {
                warn!(error = %e, "delivery failed");
                DeliveryResponse::failed(e.user_message())
            }
        }
    }
}
