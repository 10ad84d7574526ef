//! Request/response contract between the coordinator and its two contexts.
//!
//! The shapes serialize to the same JSON the browser-side contexts exchange:
//! an `action` tag on requests and camelCase fields throughout.

use chatsync_shared::{ChatSyncError, ExtractionResult, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Content context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum ContentRequest {
    /// Extract the conversation of the page the context owns.
    #[serde(rename = "getChatContent", rename_all = "camelCase")]
    GetChatContent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        chat_title: Option<String>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<ExtractionResult>> for ContentResponse {
    fn from(result: Result<ExtractionResult>) -> Self {
        match result {
            Ok(extracted) => Self {
                success: true,
                platform: Some(extracted.platform),
                chat_title: Some(extracted.title),
                chat_content: Some(extracted.markdown),
                message: None,
            },
            Err(ChatSyncError::UnsupportedPlatform { url }) => Self {
                message: Some(format!("Unsupported platform: {url}")),
                ..Self::default()
            },
            Err(e) => Self {
                message: Some(e.user_message()),
                ..Self::default()
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Delivery context
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum DeliveryRequest {
    /// Format and post one conversation.
    #[serde(rename = "syncToFlomo")]
    SyncToFlomo { data: SyncData },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncData {
    pub title: String,
    pub content: String,
    pub platform: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryResponse {
    pub success: bool,
    /// The sink's decoded answer on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeliveryResponse {
    pub fn delivered(data: Option<serde_json::Value>) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error.into()),
        }
    }
}
