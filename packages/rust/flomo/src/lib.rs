//! Flomo delivery for chatsync.
//!
//! Formats an extracted conversation as a Flomo note (heading, tag line,
//! transcript) and posts it to the user's incoming webhook.

mod client;
mod format;

pub use client::{FlomoClient, FlomoResponse, UNKNOWN_SINK_ERROR};
pub use format::{DeliveryPayload, format_flomo_content, sanitize_tag_segment};
