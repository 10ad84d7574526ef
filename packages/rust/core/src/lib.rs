//! Sync orchestration for chatsync.
//!
//! Ties the platform extractors and the Flomo client together: a content
//! context and a delivery context each sit behind a [`ContextPort`], and the
//! [`SyncCoordinator`] drives one sync across both hops.

pub mod content;
pub mod coordinator;
pub mod delivery;
pub mod messages;
pub mod port;

pub use content::ContentContext;
pub use coordinator::{
    FailureKind, SilentObserver, SyncCoordinator, SyncFailure, SyncObserver, SyncOutcome,
    SyncReport, SyncState,
};
pub use delivery::DeliveryContext;
pub use messages::{ContentRequest, ContentResponse, DeliveryRequest, DeliveryResponse, SyncData};
pub use port::{ContextHandler, ContextPort};
