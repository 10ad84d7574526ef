//! Single-shot request/response ports in front of isolated contexts.
//!
//! A context runs on its own task and owns its state. Callers only hold a
//! [`ContextPort`]: every request travels with a oneshot reply channel, and
//! each request is served on a task of its own, so overlapping requests are
//! handled concurrently.

use std::future::Future;
use std::sync::Arc;

use chatsync_shared::{ChatSyncError, Result};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

/// Queued requests per port before senders wait.
const PORT_CAPACITY: usize = 16;

/// Something that answers requests behind a port.
pub trait ContextHandler: Send + Sync + 'static {
    type Request: Send + 'static;
    type Response: Send + 'static;

    fn handle(&self, request: Self::Request) -> impl Future<Output = Self::Response> + Send;
}

struct Envelope<Req, Resp> {
    request: Req,
    reply: oneshot::Sender<Resp>,
}

/// Sending half of a context. Cheap to clone.
pub struct ContextPort<Req, Resp> {
    name: &'static str,
    tx: mpsc::Sender<Envelope<Req, Resp>>,
}

impl<Req, Resp> Clone for ContextPort<Req, Resp> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
        }
    }
}

impl<Req: Send + 'static, Resp: Send + 'static> ContextPort<Req, Resp> {
    /// Start `handler` on the current tokio runtime and return its port.
    ///
    /// The context stops once every port clone is dropped.
    pub fn spawn<H>(name: &'static str, handler: H) -> Self
    where
        H: ContextHandler<Request = Req, Response = Resp>,
    {
        let (tx, mut rx) = mpsc::channel::<Envelope<Req, Resp>>(PORT_CAPACITY);
        let handler = Arc::new(handler);

        tokio::spawn(async move {
            while let Some(Envelope { request, reply }) = rx.recv().await {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let response = handler.handle(request).await;
                    if reply.send(response).is_err() {
                        debug!(context = name, "requester gone before reply");
                    }
                });
            }
            debug!(context = name, "context stopped");
        });

        Self { name, tx }
    }

    /// Send one request and wait for its reply.
    pub async fn send(&self, request: Req) -> Result<Resp> {
        let (reply, answer) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| ChatSyncError::Channel(format!("{} context is not running", self.name)))?;
        answer
            .await
            .map_err(|_| ChatSyncError::Channel(format!("{} context dropped the request", self.name)))
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// A port whose context has already stopped.
    #[cfg(test)]
    pub(crate) fn disconnected(name: &'static str) -> Self {
        let (tx, _rx) = mpsc::channel(1);
        Self { name, tx }
    }
}
