//! In-process header-rewrite service.
//!
//! [`RewriteWorker`] owns the receiving end of a message channel and applies
//! each message to a [`HeaderRuleTable`] before acknowledging it.
//! [`RewriteHandle`] is the sending end and implements the application's
//! [`HeaderRewriteService`] port.

use async_trait::async_trait;
use courier_application::ports::{HeaderRewriteService, MessagingError, RewriteMessage};
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use super::HeaderRuleTable;

struct Envelope {
    message: RewriteMessage,
    ack: oneshot::Sender<()>,
}

/// Creates a connected handle and worker over `table`.
///
/// The worker does nothing until [`RewriteWorker::run`] is awaited or
/// spawned. Once every handle is dropped the worker's loop ends.
#[must_use]
pub fn rewrite_channel(table: HeaderRuleTable) -> (RewriteHandle, RewriteWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (RewriteHandle { sender }, RewriteWorker { table, receiver })
}

/// Applies rewrite messages to the rule table.
pub struct RewriteWorker {
    table: HeaderRuleTable,
    receiver: mpsc::UnboundedReceiver<Envelope>,
}

impl RewriteWorker {
    /// Processes messages until every [`RewriteHandle`] is gone.
    pub async fn run(mut self) {
        while let Some(Envelope { message, ack }) = self.receiver.recv().await {
            self.apply(message);
            // The sender may have stopped waiting.
            let _ = ack.send(());
        }
        debug!("header rewrite worker stopped");
    }

    fn apply(&self, message: RewriteMessage) {
        match message {
            RewriteMessage::SetRequestHeaders { url, headers } => {
                debug!(url = %url, rules = headers.len(), "installing forced headers");
                self.table.install(url, headers);
            }
            RewriteMessage::ClearRequestHeaders => {
                debug!(installed = self.table.len(), "clearing forced headers");
                self.table.clear();
            }
        }
    }
}

/// Sending side of the rewrite channel.
#[derive(Clone)]
pub struct RewriteHandle {
    sender: mpsc::UnboundedSender<Envelope>,
}

impl std::fmt::Debug for RewriteHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriteHandle")
            .field("closed", &self.sender.is_closed())
            .finish()
    }
}

#[async_trait]
impl HeaderRewriteService for RewriteHandle {
    async fn send(&self, message: RewriteMessage) -> Result<(), MessagingError> {
        let (ack, acked) = oneshot::channel();
        self.sender
            .send(Envelope { message, ack })
            .map_err(|_| MessagingError::Disconnected)?;
        acked
            .await
            .map_err(|_| MessagingError::NotAcknowledged("worker dropped the message".to_string()))
    }
}
