//! Single-writer append actor
//!
//! All ledger appends funnel through one tokio task so that concurrent
//! callers can never interleave a multi-row write. Reads do not pass through
//! the actor; they scan the store directly. The check-then-act window between
//! a balance read and its append therefore remains (the modeled store has no
//! conditional write), but writes themselves are strictly ordered.

use crate::{error::Error, error::Result, store::LedgerStore, types::LedgerEntry};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Message sent to the append actor
pub enum AppendMessage {
    /// Append one row
    Append {
        /// Entry to append
        entry: LedgerEntry,
        /// Reply channel carrying the committed transaction id
        response: oneshot::Sender<Result<Uuid>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor owning the write side of the store
struct AppendActor {
    store: Arc<dyn LedgerStore>,
    mailbox: mpsc::Receiver<AppendMessage>,
}

impl AppendActor {
    async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                AppendMessage::Append { entry, response } => {
                    let transaction_id = entry.transaction_id;
                    let result = self.store.append_row(&entry).map(|_| transaction_id);
                    if let Err(ref e) = result {
                        tracing::error!(
                            transaction_id = %transaction_id,
                            error = %e,
                            "Ledger append failed"
                        );
                    }
                    let _ = response.send(result);
                }
                AppendMessage::Shutdown => break,
            }
        }
    }
}

/// Handle for sending appends to the actor
#[derive(Clone)]
pub struct LedgerHandle {
    sender: mpsc::Sender<AppendMessage>,
}

impl LedgerHandle {
    /// Append an entry, returning its transaction id once the store accepted it
    pub async fn append(&self, entry: LedgerEntry) -> Result<Uuid> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(AppendMessage::Append {
                entry,
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Writer mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(AppendMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Writer mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the append actor over a store
pub fn spawn_append_actor(store: Arc<dyn LedgerStore>) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(1024); // Bounded channel for backpressure
    let actor = AppendActor { store, mailbox: rx };

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle { sender: tx }
}
