//! Deferred platform-message deletions
//!
//! Handled command messages are deleted a few seconds later. Each deletion
//! is an owned scheduled job with an abort handle, not a loose background
//! task; shutdown aborts whatever has not fired yet.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use muster_net::Message;

pub struct Janitor {
    outbox: mpsc::Sender<Message>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Janitor {
    pub fn new(outbox: mpsc::Sender<Message>) -> Self {
        Self {
            outbox,
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Send `directive` to the adapters after `delay`
    pub fn schedule(&self, delay: Duration, directive: Message) {
        let outbox = self.outbox.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if outbox.send(directive).await.is_err() {
                tracing::debug!("Outbox closed before deferred directive fired");
            }
        });

        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }

    /// Abort everything still pending
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn delete_msg() -> Message {
        Message::DeleteMessage {
            channel_id: Uuid::new_v4(),
            message_id: Uuid::new_v4(),
        }
    }

    #[tokio::test]
    async fn test_directive_fires_after_delay() {
        let (tx, mut rx) = mpsc::channel(8);
        let janitor = Janitor::new(tx);

        janitor.schedule(Duration::from_millis(10), delete_msg());
        assert_eq!(janitor.pending(), 1);

        let fired = rx.recv().await.unwrap();
        assert!(matches!(fired, Message::DeleteMessage { .. }));
    }

    #[tokio::test]
    async fn test_shutdown_aborts_pending() {
        let (tx, mut rx) = mpsc::channel(8);
        let janitor = Janitor::new(tx);

        janitor.schedule(Duration::from_secs(3600), delete_msg());
        janitor.shutdown();
        assert_eq!(janitor.pending(), 0);

        // Nothing arrives: the job was aborted, not flushed
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
    }
}
