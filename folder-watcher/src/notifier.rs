//! The coalesced "folders changed" signal.
//!
//! Notifications carry no payload: consumers re-read the authoritative
//! monitored-folder list themselves. The signal is a counter held in a
//! `watch` channel, so a slow consumer sees one pending change no matter
//! how many notifications it missed, and firing never blocks.

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{Result, WatcherError};

/// Producer side of the change signal.
#[derive(Debug, Clone)]
pub struct ChangeNotifier {
    tx: Arc<watch::Sender<u64>>,
}

impl ChangeNotifier {
    /// Create a notifier with no firings yet.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Signal one change to every subscriber.
    ///
    /// Performs no work beyond bumping the counter, so it is safe to call
    /// from any thread.
    pub fn notify(&self) {
        self.tx.send_modify(|count| *count += 1);
    }

    /// Subscribe to future changes.
    pub fn subscribe(&self) -> ChangeReceiver {
        ChangeReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of notifications sent so far.
    pub fn count(&self) -> u64 {
        *self.tx.borrow()
    }
}

impl Default for ChangeNotifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer side of the change signal.
#[derive(Debug, Clone)]
pub struct ChangeReceiver {
    rx: watch::Receiver<u64>,
}

impl ChangeReceiver {
    /// Wait until a change arrives that this receiver has not seen.
    ///
    /// Errors once the notifier is gone.
    pub async fn changed(&mut self) -> Result<()> {
        self.rx.changed().await.map_err(|_| WatcherError::Closed)
    }

    /// Whether a change is pending.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Mark all pending changes as seen.
    pub fn mark_seen(&mut self) {
        drop(self.rx.borrow_and_update());
    }

    /// Total number of notifications fired since the notifier was created.
    pub fn fire_count(&self) -> u64 {
        *self.rx.borrow()
    }
}
