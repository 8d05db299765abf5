//! Debouncing of raw events into one notification per burst.
//!
//! A single long-lived timer task owns one `Sleep` whose deadline is
//! pushed back on every raw event. Cancellation bumps an epoch; arms and
//! fires carrying an older epoch are dropped, and both the epoch bump and
//! the fire happen under the same lock, so nothing fires after
//! [`DebounceTimer::cancel`] returns.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, trace};

use crate::notifier::ChangeNotifier;

/// Deadline used while nothing is pending.
const IDLE_PARK: Duration = Duration::from_secs(60 * 60 * 24 * 365);

enum Command {
    Arm { epoch: u64, deadline: Instant },
    Cancel,
}

struct Shared {
    epoch: Mutex<u64>,
    notifier: ChangeNotifier,
}

/// Single-shot, restartable timer feeding a [`ChangeNotifier`].
pub struct DebounceTimer {
    quiet: Duration,
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl DebounceTimer {
    /// Spawn the timer task on `handle`.
    pub fn spawn(handle: &Handle, quiet: Duration, notifier: ChangeNotifier) -> Self {
        let shared = Arc::new(Shared {
            epoch: Mutex::new(0),
            notifier,
        });
        let (tx, rx) = mpsc::unbounded_channel();
        let task = handle.spawn(run(rx, shared.clone()));

        Self {
            quiet,
            shared,
            tx,
            task,
        }
    }

    /// A handle that (re)arms the timer until the next [`cancel`](Self::cancel).
    pub fn trigger(&self) -> DebounceTrigger {
        DebounceTrigger {
            epoch: *self.shared.epoch.lock(),
            quiet: self.quiet,
            shared: self.shared.clone(),
            tx: self.tx.clone(),
        }
    }

    /// Cancel any pending fire and invalidate every existing trigger.
    ///
    /// Returns the new epoch. Once this returns, no notification from an
    /// earlier arm can be delivered.
    pub fn cancel(&self) -> u64 {
        let mut epoch = self.shared.epoch.lock();
        *epoch += 1;
        let _ = self.tx.send(Command::Cancel);
        *epoch
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        *self.shared.epoch.lock()
    }

    /// Quiet period.
    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Number of notifications delivered so far.
    pub fn fired(&self) -> u64 {
        self.shared.notifier.count()
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
        self.task.abort();
    }
}

/// Cheap, cloneable arming handle bound to one epoch.
///
/// Safe to use from any thread, including notify's event threads.
#[derive(Clone)]
pub struct DebounceTrigger {
    epoch: u64,
    quiet: Duration,
    shared: Arc<Shared>,
    tx: mpsc::UnboundedSender<Command>,
}

impl DebounceTrigger {
    /// Restart the quiet period. Returns `false` if this trigger is stale.
    pub fn arm(&self) -> bool {
        let current = self.shared.epoch.lock();
        if *current != self.epoch {
            trace!("Ignoring stale debounce arm (epoch {})", self.epoch);
            return false;
        }
        let deadline = Instant::now() + self.quiet;
        self.tx
            .send(Command::Arm {
                epoch: self.epoch,
                deadline,
            })
            .is_ok()
    }

    /// Whether the timer was cancelled since this trigger was created.
    pub fn is_stale(&self) -> bool {
        *self.shared.epoch.lock() != self.epoch
    }
}

async fn run(mut rx: mpsc::UnboundedReceiver<Command>, shared: Arc<Shared>) {
    let sleep = time::sleep_until(Instant::now() + IDLE_PARK);
    tokio::pin!(sleep);
    let mut armed: Option<u64> = None;

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Arm { epoch, deadline }) => {
                    sleep.as_mut().reset(deadline);
                    armed = Some(epoch);
                }
                Some(Command::Cancel) => {
                    armed = None;
                }
                None => break,
            },
            () = &mut sleep, if armed.is_some() => {
                let fired_epoch = armed.take();
                sleep.as_mut().reset(Instant::now() + IDLE_PARK);

                let current = shared.epoch.lock();
                if fired_epoch == Some(*current) {
                    shared.notifier.notify();
                    debug!("Folders changed (notification {})", shared.notifier.count());
                } else {
                    trace!("Dropping debounce fire from cancelled epoch");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio::time::sleep;

    const QUIET: Duration = Duration::from_millis(500);

    fn timer() -> (DebounceTimer, crate::ChangeReceiver) {
        let notifier = ChangeNotifier::new();
        let rx = notifier.subscribe();
        (DebounceTimer::spawn(&Handle::current(), QUIET, notifier), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_fires_once_after_last_event() {
        let (timer, rx) = timer();
        let trigger = timer.trigger();

        for _ in 0..5 {
            assert!(trigger.arm());
            sleep(Duration::from_millis(100)).await;
        }

        sleep(Duration::from_millis(350)).await;
        assert_eq!(rx.fire_count(), 0, "quiet period restarts on every event");

        sleep(Duration::from_millis(100)).await;
        assert_eq!(rx.fire_count(), 1);

        sleep(Duration::from_secs(5)).await;
        assert_eq!(rx.fire_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (timer, rx) = timer();
        let trigger = timer.trigger();

        trigger.arm();
        sleep(Duration::from_millis(600)).await;
        trigger.arm();
        sleep(Duration::from_millis(600)).await;

        assert_eq!(rx.fire_count(), 2);
        assert_eq!(timer.fired(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_pending_fire() {
        let (timer, rx) = timer();
        let trigger = timer.trigger();

        trigger.arm();
        sleep(Duration::from_millis(200)).await;
        timer.cancel();
        sleep(Duration::from_secs(2)).await;

        assert_eq!(rx.fire_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_trigger_is_ignored() {
        let (timer, rx) = timer();
        let stale = timer.trigger();
        timer.cancel();

        assert!(stale.is_stale());
        assert!(!stale.arm());
        sleep(Duration::from_secs(2)).await;
        assert_eq!(rx.fire_count(), 0);

        let fresh = timer.trigger();
        assert!(fresh.arm());
        sleep(Duration::from_secs(1)).await;
        assert_eq!(rx.fire_count(), 1);
    }
}
