use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Identifies one scheduled tick. Handles are never reused by a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(u64);

impl TimerHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Cooperative one-shot timers. The host loop hands fired handles back to
/// whoever scheduled them.
pub trait Scheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerHandle;

    /// Cancelling an unknown or already fired handle is a no-op.
    fn cancel(&mut self, handle: TimerHandle);
}

pub type FiredSender = mpsc::UnboundedSender<TimerHandle>;
pub type FiredReceiver = mpsc::UnboundedReceiver<TimerHandle>;

/// Spawns one sleeping task per handle on the current tokio runtime. When
/// the sleep elapses the handle is posted to the fired channel.
pub struct TokioScheduler {
    next_id: u64,
    pending: HashMap<TimerHandle, JoinHandle<()>>,
    fired_tx: FiredSender,
}

impl TokioScheduler {
    pub fn new() -> (Self, FiredReceiver) {
        let (fired_tx, fired_rx) = mpsc::unbounded_channel();
        let scheduler = Self {
            next_id: 0,
            pending: HashMap::new(),
            fired_tx,
        };
        (scheduler, fired_rx)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.values().filter(|task| !task.is_finished()).count()
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerHandle {
        self.pending.retain(|_, task| !task.is_finished());

        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        let tx = self.fired_tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // The receiver only goes away when the host loop is shutting down.
            let _ = tx.send(handle);
        });
        self.pending.insert(handle, task);
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(task) = self.pending.remove(&handle) {
            task.abort();
            debug!(
                timer = handle.id(),
                pending = self.pending_count(),
                "cancelled pending timer"
            );
        }
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        for (_, task) in self.pending.drain() {
            task.abort();
        }
    }
}

/// Records timers without ever firing them. Tests fire handles by hand.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ManualScheduler {
    next_id: u64,
    pub scheduled: Vec<(TimerHandle, Duration)>,
    pub cancelled: Vec<TimerHandle>,
}

#[cfg(test)]
impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay: Duration) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.scheduled.push((handle, delay));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.cancelled.push(handle);
    }
}
