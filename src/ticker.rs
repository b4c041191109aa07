//! Cancellable background ticks.
//!
//! Every periodic or delayed job runs as its own tokio task behind a
//! [`Ticker`]; dropping the ticker aborts the task, so a ticker stored next
//! to the state it drives can never outlive it.

use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickControl {
    Continue,
    Stop,
}

#[derive(Debug)]
pub struct Ticker {
    handle: JoinHandle<()>,
}

impl Ticker {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Run `on_tick` every `period`, first after one full period. Ticks never
/// overlap and a late tick does not cause a burst of catch-up ticks.
///
/// Must be called from within a tokio runtime.
pub fn spawn_repeating<F>(period: Duration, mut on_tick: F) -> Ticker
where
    F: FnMut() -> TickControl + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if on_tick() == TickControl::Stop {
                break;
            }
        }
    });
    Ticker { handle }
}

/// Run `on_fire` once after `delay` unless cancelled first.
pub fn spawn_delayed<F>(delay: Duration, on_fire: F) -> Ticker
where
    F: FnOnce() + Send + 'static,
{
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        on_fire();
    });
    Ticker { handle }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    QrScan,
    RideClock,
    DestinationTimer,
    ExerciseTimer,
}

/// Identifies one registration in a [`TaskSet`].
pub type TaskId = u64;

/// At most one live ticker per kind.
///
/// Aborting a ticker cannot reach a job already waiting on the state lock,
/// so jobs carry the [`TaskId`] they were registered under and check
/// [`TaskSet::is_current`] once they hold the lock.
#[derive(Debug, Default)]
pub struct TaskSet {
    tasks: HashMap<TaskKind, (TaskId, Ticker)>,
    next_id: TaskId,
}

impl TaskSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for a ticker about to be spawned and passed to [`TaskSet::replace`].
    pub fn next_id(&mut self) -> TaskId {
        self.next_id += 1;
        self.next_id
    }

    /// Store `ticker`, aborting whatever was registered under `kind`.
    pub fn replace(&mut self, kind: TaskKind, id: TaskId, ticker: Ticker) {
        if self.tasks.insert(kind, (id, ticker)).is_some() {
            debug!(task = ?kind, id, "Replaced running task");
        }
    }

    pub fn cancel(&mut self, kind: TaskKind) {
        if self.tasks.remove(&kind).is_some() {
            debug!(task = ?kind, "Task cancelled");
        }
    }

    pub fn is_active(&self, kind: TaskKind) -> bool {
        self.tasks
            .get(&kind)
            .is_some_and(|(_, ticker)| !ticker.is_finished())
    }

    pub fn is_current(&self, kind: TaskKind, id: TaskId) -> bool {
        self.tasks
            .get(&kind)
            .is_some_and(|(current, _)| *current == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn repeating_ticker_fires_once_per_period() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let _ticker = spawn_repeating(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        });

        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_ticker_stops_ticks() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let ticker = spawn_repeating(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
            TickControl::Continue
        });

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        drop(ticker);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_ends_the_task() {
        let count = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&count);
        let ticker = spawn_repeating(Duration::from_secs(1), move || {
            if counter.fetch_add(1, Ordering::SeqCst) + 1 == 2 {
                TickControl::Stop
            } else {
                TickControl::Continue
            }
        });

        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert!(ticker.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_delay_never_fires() {
        let fired = Arc::new(AtomicU32::new(0));
        let flag = Arc::clone(&fired);
        let mut tasks = TaskSet::new();
        let id = tasks.next_id();
        tasks.replace(
            TaskKind::QrScan,
            id,
            spawn_delayed(Duration::from_secs(2), move || {
                flag.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert!(tasks.is_active(TaskKind::QrScan));

        tasks.cancel(TaskKind::QrScan);
        tokio::time::sleep(Duration::from_secs(3)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert!(!tasks.is_active(TaskKind::QrScan));
    }

    #[tokio::test(start_paused = true)]
    async fn replaced_registration_is_no_longer_current() {
        let mut tasks = TaskSet::new();
        let first = tasks.next_id();
        tasks.replace(
            TaskKind::ExerciseTimer,
            first,
            spawn_repeating(Duration::from_secs(1), || TickControl::Continue),
        );
        let second = tasks.next_id();
        tasks.replace(
            TaskKind::ExerciseTimer,
            second,
            spawn_repeating(Duration::from_secs(1), || TickControl::Continue),
        );

        assert_ne!(first, second);
        assert!(!tasks.is_current(TaskKind::ExerciseTimer, first));
        assert!(tasks.is_current(TaskKind::ExerciseTimer, second));
        assert!(!tasks.is_current(TaskKind::DestinationTimer, second));

        tasks.cancel(TaskKind::ExerciseTimer);
        assert!(!tasks.is_current(TaskKind::ExerciseTimer, second));
    }
}
