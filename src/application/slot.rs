//! Operation slots: per-operation status, in-flight guard and auto-reset timers

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::domain::error::OperationInProgress;
use crate::domain::operation::{OperationKind, OperationState, OperationStatus};

/// Auto-reset delay after a successful save or start
pub const SHORT_RESET: Duration = Duration::from_secs(3);
/// Auto-reset delay after a successful update or domain connection
pub const LONG_RESET: Duration = Duration::from_secs(30);

struct SlotInner {
    kind: OperationKind,
    busy: AtomicBool,
    generation: AtomicU64,
    status: Mutex<OperationStatus>,
    reset_after: Option<Duration>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl SlotInner {
    fn status(&self) -> MutexGuard<'_, OperationStatus> {
        self.status.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, apply: impl FnOnce(&mut OperationStatus)) -> u64 {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        apply(&mut self.status());
        generation
    }
}

/// State slot owned by one orchestrator.
///
/// At most one invocation holds the slot at a time; a second `begin` is refused with
/// [`OperationInProgress`] instead of racing the first.
#[derive(Clone)]
pub struct OperationSlot {
    inner: Arc<SlotInner>,
}

impl OperationSlot {
    /// Slot whose success state resets to idle after `reset_after`
    pub fn new(kind: OperationKind, reset_after: Option<Duration>) -> Self {
        Self {
            inner: Arc::new(SlotInner {
                kind,
                busy: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                status: Mutex::new(OperationStatus::new()),
                reset_after,
                timers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn kind(&self) -> OperationKind {
        self.inner.kind
    }

    /// Snapshot of the current status
    pub fn status(&self) -> OperationStatus {
        self.inner.status().clone()
    }

    pub fn state(&self) -> OperationState {
        self.inner.status().state
    }

    pub fn is_busy(&self) -> bool {
        self.inner.busy.load(Ordering::SeqCst)
    }

    /// Claim the slot and enter the in-progress state
    pub fn begin(&self, message: impl Into<String>) -> Result<SlotGuard, OperationInProgress> {
        if self
            .inner
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(OperationInProgress {
                operation: self.inner.kind.to_string(),
            });
        }

        let message = message.into();
        debug!(operation = %self.inner.kind, %message, "begin");
        self.inner.transition(|s| s.begin(message));

        Ok(SlotGuard {
            inner: Arc::clone(&self.inner),
            finished: false,
        })
    }

    /// Abort all pending auto-reset timers
    pub fn shutdown(&self) {
        let mut timers = self
            .inner
            .timers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for timer in timers.drain(..) {
            timer.abort();
        }
    }

    fn schedule_reset(inner: &Arc<SlotInner>, generation: u64) {
        let Some(delay) = inner.reset_after else {
            return;
        };

        let target = Arc::clone(inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if target.generation.load(Ordering::SeqCst) == generation {
                target.status().reset();
            }
        });

        let mut timers = inner.timers.lock().unwrap_or_else(PoisonError::into_inner);
        timers.retain(|t| !t.is_finished());
        timers.push(handle);
    }
}

/// Exclusive hold on a slot for one invocation.
///
/// Dropping the guard releases the slot. A guard dropped without `succeed` or `fail`
/// leaves the slot in the error state.
pub struct SlotGuard {
    inner: Arc<SlotInner>,
    finished: bool,
}

impl SlotGuard {
    /// Update the in-progress message
    pub fn progress(&self, message: impl Into<String>) {
        self.inner.status().message = message.into();
    }

    /// Enter the success state and schedule the auto-reset
    pub fn succeed(mut self, message: impl Into<String>) {
        let generation = self.inner.transition(|s| s.succeed(message));
        OperationSlot::schedule_reset(&self.inner, generation);
        self.finished = true;
    }

    /// Enter the error state; it stays until the next attempt
    pub fn fail(mut self, message: impl Into<String>) {
        self.inner.transition(|s| s.fail(message));
        self.finished = true;
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if !self.finished {
            self.inner.transition(|s| s.fail("Operation was interrupted"));
        }
        self.inner.busy.store(false, Ordering::SeqCst);
    }
}
