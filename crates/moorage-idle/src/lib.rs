//! Cancellable idle-timeout supervision for Moorage.
//!
//! Runs at most one pending delayed action at a time — the "nobody
//! connected in time, tear the session down" timer — cancellable on
//! demand, race-free against its own expiry.
//!
//! # The race this crate exists to close
//!
//! The timer and its cancellation come from different concurrent
//! callers: expiry fires on a timer task, cancellation arrives on a
//! networking task the moment the first player connects. A naive
//! implementation keeps a nullable cancellation handle next to a
//! "timer running" flag and checks them separately — which leaves a
//! window where a connect observes the session as active before the
//! handle exists, and a window where cancel and expiry both act.
//!
//! Here the armed timer lives in a single locked slot. [`start`]
//! publishes the cancellation handle inside the same critical section
//! that arms the timer, and expiry claims the slot under the same lock
//! before it may fire. Whoever takes the slot wins; the loser observes
//! an empty slot and does nothing. Exactly one of {cancel effect,
//! expiry effect} happens per armed timer.
//!
//! [`start`]: IdleTimeoutSupervisor::start
//!
//! # Expiry is a request, not a verdict
//!
//! The `on_expire` callback runs after the slot lock is released, and
//! callers are expected to re-validate current state inside it — a
//! connection may have arrived in the race window and lost the cancel
//! race without the session actually being idle anymore.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time;
use tracing::{debug, trace};

/// Errors from supervisor misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IdleError {
    /// `start` was called while a timer was already armed. At most one
    /// pending action may exist; callers must cancel (or use
    /// [`restart`](IdleTimeoutSupervisor::restart)) first.
    #[error("idle timer already armed")]
    DoubleStart,
}

/// The armed timer's cancellation handle plus the generation that
/// identifies it. Lives in the shared slot from the instant the timer
/// is armed until either side claims it.
struct ArmedTimer {
    generation: u64,
    cancel: oneshot::Sender<()>,
}

/// The shared slot. `generation` increments on every arm, so a stale
/// expiry task can never claim a timer that replaced its own.
struct Slot {
    generation: u64,
    armed: Option<ArmedTimer>,
}

/// Supervises at most one cancellable delayed action.
///
/// ```text
/// start ──→ [armed] ──(timeout elapses)──→ on_expire fires
///              │
///              └──(cancel / restart)──→ on_expire never fires
/// ```
///
/// The wait itself is a parked Tokio task on [`tokio::time::sleep`] —
/// no busy-wait, and cancellation drops the sleep so the underlying
/// timer entry is freed immediately.
pub struct IdleTimeoutSupervisor {
    slot: Arc<Mutex<Slot>>,
}

impl IdleTimeoutSupervisor {
    /// Creates a supervisor with nothing armed.
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(Slot {
                generation: 0,
                armed: None,
            })),
        }
    }

    /// Arms the timer: after `timeout`, `on_expire` fires unless
    /// cancelled first.
    ///
    /// The cancellation handle is published before this returns, so a
    /// caller that sequences `start` before advertising "session
    /// active" guarantees every later `cancel` finds the handle.
    ///
    /// # Errors
    /// [`IdleError::DoubleStart`] if a timer is already armed.
    pub fn start<F, Fut>(&self, timeout: Duration, on_expire: F) -> Result<(), IdleError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.lock();
        if slot.armed.is_some() {
            return Err(IdleError::DoubleStart);
        }
        self.arm(&mut slot, timeout, on_expire);
        Ok(())
    }

    /// Cancels the armed timer, if any.
    ///
    /// Returns `true` if cancellation won — the callback will not fire.
    /// Returns `false` if nothing was armed, either because no timer
    /// was started or because expiry already claimed it; callers that
    /// get `false` during a connect should expect the expiry path to
    /// run and re-validate against their state.
    pub fn cancel(&self) -> bool {
        let mut slot = self.lock();
        match slot.armed.take() {
            Some(timer) => {
                // The task may already be past its sleep and blocked on
                // the slot lock; taking the entry above is what decides
                // the race, the signal just lets the task exit early.
                let _ = timer.cancel.send(());
                trace!("idle timer cancelled");
                true
            }
            None => false,
        }
    }

    /// Cancels any armed timer and arms a fresh one, atomically.
    ///
    /// Used when the tracked resource drains back to idle (last player
    /// disconnects) while the session is still live. A concurrent
    /// `cancel` sees either the old timer or the new one — never a gap
    /// with both or neither.
    pub fn restart<F, Fut>(&self, timeout: Duration, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.lock();
        if let Some(timer) = slot.armed.take() {
            let _ = timer.cancel.send(());
            trace!("idle timer replaced");
        }
        self.arm(&mut slot, timeout, on_expire);
    }

    /// Whether a timer is currently armed (neither cancelled nor expired).
    pub fn is_armed(&self) -> bool {
        self.lock().armed.is_some()
    }

    /// Arms a new timer into `slot`. Caller holds the lock, so the
    /// spawned task cannot observe the slot until the handle is in it.
    fn arm<F, Fut>(&self, slot: &mut Slot, timeout: Duration, on_expire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        slot.generation += 1;
        let generation = slot.generation;
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        let shared = Arc::clone(&self.slot);

        tokio::spawn(async move {
            tokio::select! {
                _ = time::sleep(timeout) => {
                    // Claim the slot. If cancel or a restart got there
                    // first, our generation is gone and we lost.
                    let won = {
                        let mut slot = shared.lock().unwrap_or_else(PoisonError::into_inner);
                        match &slot.armed {
                            Some(armed) if armed.generation == generation => {
                                slot.armed = None;
                                true
                            }
                            _ => false,
                        }
                    };
                    if won {
                        debug!(timeout = ?timeout, "idle timeout elapsed");
                        on_expire().await;
                    } else {
                        trace!("idle expiry lost the race to a cancel");
                    }
                }
                _ = cancel_rx => {
                    trace!("idle timer task exiting on cancel");
                }
            }
        });

        slot.armed = Some(ArmedTimer {
            generation,
            cancel: cancel_tx,
        });
        debug!(timeout = ?timeout, "idle timer armed");
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for IdleTimeoutSupervisor {
    fn default() -> Self {
        Self::new()
    }
}

/// Disarms any pending timer so a dropped supervisor can't fire a
/// callback into a world that no longer owns it.
impl Drop for IdleTimeoutSupervisor {
    fn drop(&mut self) {
        if let Some(timer) = self.lock().armed.take() {
            let _ = timer.cancel.send(());
        }
    }
}
