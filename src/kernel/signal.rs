// Binary event handoff between one interrupt producer and one task
//
// A Signal is either empty or pending. Posts never queue: any number of
// posts before the consumer waits collapse into a single wakeup. The
// pending flag stays set until the bound task consumes it, so a post that
// lands while the task is busy (or sleeping) is picked up by its next wait.
//
// Producers only ever see a `Poster`. Consuming is crate-private and goes
// through the scheduler, so firmware ISRs cannot reach it.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use super::wake;

pub struct Signal {
    pending: AtomicBool,
    // set once a task is bound; a Signal wakes exactly one task
    bound: AtomicBool,
    posts: Mutex<Cell<u32>>,
}

impl Signal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
            bound: AtomicBool::new(false),
            posts: Mutex::new(Cell::new(0)),
        }
    }

    /// Mark the signal pending and ask the kernel loop to reschedule.
    ///
    /// Safe from interrupt or task context. Idempotent on the flag; bounded
    /// time, no allocation, never blocks.
    #[inline]
    pub fn post(&self) {
        self.pending.store(true, Ordering::Release);
        critical_section::with(|cs| {
            let posts = self.posts.borrow(cs);
            posts.set(posts.get().wrapping_add(1));
        });
        wake::request_reschedule();
    }

    /// Post-only handle for interrupt handlers.
    pub const fn poster(&self) -> Poster<'_> {
        Poster { signal: self }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Total posts seen, including ones that collapsed into an already
    /// pending flag.
    pub fn post_count(&self) -> u32 {
        critical_section::with(|cs| self.posts.borrow(cs).get())
    }

    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Acquire)
    }

    // Clear pending and report whether it was set. Callers that also change
    // task state must hold the same critical section across both.
    pub(crate) fn take_in(&self, _cs: critical_section::CriticalSection<'_>) -> bool {
        let pending = self.pending.load(Ordering::Acquire);
        if pending {
            self.pending.store(false, Ordering::Relaxed);
        }
        pending
    }

    #[cfg(test)]
    pub(crate) fn try_take(&self) -> bool {
        critical_section::with(|cs| self.take_in(cs))
    }

    // Claim the signal for one task. False if someone already holds it.
    pub(crate) fn bind(&self) -> bool {
        critical_section::with(|_| {
            if self.bound.load(Ordering::Acquire) {
                return false;
            }
            self.bound.store(true, Ordering::Release);
            true
        })
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}

/// The only view of a [`Signal`] handed to interrupt context.
#[derive(Clone, Copy)]
pub struct Poster<'a> {
    signal: &'a Signal,
}

impl Poster<'_> {
    #[inline]
    pub fn post(&self) {
        self.signal.post();
    }
}
