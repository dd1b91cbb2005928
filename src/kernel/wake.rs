// Tick accounting and reschedule requests between ISRs and the kernel loop
//
// The systick ISR bumps a pending-tick counter; the kernel loop drains it
// in task context and feeds each tick to the scheduler. Signal posts set
// the reschedule flag so the loop re-runs selection before idling.
// Critical section guards riscv32imc (no atomic RMW).

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

static RESCHEDULE: AtomicBool = AtomicBool::new(false);

#[inline]
pub fn request_reschedule() {
    RESCHEDULE.store(true, Ordering::Release);
}

/// Drop a stale request; the caller is about to run selection anyway.
#[inline]
pub fn clear_reschedule() {
    RESCHEDULE.store(false, Ordering::Release);
}

pub fn take_reschedule() -> bool {
    critical_section::with(|_| {
        let requested = RESCHEDULE.load(Ordering::Acquire);
        if requested {
            RESCHEDULE.store(false, Ordering::Relaxed);
        }
        requested
    })
}

/// Monotonic kernel time source fed from a periodic interrupt.
pub struct SysTick {
    // ticks raised by the ISR and not yet handed to the scheduler
    pending: Mutex<Cell<u32>>,
    uptime: Mutex<Cell<u32>>,
}

impl SysTick {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
            uptime: Mutex::new(Cell::new(0)),
        }
    }

    /// Called from the tick interrupt.
    #[inline]
    pub fn signal_tick(&self) {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            pending.set(pending.get().saturating_add(1));
            let uptime = self.uptime.borrow(cs);
            uptime.set(uptime.get().wrapping_add(1));
        });
    }

    /// Drain the ticks accumulated since the last call.
    pub fn take_pending(&self) -> u32 {
        critical_section::with(|cs| self.pending.borrow(cs).replace(0))
    }

    pub fn has_pending(&self) -> bool {
        critical_section::with(|cs| self.pending.borrow(cs).get() != 0)
    }

    pub fn uptime_ticks(&self) -> u32 {
        critical_section::with(|cs| self.uptime.borrow(cs).get())
    }
}

impl Default for SysTick {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
pub fn wait_for_interrupt() {
    #[cfg(target_arch = "riscv32")]
    unsafe {
        core::arch::asm!("wfi", options(nomem, nostack));
    }

    #[cfg(not(target_arch = "riscv32"))]
    core::hint::spin_loop();
}
