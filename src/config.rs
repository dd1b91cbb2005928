// Compile-time configuration
//
// One kernel tick is 1 ms. The overflow period stands in for a 16-bit
// timer free-running off a slow clock: it fires about twice a second.

/// Kernel tick rate.
pub const TICK_HZ: u32 = 1000;

/// Kernel tick period in milliseconds.
pub const TICK_MS: u64 = 1000 / TICK_HZ as u64;

/// Sleep after every toggle; posts inside this window collapse into one.
pub const SETTLE_TICKS: u32 = 100;

/// Overflow period of the free-running event timer.
pub const OVERFLOW_PERIOD_MS: u64 = 500;

/// Button-driven toggle task.
pub const BUTTON_TASK_PRIORITY: u8 = 1;

/// Timer-driven toggle task; outranks the button task.
pub const TIMER_TASK_PRIORITY: u8 = 2;

/// Task arena capacity. The firmware runs exactly two tasks.
pub const MAX_TASKS: usize = 2;
