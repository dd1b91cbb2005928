// Startup and the safe-halt path
//
// boot: spawn every task bound to its signal, arm the interrupt sources,
// hand the CPU to the scheduler. Any failure before that point is logged
// once and the CPU parks in halt(); outputs simply stop responding.

use log::{error, info};

use super::scheduler::{KernelError, Scheduler, TaskSpec};
use super::task::Task;
use super::wake::{self, SysTick};

/// Board side of bring-up: enable the interrupts the kernel consumes.
///
/// Called once, after every task exists, so no post can race task creation.
pub trait EventSources {
    fn arm(&mut self);
}

/// Build the scheduler and arm the event sources.
pub fn prepare<'a, T, const N: usize, B>(
    specs: impl IntoIterator<Item = TaskSpec<'a, T>>,
    board: &mut B,
) -> Result<Scheduler<'a, T, N>, KernelError>
where
    T: Task,
    B: EventSources,
{
    let mut sched = Scheduler::new();
    for spec in specs {
        sched.spawn(spec)?;
    }
    if sched.is_empty() {
        return Err(KernelError::NoTasks);
    }

    board.arm();
    info!("supervisor: {} tasks ready, event sources armed", sched.len());
    Ok(sched)
}

/// Bring the system up and run it. Never returns.
pub fn boot<'a, T, const N: usize, B>(
    specs: impl IntoIterator<Item = TaskSpec<'a, T>>,
    board: &mut B,
    clock: &SysTick,
) -> !
where
    T: Task,
    B: EventSources,
{
    let err = match prepare::<T, N, B>(specs, board) {
        Ok(mut sched) => match sched.start(clock) {
            Ok(never) => match never {},
            Err(err) => err,
        },
        Err(err) => err,
    };
    halt(err)
}

/// Park the CPU for good after a fatal startup error.
pub fn halt(err: KernelError) -> ! {
    error!("supervisor: {}, halting", err);
    loop {
        wake::wait_for_interrupt();
    }
}
