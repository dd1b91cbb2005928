// Priority scheduler and interrupt-to-task signaling
// Single core. Tasks are bounded state machines stepped by the scheduler;
// ISRs only post signals and count ticks. WFI idles the CPU when nothing
// is Ready.
//
// supervisor: bring-up and the safe-halt loop. The firmware binary calls
// supervisor::boot and never gets control back.

pub mod irq;
pub mod scheduler;
pub mod signal;
pub mod supervisor;
pub mod task;
pub mod tasks;
pub mod wake;

pub use irq::{ButtonIrq, Dispatch, PortCause, TimerCause, TimerIrq};
pub use scheduler::{KernelError, Scheduler, TaskInfo, TaskSpec};
pub use signal::{Poster, Signal};
pub use supervisor::{EventSources, boot, halt};
pub use task::{Next, Priority, Task, TaskId, TaskState, Timeout, WaitResult, Wake};
pub use tasks::DeferredTask;
pub use wake::SysTick;
