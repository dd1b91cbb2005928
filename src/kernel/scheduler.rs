// Fixed-priority preemptive scheduler over a static task arena
// NOTE: No dynamic allocation; tasks live in a const-sized array and are
// never removed, so a TaskId is both a stable handle and the creation order.
//
// Selection: highest priority Ready task wins, earliest created on ties.
// A Running task is only displaced by a strictly higher priority one.
// Signals are folded into Blocked tasks lazily at each selection pass;
// the pending flag is sticky, so nothing posted in between is lost.

use core::convert::Infallible;
use core::fmt;

use log::{debug, info, trace};

use super::signal::Signal;
use super::task::{Next, Priority, Task, TaskId, TaskState, Timeout, WaitResult, Wake};
use super::wake::{self, SysTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelError {
    /// No free slot left in the task arena.
    ResourceExhausted,
    /// The signal already wakes another task.
    SignalInUse,
    /// Started with an empty task set.
    NoTasks,
}

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelError::ResourceExhausted => write!(f, "task arena exhausted"),
            KernelError::SignalInUse => write!(f, "signal already bound to a task"),
            KernelError::NoTasks => write!(f, "no tasks to schedule"),
        }
    }
}

/// Everything needed to create one task.
pub struct TaskSpec<'a, T> {
    pub name: &'static str,
    pub priority: Priority,
    pub signal: Option<&'a Signal>,
    pub task: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskInfo {
    pub name: &'static str,
    pub priority: Priority,
    pub state: TaskState,
    pub activations: u32,
}

struct TaskControl<'a, T> {
    task: T,
    name: &'static str,
    priority: Priority,
    state: TaskState,
    signal: Option<&'a Signal>,
    // ticks left while Sleeping, or before a timed wait gives up
    countdown: Option<u32>,
    // delivered on the next step
    wake: Wake,
    activations: u32,
}

impl<T> TaskControl<'_, T> {
    fn make_ready(&mut self, wake: Wake) {
        self.state = TaskState::Ready;
        self.countdown = None;
        self.wake = wake;
    }
}

pub struct Scheduler<'a, T, const N: usize> {
    tasks: [Option<TaskControl<'a, T>>; N],
    len: usize,
    running: Option<TaskId>,
    now: u32,
}

impl<'a, T: Task, const N: usize> Scheduler<'a, T, N> {
    pub const fn new() -> Self {
        Self {
            tasks: [const { None }; N],
            len: 0,
            running: None,
            now: 0,
        }
    }

    /// Add a task in the Ready state. Creation order breaks priority ties.
    pub fn spawn(&mut self, spec: TaskSpec<'a, T>) -> Result<TaskId, KernelError> {
        if self.len >= N {
            return Err(KernelError::ResourceExhausted);
        }
        if let Some(signal) = spec.signal {
            if !signal.bind() {
                return Err(KernelError::SignalInUse);
            }
        }

        let id = TaskId(self.len);
        self.tasks[id.0] = Some(TaskControl {
            task: spec.task,
            name: spec.name,
            priority: spec.priority,
            state: TaskState::Ready,
            signal: spec.signal,
            countdown: None,
            wake: Wake::Start,
            activations: 0,
        });
        self.len += 1;

        debug!("sched: spawned {} {} at {}", spec.name, id, spec.priority);
        Ok(id)
    }

    /// Run the kernel loop forever. Only returns if there is nothing to run.
    pub fn start(&mut self, clock: &SysTick) -> Result<Infallible, KernelError> {
        if self.len == 0 {
            return Err(KernelError::NoTasks);
        }

        info!("sched: starting {} tasks", self.len);
        loop {
            self.run_once(clock);
        }
    }

    /// One pass of the kernel loop: drain ticks, select, dispatch. Idles the
    /// CPU until the next interrupt if nothing is Ready.
    pub fn run_once(&mut self, clock: &SysTick) -> Option<TaskId> {
        wake::clear_reschedule();
        for _ in 0..clock.take_pending() {
            self.tick();
        }
        self.schedule();

        if let Some(id) = self.dispatch() {
            return Some(id);
        }

        // A post racing this check is picked up on the next systick at worst.
        if !wake::take_reschedule() && !clock.has_pending() {
            wake::wait_for_interrupt();
        }
        None
    }

    /// Advance time one tick, wake expired sleepers and timed waits, and
    /// re-run selection.
    pub fn tick(&mut self) {
        self.now = self.now.wrapping_add(1);
        // a post landing on the same tick as a timeout wins
        self.collect_signals();

        for slot in self.tasks.iter_mut().flatten() {
            let Some(left) = slot.countdown else {
                continue;
            };
            let left = left.saturating_sub(1);
            if left > 0 {
                slot.countdown = Some(left);
                continue;
            }
            match slot.state {
                TaskState::Sleeping => slot.make_ready(Wake::Slept),
                TaskState::Blocked => slot.make_ready(Wake::Wait(WaitResult::TimedOut)),
                _ => slot.countdown = None,
            }
        }

        self.select();
    }

    /// Move Blocked tasks with a pending signal to Ready, then select.
    pub fn schedule(&mut self) -> Option<TaskId> {
        self.collect_signals();
        self.select();
        self.running
    }

    /// Step the Running task once and apply the suspension it returns.
    pub fn dispatch(&mut self) -> Option<TaskId> {
        let id = self.running?;
        let slot = self.tasks[id.0].as_mut()?;

        slot.activations = slot.activations.wrapping_add(1);
        let wake = slot.wake;
        trace!("sched: step {} ({:?})", slot.name, wake);

        match slot.task.step(wake) {
            Next::Wait(timeout) => {
                self.wait(id, timeout);
            }
            Next::YieldFor(ticks) => self.yield_for(id, ticks),
        }
        Some(id)
    }

    /// Consume the task's signal if pending, otherwise block it.
    ///
    /// Returns the result right away when the wait does not block (signal
    /// pending, or a zero timeout); that result is also queued as the task's
    /// next wake reason. `None` means the task is now Blocked.
    pub fn wait(&mut self, id: TaskId, timeout: Timeout) -> Option<WaitResult> {
        let slot = self.tasks.get_mut(id.0)?.as_mut()?;

        // pending check and the switch to Blocked must not be split by a post
        let result = critical_section::with(|cs| {
            if slot.signal.is_some_and(|signal| signal.take_in(cs)) {
                return Some(WaitResult::Signaled);
            }
            match timeout {
                Timeout::Ticks(0) => Some(WaitResult::TimedOut),
                Timeout::Ticks(ticks) => {
                    slot.state = TaskState::Blocked;
                    slot.countdown = Some(ticks);
                    None
                }
                Timeout::Forever => {
                    slot.state = TaskState::Blocked;
                    slot.countdown = None;
                    None
                }
            }
        });

        match result {
            Some(result) => slot.wake = Wake::Wait(result),
            None => {
                if self.running == Some(id) {
                    self.running = None;
                }
            }
        }

        self.select();
        result
    }

    /// Put the task to sleep for `ticks` ticks and re-run selection. Zero
    /// is a plain yield.
    pub fn yield_for(&mut self, id: TaskId, ticks: u32) {
        let Some(slot) = self.tasks.get_mut(id.0).and_then(Option::as_mut) else {
            return;
        };

        if ticks == 0 {
            slot.make_ready(Wake::Slept);
        } else {
            slot.state = TaskState::Sleeping;
            slot.countdown = Some(ticks);
        }
        if self.running == Some(id) {
            self.running = None;
        }

        self.select();
    }

    fn collect_signals(&mut self) {
        critical_section::with(|cs| {
            for slot in self.tasks.iter_mut().flatten() {
                if slot.state != TaskState::Blocked {
                    continue;
                }
                if slot.signal.is_some_and(|signal| signal.take_in(cs)) {
                    slot.make_ready(Wake::Wait(WaitResult::Signaled));
                }
            }
        });
    }

    fn select(&mut self) {
        let Some(best) = self.best_ready() else {
            return;
        };

        if let Some(current) = self.running {
            if self.priority(current) >= self.priority(best) {
                return;
            }
            if let Some(slot) = self.tasks[current.0].as_mut() {
                slot.state = TaskState::Ready;
                debug!("sched: {} preempted", slot.name);
            }
        }

        if let Some(slot) = self.tasks[best.0].as_mut() {
            slot.state = TaskState::Running;
        }
        self.running = Some(best);
    }

    // earliest created wins ties because only a strictly higher priority
    // replaces the current pick
    fn best_ready(&self) -> Option<TaskId> {
        let mut best: Option<(TaskId, Priority)> = None;
        for (idx, slot) in self.tasks.iter().enumerate() {
            let Some(slot) = slot else {
                continue;
            };
            if slot.state != TaskState::Ready {
                continue;
            }
            if best.is_none_or(|(_, priority)| slot.priority > priority) {
                best = Some((TaskId(idx), slot.priority));
            }
        }
        best.map(|(id, _)| id)
    }

    fn priority(&self, id: TaskId) -> Priority {
        self.tasks[id.0]
            .as_ref()
            .map_or(Priority::IDLE, |slot| slot.priority)
    }

    pub fn running(&self) -> Option<TaskId> {
        self.running
    }

    pub fn state(&self, id: TaskId) -> Option<TaskState> {
        self.slot(id).map(|slot| slot.state)
    }

    pub fn info(&self, id: TaskId) -> Option<TaskInfo> {
        self.slot(id).map(|slot| TaskInfo {
            name: slot.name,
            priority: slot.priority,
            state: slot.state,
            activations: slot.activations,
        })
    }

    pub fn task(&self, id: TaskId) -> Option<&T> {
        self.slot(id).map(|slot| &slot.task)
    }

    /// Ticks elapsed since the scheduler was created.
    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    fn slot(&self, id: TaskId) -> Option<&TaskControl<'a, T>> {
        self.tasks.get(id.0).and_then(Option::as_ref)
    }
}

impl<T: Task, const N: usize> Default for Scheduler<'_, T, N> {
    fn default() -> Self {
        Self::new()
    }
}
