// Task model: identities, priorities, states and the step contract
//
// Tasks are state machines, not stacks. The scheduler calls `step` with the
// reason the task was woken; the task does a bounded amount of work and
// returns where it wants to suspend next. A task only ever suspends at a
// signal wait or a timed sleep.

use core::fmt;

/// Index into the scheduler arena. Also the creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub(crate) usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Static task priority; higher value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub u8);

impl Priority {
    pub const IDLE: Priority = Priority(0);
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Ready,
    Running,
    Blocked,
    Sleeping,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Ready => write!(f, "Ready"),
            TaskState::Running => write!(f, "Running"),
            TaskState::Blocked => write!(f, "Blocked"),
            TaskState::Sleeping => write!(f, "Sleeping"),
        }
    }
}

/// How long a wait may block, in kernel ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timeout {
    Forever,
    Ticks(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitResult {
    Signaled,
    TimedOut,
}

/// Why a task is being stepped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    /// First dispatch after creation.
    Start,
    /// A wait finished, with or without a post.
    Wait(WaitResult),
    /// A `yield_for` sleep ran out.
    Slept,
}

/// Where a task suspends after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Wait(Timeout),
    YieldFor(u32),
}

pub trait Task {
    /// One bounded, non-blocking slice of work.
    fn step(&mut self, wake: Wake) -> Next;
}
