// Deferred output tasks
//
// Each task is bound to one Signal and loops forever:
//
//   wait(Forever) -> toggle output -> yield_for(settle) -> wait ...
//
// The settle sleep coalesces bursts: posts that arrive while the task
// sleeps collapse into the signal's pending flag, so the output toggles
// at most once per settle window no matter how often the source fires.

use embedded_hal::digital::StatefulOutputPin;
use log::debug;

use super::task::{Next, Task, Timeout, WaitResult, Wake};

pub struct DeferredTask<P> {
    name: &'static str,
    output: P,
    settle_ticks: u32,
    wait: Timeout,
    toggles: u32,
}

impl<P: StatefulOutputPin> DeferredTask<P> {
    pub fn new(name: &'static str, output: P, settle_ticks: u32) -> Self {
        Self {
            name,
            output,
            settle_ticks,
            wait: Timeout::Forever,
            toggles: 0,
        }
    }

    /// Give up waiting after `ticks` instead of blocking forever. A timed out
    /// wait skips the toggle but still sleeps.
    pub fn with_wait_timeout(mut self, ticks: u32) -> Self {
        self.wait = Timeout::Ticks(ticks);
        self
    }

    pub fn toggles(&self) -> u32 {
        self.toggles
    }

    pub fn output(&self) -> &P {
        &self.output
    }
}

impl<P: StatefulOutputPin> Task for DeferredTask<P> {
    fn step(&mut self, wake: Wake) -> Next {
        match wake {
            Wake::Start | Wake::Slept => Next::Wait(self.wait),
            Wake::Wait(WaitResult::Signaled) => {
                // driver result is deliberately not checked
                let _ = self.output.toggle();
                self.toggles = self.toggles.wrapping_add(1);
                Next::YieldFor(self.settle_ticks)
            }
            Wake::Wait(WaitResult::TimedOut) => {
                debug!("{}: wait timed out", self.name);
                Next::YieldFor(self.settle_ticks)
            }
        }
    }
}
