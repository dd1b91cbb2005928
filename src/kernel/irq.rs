// Interrupt demultiplexing
//
// Each hardware vector reports one cause at a time as an even offset into
// a jump table (0 = nothing pending). Causes are closed enums; a handler
// posts its signal for the single cause it owns and ignores the rest.
// Handlers only hold a `Poster`, so from interrupt context the one
// reachable kernel operation is `post`.

use core::sync::atomic::{AtomicU32, Ordering};

use super::signal::Poster;

/// Port interrupt vector causes, one per line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortCause {
    None,
    Pin0,
    Pin1,
    Pin2,
    Pin3,
    Pin4,
    Pin5,
    Pin6,
    Pin7,
}

impl PortCause {
    const LINES: [PortCause; 8] = [
        PortCause::Pin0,
        PortCause::Pin1,
        PortCause::Pin2,
        PortCause::Pin3,
        PortCause::Pin4,
        PortCause::Pin5,
        PortCause::Pin6,
        PortCause::Pin7,
    ];

    /// Decode a vector register value (`0x00` none, `0x02` line 0 ... `0x10`
    /// line 7). Anything else reads as `None`.
    pub const fn from_vector(vector: u16) -> Self {
        match vector {
            0x02..=0x10 if vector % 2 == 0 => Self::LINES[(vector as usize - 2) / 2],
            _ => PortCause::None,
        }
    }

    /// Lowest pending line in a flag mask wins, like the vector register
    /// prioritises it.
    pub const fn from_flags(flags: u8) -> Self {
        if flags == 0 {
            return PortCause::None;
        }
        Self::LINES[flags.trailing_zeros() as usize]
    }

    pub const fn line(line: u8) -> Self {
        if line < 8 {
            Self::LINES[line as usize]
        } else {
            PortCause::None
        }
    }
}

/// Timer vector causes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCause {
    None,
    Compare1,
    Compare2,
    Compare3,
    Compare4,
    Compare5,
    Compare6,
    Overflow,
}

impl TimerCause {
    /// Decode `0x00` none, `0x02..=0x0C` compare channels, `0x0E` overflow.
    pub const fn from_vector(vector: u16) -> Self {
        match vector {
            0x02 => TimerCause::Compare1,
            0x04 => TimerCause::Compare2,
            0x06 => TimerCause::Compare3,
            0x08 => TimerCause::Compare4,
            0x0A => TimerCause::Compare5,
            0x0C => TimerCause::Compare6,
            0x0E => TimerCause::Overflow,
            _ => TimerCause::None,
        }
    }

    /// Cause for a timer that only reports its alarm status bit.
    pub const fn from_alarm(set: bool) -> Self {
        if set { TimerCause::Overflow } else { TimerCause::None }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Posted,
    Ignored,
}

/// Posts on one port line, ignores every other cause.
pub struct ButtonIrq<'a> {
    line: PortCause,
    poster: Poster<'a>,
    spurious: AtomicU32,
}

impl<'a> ButtonIrq<'a> {
    pub const fn new(line: PortCause, poster: Poster<'a>) -> Self {
        Self {
            line,
            poster,
            spurious: AtomicU32::new(0),
        }
    }

    pub fn handle(&self, cause: PortCause) -> Dispatch {
        if cause != PortCause::None && cause == self.line {
            self.poster.post();
            return Dispatch::Posted;
        }
        count(&self.spurious);
        Dispatch::Ignored
    }

    pub fn spurious(&self) -> u32 {
        self.spurious.load(Ordering::Relaxed)
    }
}

/// Posts on timer overflow, ignores compare channels.
pub struct TimerIrq<'a> {
    poster: Poster<'a>,
    spurious: AtomicU32,
}

impl<'a> TimerIrq<'a> {
    pub const fn new(poster: Poster<'a>) -> Self {
        Self {
            poster,
            spurious: AtomicU32::new(0),
        }
    }

    pub fn handle(&self, cause: TimerCause) -> Dispatch {
        match cause {
            TimerCause::Overflow => {
                self.poster.post();
                Dispatch::Posted
            }
            _ => {
                count(&self.spurious);
                Dispatch::Ignored
            }
        }
    }

    pub fn spurious(&self) -> u32 {
        self.spurious.load(Ordering::Relaxed)
    }
}

// only ever written from the one ISR that owns the counter, so a plain
// load/store pair is enough (no atomic RMW on riscv32imc)
#[inline]
fn count(counter: &AtomicU32) {
    let n = counter.load(Ordering::Relaxed);
    counter.store(n.wrapping_add(1), Ordering::Relaxed);
}
