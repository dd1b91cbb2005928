//! ESP32-C3 Board Support Package (BSP)
//!
//! Maps the physical hardware to the two things the kernel needs: the
//! output pins its tasks toggle, and the interrupt sources that post its
//! signals. Nothing outside this module knows GPIO numbers or timer groups.
//!
//! Interrupt sources:
//!   GPIO   - button falling edge, demultiplexed into a port line mask
//!   TIMG0  - kernel systick, 1 kHz
//!   TIMG1  - free-running event timer, overflow only

pub mod pins;

use core::cell::RefCell;

use critical_section::Mutex;
use esp_hal::{
    Blocking,
    gpio::{Event, Input, InputConfig, Io, Level, Output, OutputConfig, Pull},
    interrupt::InterruptHandler,
    peripherals::Peripherals,
    time::Duration,
    timer::{
        PeriodicTimer, Timer as _,
        timg::{Timer as TimgTimer, TimerGroup},
    },
};
use log::{info, warn};

use crate::config::{OVERFLOW_PERIOD_MS, TICK_MS};
use crate::kernel::{EventSources, TimerCause};

pub type Led = Output<'static>;

// Hardware the ISRs need to acknowledge, parked here once armed
static BUTTON: Mutex<RefCell<Option<Input<'static>>>> = Mutex::new(RefCell::new(None));
static SYSTICK: Mutex<RefCell<Option<PeriodicTimer<'static, Blocking>>>> =
    Mutex::new(RefCell::new(None));
static OVERFLOW: Mutex<RefCell<Option<TimgTimer<'static>>>> = Mutex::new(RefCell::new(None));

/// Output pins, one per deferred task.
pub struct Leds {
    pub button: Led,
    pub timer: Led,
}

/// ISR entry points installed while arming.
pub struct Handlers {
    pub port: InterruptHandler,
    pub systick: InterruptHandler,
    pub overflow: InterruptHandler,
}

struct Sources {
    button: Input<'static>,
    systick: PeriodicTimer<'static, Blocking>,
    // driven raw so the ISR can read the alarm status
    overflow: TimgTimer<'static>,
}

/// Configured but not yet listening interrupt sources.
pub struct EventHw {
    io: Io<'static>,
    handlers: Handlers,
    sources: Option<Sources>,
}

pub struct Board {
    pub leds: Leds,
    pub events: EventHw,
}

impl Board {
    pub fn init(p: Peripherals, handlers: Handlers) -> Self {
        let leds = Leds {
            button: Output::new(p.GPIO4, Level::Low, OutputConfig::default()),
            timer: Output::new(p.GPIO5, Level::Low, OutputConfig::default()),
        };

        let button = Input::new(p.GPIO9, InputConfig::default().with_pull(Pull::Up));

        let timg0 = TimerGroup::new(p.TIMG0);
        let timg1 = TimerGroup::new(p.TIMG1);

        let events = EventHw {
            io: Io::new(p.IO_MUX),
            handlers,
            sources: Some(Sources {
                button,
                systick: PeriodicTimer::new(timg0.timer0),
                overflow: timg1.timer0,
            }),
        };

        Board { leds, events }
    }
}

impl EventSources for EventHw {
    fn arm(&mut self) {
        let Some(mut sources) = self.sources.take() else {
            warn!("board: event sources already armed");
            return;
        };

        self.io.set_interrupt_handler(self.handlers.port);
        sources.systick.set_interrupt_handler(self.handlers.systick);
        sources.overflow.set_interrupt_handler(self.handlers.overflow);

        critical_section::with(|cs| {
            sources.button.clear_interrupt();
            sources.button.listen(Event::FallingEdge);

            if sources.systick.start(Duration::from_millis(TICK_MS)).is_err() {
                warn!("board: systick period rejected");
            }
            sources.systick.listen();

            let overflow = &sources.overflow;
            if overflow
                .load_value(Duration::from_millis(OVERFLOW_PERIOD_MS))
                .is_err()
            {
                warn!("board: overflow period rejected");
            }
            overflow.enable_auto_reload(true);
            overflow.clear_interrupt();
            overflow.enable_interrupt(true);
            overflow.start();

            BUTTON.borrow_ref_mut(cs).replace(sources.button);
            SYSTICK.borrow_ref_mut(cs).replace(sources.systick);
            OVERFLOW.borrow_ref_mut(cs).replace(sources.overflow);
        });

        info!(
            "board: button on GPIO{}, outputs on GPIO{}/GPIO{}",
            pins::BUTTON,
            pins::LED_BUTTON,
            pins::LED_TIMER
        );
    }
}

/// Port line mask of pending GPIO interrupts. Clears what it reports.
pub fn take_port_flags() -> u8 {
    critical_section::with(|cs| {
        let mut button = BUTTON.borrow_ref_mut(cs);
        match button.as_mut() {
            Some(button) if button.is_interrupt_set() => {
                button.clear_interrupt();
                1 << pins::BUTTON_LINE
            }
            _ => 0,
        }
    })
}

pub fn ack_systick() {
    critical_section::with(|cs| {
        if let Some(timer) = SYSTICK.borrow_ref_mut(cs).as_mut() {
            timer.clear_interrupt();
        }
    });
}

/// The event timer only raises its alarm, which this board treats as the
/// overflow cause. An entry with the alarm clear decodes as no cause.
pub fn take_timer_cause() -> TimerCause {
    critical_section::with(|cs| {
        let overflow = OVERFLOW.borrow_ref(cs);
        let alarm = overflow.as_ref().is_some_and(|timer| {
            let set = timer.is_interrupt_set();
            if set {
                timer.clear_interrupt();
            }
            set
        });
        TimerCause::from_alarm(alarm)
    })
}
