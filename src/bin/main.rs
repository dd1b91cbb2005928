// blinky-os entry point
//
// Boot sequence: logger -> hardware -> tasks -> arm interrupts -> scheduler
//
// Two interrupt sources, two tasks. The button edge posts BUTTON_SIGNAL,
// the event timer overflow posts TIMER_SIGNAL; each signal wakes one
// DeferredTask that toggles its LED and then sleeps SETTLE_TICKS. ISRs do
// nothing beyond acknowledging the hardware and posting.

#![no_std]
#![no_main]

use esp_backtrace as _;
use esp_hal::clock::CpuClock;
use log::info;

use blinky_os::board::{self, Board, Handlers, pins};
use blinky_os::config::{
    BUTTON_TASK_PRIORITY, MAX_TASKS, SETTLE_TICKS, TICK_HZ, TIMER_TASK_PRIORITY,
};
use blinky_os::kernel::{
    self, ButtonIrq, DeferredTask, PortCause, Priority, Signal, SysTick, TaskSpec, TimerIrq,
};

esp_bootloader_esp_idf::esp_app_desc!();

static SYSTICK: SysTick = SysTick::new();

static BUTTON_SIGNAL: Signal = Signal::new();
static TIMER_SIGNAL: Signal = Signal::new();

static BUTTON_IRQ: ButtonIrq<'static> =
    ButtonIrq::new(PortCause::line(pins::BUTTON_LINE), BUTTON_SIGNAL.poster());
static TIMER_IRQ: TimerIrq<'static> = TimerIrq::new(TIMER_SIGNAL.poster());

// systick outranks the event sources so time keeps moving under bursts
#[esp_hal::handler(priority = esp_hal::interrupt::Priority::Priority2)]
fn systick_handler() {
    board::ack_systick();
    SYSTICK.signal_tick();
}

#[esp_hal::handler(priority = esp_hal::interrupt::Priority::Priority1)]
fn port_handler() {
    let _ = BUTTON_IRQ.handle(PortCause::from_flags(board::take_port_flags()));
}

#[esp_hal::handler(priority = esp_hal::interrupt::Priority::Priority1)]
fn overflow_handler() {
    let _ = TIMER_IRQ.handle(board::take_timer_cause());
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    info!("booting...");

    let Board { leds, mut events } = Board::init(
        peripherals,
        Handlers {
            port: port_handler,
            systick: systick_handler,
            overflow: overflow_handler,
        },
    );
    info!("hardware initialized, tick {} Hz.", TICK_HZ);

    let specs = [
        TaskSpec {
            name: "button",
            priority: Priority(BUTTON_TASK_PRIORITY),
            signal: Some(&BUTTON_SIGNAL),
            task: DeferredTask::new("button", leds.button, SETTLE_TICKS),
        },
        TaskSpec {
            name: "timer",
            priority: Priority(TIMER_TASK_PRIORITY),
            signal: Some(&TIMER_SIGNAL),
            task: DeferredTask::new("timer", leds.timer, SETTLE_TICKS),
        },
    ];

    kernel::boot::<_, MAX_TASKS, _>(specs, &mut events, &SYSTICK)
}
