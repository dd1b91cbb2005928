//! GPIO |     Function      |      Notes
//! -----+-------------------+----------------------------------
//!  4   | LED - button task | Push-pull, toggled on every button wakeup
//!  5   | LED - timer task  | Push-pull, toggled on every overflow wakeup
//!  9   | Digital - Button  | BOOT button, active LOW, internal pullup

// ----- Outputs -----
pub const LED_BUTTON: u8 = 4;
pub const LED_TIMER: u8 = 5;

// ----- Button -----
pub const BUTTON: u8 = 9;

// Line the button reports on in the port vector. GPIO numbers above 7 do
// not fit the 8-line port model, so the button is remapped here.
pub const BUTTON_LINE: u8 = 1;
