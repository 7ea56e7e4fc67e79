//! Hardware Abstraction Layer for EngineTone.
//!
//! Thin wrappers around ESP-IDF peripherals (GPTimer, one-shot DAC,
//! one-shot ADC). Business logic stays in the core modules, HAL is just
//! I/O.

pub mod adc;
pub mod dac;

pub use adc::ThrottleAdc;
pub use dac::EspToneClock;
