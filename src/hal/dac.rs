//! GPTimer sample clock driving the on-chip 8-bit DAC.
//!
//! The timer runs at 1 MHz resolution with an auto-reloading alarm, so the
//! alarm count equals the sample period in microseconds and re-tuning the
//! rate is a single `gptimer_set_alarm_action` call from the effect
//! context while the timer keeps running.

use core::ffi::c_void;
use core::ptr;

use esp_idf_svc::sys::{self, esp, EspError};

use crate::audio::ToneClock;

/// Alarm callback type passed to [`EspToneClock::init`]. Runs in ISR
/// context: bounded time, no allocation, no logging.
pub type TickFn = fn();

/// GPTimer + DAC pair implementing [`ToneClock`].
pub struct EspToneClock {
    timer: sys::gptimer_handle_t,
    dac: sys::dac_oneshot_handle_t,
}

// SAFETY: the handles are only used through the driver API, which the
// ESP-IDF gptimer/dac drivers document as safe to call from a task while
// the alarm ISR runs. The tick callback itself never touches the handles.
unsafe impl Sync for EspToneClock {}
unsafe impl Send for EspToneClock {}

/// Trampoline from the gptimer alarm ISR into the registered [`TickFn`].
unsafe extern "C" fn on_alarm(
    _timer: sys::gptimer_handle_t,
    _event: *const sys::gptimer_alarm_event_data_t,
    user_ctx: *mut c_void,
) -> bool {
    let tick: TickFn = core::mem::transmute(user_ctx);
    tick();
    false
}

impl EspToneClock {
    /// Claim the DAC channel and a general-purpose timer, and register
    /// `tick` as the alarm callback. The timer is created disabled; the
    /// first [`ToneClock::start`] arms it.
    pub fn init(channel: sys::dac_channel_t, tick: TickFn) -> Result<Self, EspError> {
        let dac_config = sys::dac_oneshot_config_t { chan_id: channel };
        let mut dac: sys::dac_oneshot_handle_t = ptr::null_mut();
        esp!(unsafe { sys::dac_oneshot_new_channel(&dac_config, &mut dac) })?;

        let timer_config = sys::gptimer_config_t {
            clk_src: sys::gptimer_clock_source_t_GPTIMER_CLK_SRC_DEFAULT,
            direction: sys::gptimer_count_direction_t_GPTIMER_COUNT_UP,
            resolution_hz: 1_000_000,
            ..Default::default()
        };
        let mut timer: sys::gptimer_handle_t = ptr::null_mut();
        esp!(unsafe { sys::gptimer_new_timer(&timer_config, &mut timer) })?;

        let callbacks = sys::gptimer_event_callbacks_t {
            on_alarm: Some(on_alarm),
        };
        esp!(unsafe {
            sys::gptimer_register_event_callbacks(timer, &callbacks, tick as *mut c_void)
        })?;

        Ok(Self { timer, dac })
    }

    fn program_alarm(&self, period_us: u32) {
        let mut alarm = sys::gptimer_alarm_config_t {
            alarm_count: period_us as u64,
            reload_count: 0,
            flags: Default::default(),
        };
        alarm.flags.set_auto_reload_on_alarm(1);
        // Reprogramming a running timer is supported by the driver; a
        // failure here leaves the previous rate in effect.
        unsafe {
            sys::gptimer_set_alarm_action(self.timer, &alarm);
        }
    }
}

impl ToneClock for EspToneClock {
    fn start(&self, period_us: u32) {
        self.program_alarm(period_us);
        unsafe {
            sys::gptimer_enable(self.timer);
            sys::gptimer_start(self.timer);
        }
    }

    fn set_period_us(&self, period_us: u32) {
        self.program_alarm(period_us);
    }

    fn pause(&self) {
        unsafe {
            sys::gptimer_stop(self.timer);
        }
    }

    fn resume(&self) {
        unsafe {
            sys::gptimer_start(self.timer);
        }
    }

    fn write(&self, sample: u8) {
        unsafe {
            sys::dac_oneshot_output_voltage(self.dac, sample);
        }
    }
}
