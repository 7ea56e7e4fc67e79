//! EngineTone firmware entry point.
//!
//! Task layout:
//! - timer ISR: replay one PCM sample through the DAC (Core 1 alarm)
//! - control task, Core 0: throttle sampling every 30 ms
//! - effect task, Core 1: rev/shift state machine every tick
//! - main task: drains the log rings to the console

#[cfg(target_os = "espidf")]
mod firmware {
    use core::ffi::c_void;
    use core::ptr;

    use esp_idf_svc::sys;

    use rust_engine_tone::effects::adc_to_rate;
    use rust_engine_tone::hal::{EspToneClock, ThrottleAdc};
    use rust_engine_tone::logging::LogEntry;
    use rust_engine_tone::{
        rt_debug, rt_error, rt_warn, EngineConfig, EngineEffects, EngineSound, ThrottleFilter,
        BG_LOG_STREAM, CTRL_LOG_STREAM,
    };

    /// Placeholder single-cycle loop (500 Hz triangle at the idle rate)
    /// played until a real recording is loaded over the command surface.
    const IDLE_LOOP: [u8; 16] = [
        128, 160, 191, 223, 255, 223, 191, 160, 128, 96, 64, 32, 0, 32, 64, 96,
    ];

    // Written once in `run` before the ISR and the tasks exist; read-only
    // afterwards.
    static mut ENGINE: Option<EngineSound<EspToneClock>> = None;

    #[allow(static_mut_refs)]
    fn engine() -> &'static EngineSound<EspToneClock> {
        // SAFETY: initialized in `run` before any task can call this
        unsafe { ENGINE.as_ref().expect("engine not initialized") }
    }

    /// Timer alarm callback. ISR context: one sample, nothing else.
    #[allow(static_mut_refs)]
    fn on_sample_tick() {
        // SAFETY: read-only access, initialization ordered before `begin`
        if let Some(engine) = unsafe { ENGINE.as_ref() } {
            engine.player().isr_tick();
        }
    }

    fn timestamp_us() -> i64 {
        // SAFETY: esp_timer_get_time is always safe to call
        unsafe { sys::esp_timer_get_time() }
    }

    fn delay_ms(ms: u32) {
        let ticks = (ms * sys::configTICK_RATE_HZ / 1000).max(1);
        // SAFETY: plain FreeRTOS delay
        unsafe { sys::vTaskDelay(ticks) }
    }

    /// Throttle control task, Core 0.
    extern "C" fn control_task(_arg: *mut c_void) {
        let config = EngineConfig::default();

        let adc = match ThrottleAdc::init(sys::adc_channel_t_ADC_CHANNEL_6) {
            Ok(adc) => adc,
            Err(err) => {
                rt_error!(
                    CTRL_LOG_STREAM,
                    timestamp_us(),
                    "throttle adc init failed: {}",
                    err
                );
                // SAFETY: delete the calling task instead of returning
                unsafe { sys::vTaskDelete(ptr::null_mut()) };
                return;
            }
        };

        let mut filter = ThrottleFilter::new(&config);
        let mut last_rate = 0u32;

        loop {
            let now = timestamp_us();
            match adc.read() {
                Ok(raw) => {
                    let filtered = filter.feed(raw);
                    let rate = adc_to_rate(&config, filtered);
                    engine().notify_throttle(rate);
                    if rate != last_rate {
                        rt_debug!(CTRL_LOG_STREAM, now, "throttle {} -> {} Hz", filtered, rate);
                        last_rate = rate;
                    }
                }
                Err(err) => {
                    rt_warn!(CTRL_LOG_STREAM, now, "throttle read failed: {}", err);
                }
            }
            delay_ms(config.throttle_period_ms);
        }
    }

    /// Effect task, Core 1. Owns the state machine.
    extern "C" fn effect_task(_arg: *mut c_void) {
        let config = EngineConfig::default();
        let mut fx = EngineEffects::new(config);

        loop {
            engine().effect_tick(&mut fx, timestamp_us());
            delay_ms(config.effect_period_ms);
        }
    }

    fn print_entry(tag: &str, entry: &LogEntry) {
        let msg = core::str::from_utf8(&entry.msg[..entry.len as usize]).unwrap_or("<bad utf8>");
        println!(
            "[{:>10}] {:5} {}: {}",
            entry.timestamp_us,
            entry.level.as_str(),
            tag,
            msg
        );
    }

    pub fn run() -> ! {
        sys::link_patches();

        let config = EngineConfig::default();
        let clock = EspToneClock::init(sys::dac_channel_t_DAC_CHAN_0, on_sample_tick)
            .expect("sample clock init failed");

        // SAFETY: single write before the ISR or any task exists
        unsafe {
            ENGINE = Some(EngineSound::new(clock, config));
        }

        let engine = engine();
        engine.begin();
        if !engine.load_buffer(&IDLE_LOOP) {
            println!("idle loop load failed, starting silent");
        }
        engine.start_playback();

        // SAFETY: task entry points and names outlive the tasks (statics)
        unsafe {
            sys::xTaskCreatePinnedToCore(
                Some(control_task),
                c"throttle".as_ptr(),
                4096,
                ptr::null_mut(),
                5,
                ptr::null_mut(),
                0,
            );
            sys::xTaskCreatePinnedToCore(
                Some(effect_task),
                c"effects".as_ptr(),
                4096,
                ptr::null_mut(),
                5,
                ptr::null_mut(),
                1,
            );
        }

        println!("enginetone up, rate {} Hz, gear {}", engine.sample_rate(), engine.current_gear());

        loop {
            while let Some(entry) = CTRL_LOG_STREAM.drain() {
                print_entry("ctrl", &entry);
            }
            while let Some(entry) = BG_LOG_STREAM.drain() {
                print_entry("fx", &entry);
            }

            let dropped = CTRL_LOG_STREAM.dropped() + BG_LOG_STREAM.dropped();
            if dropped > 0 {
                println!("log rings dropped {} messages", dropped);
                CTRL_LOG_STREAM.reset_dropped();
                BG_LOG_STREAM.reset_dropped();
            }

            delay_ms(100);
        }
    }
}

#[cfg(target_os = "espidf")]
fn main() {
    firmware::run()
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    // Firmware binary; the library is what runs on the host.
}
