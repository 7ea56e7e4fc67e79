//! One-shot ADC wrapper for the throttle potentiometer.

use core::ptr;

use esp_idf_svc::sys::{self, esp, EspError};

/// Throttle input on an ADC1 channel, 12-bit, full attenuation so the pot
/// can swing the whole supply rail.
pub struct ThrottleAdc {
    unit: sys::adc_oneshot_unit_handle_t,
    channel: sys::adc_channel_t,
}

// SAFETY: read from a single control task; the handle is never shared.
unsafe impl Send for ThrottleAdc {}

impl ThrottleAdc {
    /// Claim ADC unit 1 and configure `channel` for throttle sampling.
    pub fn init(channel: sys::adc_channel_t) -> Result<Self, EspError> {
        let unit_config = sys::adc_oneshot_unit_init_cfg_t {
            unit_id: sys::adc_unit_t_ADC_UNIT_1,
            ..Default::default()
        };
        let mut unit: sys::adc_oneshot_unit_handle_t = ptr::null_mut();
        esp!(unsafe { sys::adc_oneshot_new_unit(&unit_config, &mut unit) })?;

        let channel_config = sys::adc_oneshot_chan_cfg_t {
            atten: sys::adc_atten_t_ADC_ATTEN_DB_12,
            bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
        };
        esp!(unsafe { sys::adc_oneshot_config_channel(unit, channel, &channel_config) })?;

        Ok(Self { unit, channel })
    }

    /// One raw reading, `0..=4095`.
    pub fn read(&self) -> Result<u16, EspError> {
        let mut raw: i32 = 0;
        esp!(unsafe { sys::adc_oneshot_read(self.unit, self.channel, &mut raw) })?;
        Ok(raw as u16)
    }
}
