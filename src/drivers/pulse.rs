// Tiga Watch — Pulse Sensor ADC
//
// One-shot ADC1 reads via the raw ESP-IDF driver API.

use esp_idf_sys::{self as sys, esp};

use tiga::config::PIN_PULSE;
use tiga::hal::AnalogInput;

pub struct AdcPulse {
    handle: sys::adc_oneshot_unit_handle_t,
    channel: sys::adc_channel_t,
}

impl AdcPulse {
    /// ADC1 with 11 dB attenuation (0–3.3 V range), 12-bit samples.
    pub fn new() -> anyhow::Result<Self> {
        // On the ESP32-S3, GPIO1..=GPIO10 map to ADC1 channels 0..=9.
        let channel = (PIN_PULSE - 1) as sys::adc_channel_t;

        let mut handle: sys::adc_oneshot_unit_handle_t = core::ptr::null_mut();
        // SAFETY: plain FFI calls with valid, fully initialised config structs.
        unsafe {
            let unit_cfg = sys::adc_oneshot_unit_init_cfg_t {
                unit_id: sys::adc_unit_t_ADC_UNIT_1,
                ulp_mode: sys::adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
                ..core::mem::zeroed()
            };
            esp!(sys::adc_oneshot_new_unit(&unit_cfg, &mut handle))?;

            let chan_cfg = sys::adc_oneshot_chan_cfg_t {
                atten: sys::adc_atten_t_ADC_ATTEN_DB_11,
                bitwidth: sys::adc_bitwidth_t_ADC_BITWIDTH_12,
            };
            esp!(sys::adc_oneshot_config_channel(handle, channel, &chan_cfg))?;
        }

        log::info!("Pulse sensor on GPIO{} (ADC1 channel {})", PIN_PULSE, channel);
        Ok(Self { handle, channel })
    }
}

impl AnalogInput for AdcPulse {
    fn read_analog(&mut self) -> anyhow::Result<u16> {
        let mut raw: i32 = 0;
        // SAFETY: `handle` was created by `adc_oneshot_new_unit` and is only
        // released in `drop`.
        esp!(unsafe { sys::adc_oneshot_read(self.handle, self.channel, &mut raw) })?;
        Ok(raw.clamp(0, 4095) as u16)
    }
}

impl Drop for AdcPulse {
    fn drop(&mut self) {
        unsafe {
            sys::adc_oneshot_del_unit(self.handle);
        }
    }
}
