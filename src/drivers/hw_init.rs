//! One-shot hardware peripheral initialization.
//!
//! Configures the level shifters, the function-button input, the ADC1
//! oneshot unit for the water probe and the LEDC timer/channel for the
//! feeder servo using raw ESP-IDF sys calls. Called once from `main()`
//! before the dispatcher starts. Relay, LED and DHT pins are owned by
//! `esp-idf-hal` pin drivers instead.

use core::fmt;

use esp_idf_svc::sys::*;
use log::info;

use crate::error::SensorError;
use crate::pins;
use crate::sensors::temperature::AdcChannel;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    GpioConfigFailed(i32),
    LedcInitFailed(i32),
}

impl fmt::Display for HwInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::LedcInitFailed(rc) => write!(f, "LEDC timer/channel config failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO ──────────────────────────────────────────────────────

fn config_pin(pin: i32, mode: gpio_mode_t, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: single main-task context, before the dispatcher starts.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

/// Configure the level-shifter enables as outputs, held low (disabled).
pub fn init_level_shifters() -> Result<(), HwInitError> {
    for pin in pins::LEVEL_SHIFTER_GPIOS {
        config_pin(pin, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
        // SAFETY: pin configured as output just above.
        unsafe { gpio_set_level(pin, 0) };
    }
    info!("hw_init: level shifters configured (disabled)");
    Ok(())
}

/// Drive every level-shifter enable high. Call once all outputs sit at
/// their inactive level.
pub fn enable_level_shifters() {
    for pin in pins::LEVEL_SHIFTER_GPIOS {
        // SAFETY: configured by `init_level_shifters`.
        unsafe { gpio_set_level(pin, 1) };
    }
    info!("hw_init: level shifters enabled");
}

/// Function button: input with pull-up, sampled by the scan timer.
pub fn init_function_button() -> Result<(), HwInitError> {
    config_pin(pins::FUNCTION_BUTTON_GPIO, gpio_mode_t_GPIO_MODE_INPUT, true)?;
    info!("hw_init: function button on GPIO{}", pins::FUNCTION_BUTTON_GPIO);
    Ok(())
}

// ── ADC (oneshot) ─────────────────────────────────────────────

/// One configured ADC1 channel.
pub struct Adc1Channel {
    unit: adc_oneshot_unit_handle_t,
    channel: adc_channel_t,
}

/// Create the ADC1 oneshot unit and configure the water-probe channel.
pub fn init_water_adc() -> Result<Adc1Channel, HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    let mut unit: adc_oneshot_unit_handle_t = core::ptr::null_mut();
    // SAFETY: valid config and out pointer; called once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &mut unit) };
    if ret != ESP_OK {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    let channel = pins::WATER_NTC_ADC1_CHANNEL;
    // SAFETY: `unit` was created above.
    let ret = unsafe { adc_oneshot_config_channel(unit, channel, &chan_cfg) };
    if ret != ESP_OK {
        return Err(HwInitError::AdcInitFailed(ret));
    }

    info!("hw_init: ADC1 CH{} configured (water NTC)", channel);
    Ok(Adc1Channel { unit, channel })
}

impl AdcChannel for Adc1Channel {
    fn read_raw(&mut self) -> Result<u16, SensorError> {
        let mut raw: i32 = 0;
        // SAFETY: unit and channel configured in `init_water_adc`; only the
        // dispatcher task reads.
        let ret = unsafe { adc_oneshot_read(self.unit, self.channel, &mut raw) };
        if ret != ESP_OK {
            return Err(SensorError::AdcReadFailed);
        }
        Ok(raw.max(0) as u16)
    }
}

// ── LEDC PWM (feeder servo) ───────────────────────────────────

const SERVO_SPEED_MODE: ledc_mode_t = ledc_mode_t_LEDC_LOW_SPEED_MODE;
const SERVO_CHANNEL: ledc_channel_t = ledc_channel_t_LEDC_CHANNEL_0;

/// LEDC channel exposed as an `embedded-hal` PWM output.
pub struct LedcChannel {
    channel: ledc_channel_t,
    max_duty: u16,
}

/// Non-zero `esp_err_t` from an LEDC call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub i32);

impl embedded_hal::pwm::Error for LedcError {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

/// Configure LEDC timer 0 at the servo frame rate and channel 0 on the
/// feeder pin, duty 0.
pub fn init_servo_pwm() -> Result<LedcChannel, HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: SERVO_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: pins::SERVO_PWM_RESOLUTION_BITS,
        freq_hz: pins::SERVO_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single main-task context.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    let channel = ledc_channel_config_t {
        speed_mode: SERVO_SPEED_MODE,
        channel: SERVO_CHANNEL,
        timer_sel: ledc_timer_t_LEDC_TIMER_0,
        gpio_num: pins::FEEDER_SERVO_GPIO,
        duty: 0,
        hpoint: 0,
        ..Default::default()
    };
    // SAFETY: see above.
    let ret = unsafe { ledc_channel_config(&channel) };
    if ret != ESP_OK {
        return Err(HwInitError::LedcInitFailed(ret));
    }

    info!(
        "hw_init: LEDC servo on GPIO{} ({} Hz, {}-bit)",
        pins::FEEDER_SERVO_GPIO,
        pins::SERVO_PWM_FREQ_HZ,
        pins::SERVO_PWM_RESOLUTION_BITS
    );
    Ok(LedcChannel {
        channel: SERVO_CHANNEL,
        max_duty: ((1u32 << pins::SERVO_PWM_RESOLUTION_BITS) - 1) as u16,
    })
}

impl embedded_hal::pwm::ErrorType for LedcChannel {
    type Error = LedcError;
}

impl embedded_hal::pwm::SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), LedcError> {
        // SAFETY: channel configured in `init_servo_pwm`; only the
        // dispatcher task writes the duty.
        let ret = unsafe { ledc_set_duty(SERVO_SPEED_MODE, self.channel, u32::from(duty)) };
        if ret != ESP_OK {
            return Err(LedcError(ret));
        }
        let ret = unsafe { ledc_update_duty(SERVO_SPEED_MODE, self.channel) };
        if ret != ESP_OK {
            return Err(LedcError(ret));
        }
        Ok(())
    }
}
