// Tiga Watch — Firmware Entry Point
//
// Boot sequence (ESP32-S3):
//   1. Logger and peripherals.
//   2. MPU6050 on I2C, pulse sensor on ADC1, buttons/touch/vibration GPIOs.
//   3. ST7789 display over SPI.
//   4. ESP-NOW chat radio (optional: a failure only marks the link as errored).
//   5. Single cooperative control loop at ~100 Hz.
//
// On any other target the same control loop runs against synthetic hardware
// for one simulated minute and prints what the dashboard would show.

#[cfg(target_os = "espidf")]
mod drivers;

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use esp_idf_hal::delay::{Ets, FreeRtos};
    use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver, Pull};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;
    use esp_idf_svc::eventloop::EspSystemEventLoop;
    use esp_idf_svc::nvs::EspDefaultNvsPartition;

    use tiga::app::{App, Board};
    use tiga::config::*;

    use crate::drivers::imu::Mpu6050;
    use crate::drivers::pulse::AdcPulse;
    use crate::drivers::{display, radio, EspClock};

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Tiga Watch firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // ---- Digital inputs ---------------------------------------------------
    let input_pin = |pin: i32, pull: Pull| -> anyhow::Result<PinDriver<'static, AnyIOPin, Input>> {
        // SAFETY: each input pin number is claimed exactly once, below.
        let mut driver = PinDriver::input(unsafe { AnyIOPin::new(pin) })?;
        driver.set_pull(pull)?;
        Ok(driver)
    };
    let button1 = input_pin(PIN_BUTTON1, Pull::Up)?;
    let button2 = input_pin(PIN_BUTTON2, Pull::Up)?;
    let touch = input_pin(PIN_TOUCH, Pull::Floating)?;
    let vibration = input_pin(PIN_VIBRATION, Pull::Floating)?;

    // ---- I2C / IMU --------------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_HZ.Hz());
    // SAFETY: SDA/SCL are not claimed anywhere else.
    let (sda, scl) = unsafe { (AnyIOPin::new(PIN_I2C_SDA), AnyIOPin::new(PIN_I2C_SCL)) };
    let i2c = I2cDriver::new(peripherals.i2c0, sda, scl, &i2c_config)?;
    let mut imu = Mpu6050::new(i2c);
    if let Err(e) = imu.init() {
        // Keep going: the sensor hub reports the IMU as unavailable.
        log::error!("MPU6050 init failed: {}", e);
    }

    // ---- Pulse sensor -----------------------------------------------------
    let pulse = AdcPulse::new()?;

    // ---- Display ----------------------------------------------------------
    let mut lcd = display::init(peripherals.spi2)?;

    // ---- Control loop -----------------------------------------------------
    let board = Board {
        clock: EspClock,
        delay: Ets,
        button1,
        button2,
        touch,
        vibration,
        imu,
        pulse,
    };
    let mut app = App::new(board);

    // ---- Chat radio -------------------------------------------------------
    let _radio = match radio::start(peripherals.modem, sysloop, nvs, app.event_sender()) {
        Ok(radio) => Some(radio),
        Err(e) => {
            log::error!("Chat radio failed: {}", e);
            app.chat_mut().mark_failed();
            None
        }
    };

    log::info!("Boot complete, entering normal operation");
    loop {
        if app.tick() {
            if let Err(e) = app.render(&mut lcd.display) {
                log::error!("Display error: {:?}", e);
            }
        }
        FreeRtos::delay_ms(UI_POLL_INTERVAL_MS);
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    use tiga::app::{App, Board};
    use tiga::config::UI_POLL_INTERVAL_MS;
    use tiga::events::UiEvent;
    use tiga::sim::{SimClock, SimDelay, SimImu, SimPin, SimPulse};

    const SIM_DURATION_MS: u64 = 60_000;
    const REPORT_INTERVAL_MS: u64 = 5_000;

    let clock = SimClock::new();
    let imu = SimImu::walking(clock.clone(), 550);
    imu.set_temperature(160); // 37.0 °C
    let board = Board {
        clock: clock.clone(),
        delay: SimDelay::new(clock.clone()),
        button1: SimPin::new(true),
        button2: SimPin::new(true),
        touch: SimPin::new(false),
        vibration: SimPin::new(false),
        imu,
        pulse: SimPulse::heartbeat(clock.clone(), 72),
    };
    let mut app = App::new(board);
    let radio = app.event_sender();

    println!("Simulating {} s of wear", SIM_DURATION_MS / 1000);
    let mut next_report = REPORT_INTERVAL_MS;
    let mut greeted = false;
    while clock.now() < SIM_DURATION_MS {
        clock.advance(u64::from(UI_POLL_INTERVAL_MS));
        if !greeted && clock.now() >= 20_000 {
            greeted = true;
            let _ = radio.send(UiEvent::MessageReceived(b"Hello from the phone".to_vec()));
        }
        app.tick();

        if clock.now() >= next_report {
            next_report += REPORT_INTERVAL_MS;
            let s = app.snapshot();
            println!(
                "t={:>3}s  hr={:>5.1} bpm  steps={:>3}  temp={:.1}°C  stable={}  fall={}  activity={:.2} g  imu={}  chat={}",
                clock.now() / 1000,
                s.heart_rate_bpm,
                s.steps,
                s.temperature_c,
                s.is_stable,
                s.fall_detected,
                s.activity_level / tiga::config::ACCEL_LSB_PER_G,
                s.imu_health.label(),
                app.chat().state().label(),
            );
        }
    }

    for message in app.chat().messages().iter() {
        println!("chat [{}] {}", message.age_label(clock.now()), message.text);
    }
}
