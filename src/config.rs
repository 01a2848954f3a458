// Tiga Watch — Hardware & System Configuration
// Target: ESP32-S3 with 320x170 ST7789 display and MPU6050 IMU

// ---------------------------------------------------------------------------
// GPIO Pin Definitions
// ---------------------------------------------------------------------------
pub const PIN_PULSE: i32 = 3;       // GPIO03: Pulse sensor (ADC1 channel 2)
pub const PIN_VIBRATION: i32 = 43;  // GPIO43: SW-420 vibration sensor
pub const PIN_TOUCH: i32 = 44;      // GPIO44: TTP223 touch sensor (active HIGH)
pub const PIN_BUTTON1: i32 = 21;    // GPIO21: Scroll button (INPUT_PULLUP, active LOW)
pub const PIN_BUTTON2: i32 = 16;    // GPIO16: Select button (INPUT_PULLUP, active LOW)
pub const PIN_I2C_SDA: i32 = 18;
pub const PIN_I2C_SCL: i32 = 17;

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MPU6050: u8 = 0x68;
pub const I2C_BAUDRATE_HZ: u32 = 400_000;  // Fast mode
pub const I2C_TIMEOUT_TICKS: u32 = 1000;   // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (ST7789, landscape)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 320;
pub const SCREEN_HEIGHT: u32 = 170;
pub const DISPLAY_SPI_HZ: u32 = 40_000_000;
pub const PIN_LCD_SCLK: i32 = 12;
pub const PIN_LCD_MOSI: i32 = 11;
pub const PIN_LCD_CS: i32 = 10;
pub const PIN_LCD_DC: i32 = 13;
pub const PIN_LCD_RST: i32 = 14;
pub const PIN_LCD_BL: i32 = 15;       // Backlight, active HIGH
pub const LCD_OFFSET_X: u16 = 35;     // 170-px panel sits in a 240-px wide controller RAM

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const UI_POLL_INTERVAL_MS: u32 = 10;       // ~100 Hz control loop
pub const REDRAW_INTERVAL_MS: u64 = 1000;      // Periodic refresh (ages, live values)
pub const DEBOUNCE_MS: u64 = 50;
pub const VIBRATION_CHECK_INTERVAL_MS: u64 = 100;
pub const VIBRATION_CONFIRM_DELAY_MS: u32 = 5;

// ---------------------------------------------------------------------------
// MPU6050 thresholds (raw LSB magnitudes at ±8 g, 4096 LSB/g)
// ---------------------------------------------------------------------------
/// Magnitude above which a sample counts as a step impulse (~3.7 g).
pub const STEP_THRESHOLD: f32 = 15_000.0;
/// Magnitude of an impact that starts a fall check (~6.1 g).
pub const FALL_THRESHOLD: f32 = 25_000.0;
/// Magnitude below which the wearer is considered still (~2 g).
pub const STABLE_THRESHOLD: f32 = 8_000.0;
pub const ACCEL_LSB_PER_G: f32 = 4096.0;
pub const MPU_SAMPLE_RATE_HZ: u32 = 100;

pub const MOTION_HISTORY_LEN: usize = 50;
pub const MIN_STEP_INTERVAL_MS: u64 = 300;
pub const FALL_CHECK_INTERVAL_MS: u64 = 50;
pub const FALL_CONFIRM_DELAY_MS: u32 = 100;

// ---------------------------------------------------------------------------
// Pulse sensor
// ---------------------------------------------------------------------------
pub const PULSE_SAMPLES: usize = 10;
pub const PULSE_THRESHOLD_OFFSET: f32 = 100.0;  // Raw ADC counts above the rolling mean
pub const MIN_BEAT_INTERVAL_MS: u64 = 300;
pub const PULSE_TIMEOUT_MS: u64 = 30_000;
pub const MIN_BPM: f32 = 40.0;
pub const MAX_BPM: f32 = 180.0;
pub const DEFAULT_BPM: f32 = 75.0;

// ---------------------------------------------------------------------------
// Temperature (MPU6050 die sensor)
// ---------------------------------------------------------------------------
pub const TEMP_READ_INTERVAL_MS: u64 = 1000;
pub const TEMP_LSB_PER_DEG: f32 = 340.0;
pub const TEMP_OFFSET_C: f32 = 36.53;
pub const TEMP_MIN_C: f32 = 35.0;
pub const TEMP_MAX_C: f32 = 42.0;
pub const DEFAULT_TEMP_C: f32 = 36.5;

// ---------------------------------------------------------------------------
// Chat link & self-test logs
// ---------------------------------------------------------------------------
pub const CHAT_MAX_MESSAGES: usize = 5;
pub const CHAT_MAX_TEXT_LEN: usize = 127;
pub const CHAT_SCAN_INTERVAL_MS: u64 = 5000;
pub const CHAT_VISIBLE_MESSAGES: usize = 3;

pub const TEST_MAX_RESULTS: usize = 10;
pub const TEST_RESULT_TEXT_LEN: usize = 49;
pub const TEST_DURATION_MS: u64 = 30_000;
