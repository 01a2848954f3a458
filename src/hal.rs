// Tiga Watch — Hardware Capability Interfaces
//
// The acquisition code never talks to registers directly.  Digital pins and
// blocking pauses use the `embedded-hal` 1.0 traits; the rest is described
// here so the firmware drivers and the host simulator can both plug in.

/// Monotonic millisecond clock (milliseconds since boot).
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Single-channel ADC reading raw counts (12-bit on the ESP32-S3).
pub trait AnalogInput {
    fn read_analog(&mut self) -> anyhow::Result<u16>;
}

/// Accelerometer with an on-die temperature sensor (MPU6050 style).
pub trait InertialSensor {
    /// Connection test, e.g. a WHO_AM_I register check.
    fn is_connected(&mut self) -> bool;

    /// Raw X/Y/Z acceleration counts.
    fn read_raw_acceleration(&mut self) -> anyhow::Result<[i16; 3]>;

    /// Raw die temperature counts.
    fn read_raw_temperature(&mut self) -> anyhow::Result<i16>;
}
