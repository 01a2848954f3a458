// Tiga Watch — MPU6050 IMU Driver
//
// Register-level driver on a dedicated I2C bus.  Only the accelerometer and
// the die temperature are used; the gyro stays at its power-on defaults.

use esp_idf_hal::i2c::I2cDriver;

use tiga::config::*;
use tiga::hal::InertialSensor;

// MPU6050 register addresses
const REG_SMPLRT_DIV: u8 = 0x19;
const REG_CONFIG: u8 = 0x1A;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_ACCEL_XOUT_H: u8 = 0x3B; // X/Y/Z high-low pairs
const REG_TEMP_OUT_H: u8 = 0x41;
const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;
const WHO_AM_I_EXPECTED: u8 = 0x68;

/// Gyro output rate with the DLPF enabled.
const INTERNAL_RATE_HZ: u32 = 1000;

pub struct Mpu6050 {
    bus: I2cDriver<'static>,
}

impl Mpu6050 {
    pub fn new(bus: I2cDriver<'static>) -> Self {
        Self { bus }
    }

    /// Wake the sensor and configure accel (±8 g), DLPF 21 Hz, 100 Hz output.
    pub fn init(&mut self) -> anyhow::Result<()> {
        // Wake up (clear SLEEP bit)
        self.write_reg(REG_PWR_MGMT_1, 0x00)?;

        // DLPF bandwidth 21 Hz
        self.write_reg(REG_CONFIG, 0x04)?;

        let divider = (INTERNAL_RATE_HZ / MPU_SAMPLE_RATE_HZ - 1) as u8;
        self.write_reg(REG_SMPLRT_DIV, divider)?;

        // Accelerometer: ±8 g
        self.write_reg(REG_ACCEL_CONFIG, 0x10)?;

        log::info!("MPU6050 initialised (±8g, DLPF 21Hz, {} Hz)", MPU_SAMPLE_RATE_HZ);
        Ok(())
    }

    fn write_reg(&mut self, reg: u8, value: u8) -> anyhow::Result<()> {
        self.bus.write(I2C_ADDR_MPU6050, &[reg, value], I2C_TIMEOUT_TICKS)?;
        Ok(())
    }

    fn read_regs(&mut self, reg: u8, buf: &mut [u8]) -> anyhow::Result<()> {
        self.bus.write_read(I2C_ADDR_MPU6050, &[reg], buf, I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

impl InertialSensor for Mpu6050 {
    fn is_connected(&mut self) -> bool {
        let mut buf = [0u8; 1];
        match self.read_regs(REG_WHO_AM_I, &mut buf) {
            Ok(()) => buf[0] == WHO_AM_I_EXPECTED,
            Err(_) => false,
        }
    }

    fn read_raw_acceleration(&mut self) -> anyhow::Result<[i16; 3]> {
        let mut raw = [0u8; 6];
        self.read_regs(REG_ACCEL_XOUT_H, &mut raw)?;
        Ok([
            i16::from_be_bytes([raw[0], raw[1]]),
            i16::from_be_bytes([raw[2], raw[3]]),
            i16::from_be_bytes([raw[4], raw[5]]),
        ])
    }

    fn read_raw_temperature(&mut self) -> anyhow::Result<i16> {
        let mut raw = [0u8; 2];
        self.read_regs(REG_TEMP_OUT_H, &mut raw)?;
        Ok(i16::from_be_bytes(raw))
    }
}
