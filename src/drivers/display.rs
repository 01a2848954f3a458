// Tiga Watch — ST7789 Display
//
// 320x170 LCD over SPI2, driven through `mipidsi` so the screens can draw
// on it with `embedded-graphics`.

use esp_idf_hal::delay::Ets;
use esp_idf_hal::gpio::{AnyIOPin, AnyOutputPin, Output, PinDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::config::Config as SpiConfig;
use esp_idf_hal::spi::{SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2};
use mipidsi::interface::SpiInterface;
use mipidsi::models::ST7789;
use mipidsi::options::{ColorInversion, Orientation, Rotation};

use tiga::config::*;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type Spi = SpiDeviceDriver<'static, SpiDriver<'static>>;

pub type Display = mipidsi::Display<SpiInterface<'static, Spi, OutPin>, ST7789, OutPin>;

/// Panel plus the backlight pin that must stay driven while it is in use.
pub struct Lcd {
    pub display: Display,
    _backlight: OutPin,
}

pub fn init(spi: SPI2) -> anyhow::Result<Lcd> {
    // SAFETY: each LCD pin number is claimed exactly once, here.
    let (sclk, mosi, cs, dc, rst, bl) = unsafe {
        (
            AnyIOPin::new(PIN_LCD_SCLK),
            AnyIOPin::new(PIN_LCD_MOSI),
            AnyIOPin::new(PIN_LCD_CS),
            AnyOutputPin::new(PIN_LCD_DC),
            AnyOutputPin::new(PIN_LCD_RST),
            AnyOutputPin::new(PIN_LCD_BL),
        )
    };

    let spi = SpiDeviceDriver::new_single(
        spi,
        sclk,
        mosi,
        None::<AnyIOPin>,
        Some(cs),
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(DISPLAY_SPI_HZ.Hz()),
    )?;

    let dc = PinDriver::output(dc)?;
    let rst = PinDriver::output(rst)?;
    let mut backlight = PinDriver::output(bl)?;

    let buffer: &'static mut [u8] = Box::leak(Box::new([0u8; 4096]));
    let di = SpiInterface::new(spi, dc, buffer);

    let mut delay = Ets;
    let display = mipidsi::Builder::new(ST7789, di)
        .reset_pin(rst)
        .display_size(SCREEN_HEIGHT as u16, SCREEN_WIDTH as u16)
        .display_offset(LCD_OFFSET_X, 0)
        .invert_colors(ColorInversion::Inverted)
        .orientation(Orientation::new().rotate(Rotation::Deg90))
        .init(&mut delay)
        .map_err(|e| anyhow::anyhow!("ST7789 init failed: {:?}", e))?;

    backlight.set_high()?;
    log::info!("Display initialised ({}x{})", SCREEN_WIDTH, SCREEN_HEIGHT);

    Ok(Lcd {
        display,
        _backlight: backlight,
    })
}
