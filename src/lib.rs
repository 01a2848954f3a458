//! Tiga Watch — wearable health monitor firmware core.
//!
//! Everything here is hardware-agnostic: time is passed in as milliseconds,
//! blocking pauses go through [`embedded_hal::delay::DelayNs`], and the
//! sensors sit behind the small traits in [`hal`].  The ESP32-S3 drivers
//! live in the firmware binary; [`sim`] provides desktop stand-ins.

pub mod app;
pub mod chat;
pub mod config;
pub mod events;
pub mod hal;
pub mod input;
pub mod ring;
pub mod selftest;
pub mod sensors;
pub mod sim;
pub mod ui;
