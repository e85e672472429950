#![no_std]

mod fmt;

/// Driver for the HDC1080 humidity and temperature sensor.
///
/// Refer to [this datasheet](https://www.ti.com/lit/ds/symlink/hdc1080.pdf) for more information
/// about the device.
pub mod hdc1080;
/// Register-level access to the HDC1080 over I2C.
pub mod transport;
