#![allow(dead_code)]

pub mod delay;
pub mod i2c;
