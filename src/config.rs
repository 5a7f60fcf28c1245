//! Configuration register model for the INA3221.
//!
//! # Copyright
//! Copyright (C) 2020 QUARTIQ GmbH - All Rights Reserved
//! Unauthorized usage, editing, or copying is strictly prohibited.
//! Proprietary and confidential.
//!
//! # Description
//! The configuration register packs the channel enables, the averaging count, both conversion
//! times and the operating mode into a single 16-bit word. `Config` holds these as named fields
//! and assembles the word on demand.
use bit_field::BitField;
use serde::{Deserialize, Serialize};

use crate::Channel;

/// Writing this bit to the configuration register resets the device to its power-on state.
pub const RESET: u16 = 1 << 15;

/// The number of samples averaged into each reported measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AveragingMode {
    N1 = 0,
    N4 = 1,
    N16 = 2,
    N64 = 3,
    N128 = 4,
    N256 = 5,
    N512 = 6,
    N1024 = 7,
}

/// The ADC conversion time of a single sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionTime {
    T140Us = 0,
    T204Us = 1,
    T332Us = 2,
    T588Us = 3,
    T1100Us = 4,
    T2116Us = 5,
    T4156Us = 6,
    T8244Us = 7,
}

/// The operating mode of the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperatingMode {
    PowerDown = 0,
    ShuntSingleShot = 1,
    BusSingleShot = 2,
    ShuntBusSingleShot = 3,
    // Mode 4 is a second power-down encoding and is never written by this driver.
    ShuntContinuous = 5,
    BusContinuous = 6,
    ShuntBusContinuous = 7,
}

/// The contents of the configuration register.
///
/// # Note
/// The default matches the power-on state of the device: all channels enabled, no averaging,
/// 1.1ms conversions and continuous shunt and bus measurement.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    channels: [bool; 3],
    averaging: AveragingMode,
    bus_conversion_time: ConversionTime,
    shunt_conversion_time: ConversionTime,
    mode: OperatingMode,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            channels: [true; 3],
            averaging: AveragingMode::N1,
            bus_conversion_time: ConversionTime::T1100Us,
            shunt_conversion_time: ConversionTime::T1100Us,
            mode: OperatingMode::ShuntBusContinuous,
        }
    }
}

impl Config {
    /// Enable or disable measurement on a channel.
    pub fn channel(self, channel: Channel, enabled: bool) -> Self {
        let mut channels = self.channels;
        channels[channel.index()] = enabled;
        Self { channels, ..self }
    }

    /// Set the number of samples averaged per measurement.
    pub fn averaging(self, averaging: AveragingMode) -> Self {
        Self { averaging, ..self }
    }

    /// Set the conversion time of the bus voltage measurement.
    pub fn bus_conversion_time(self, time: ConversionTime) -> Self {
        Self {
            bus_conversion_time: time,
            ..self
        }
    }

    /// Set the conversion time of the shunt voltage measurement.
    pub fn shunt_conversion_time(self, time: ConversionTime) -> Self {
        Self {
            shunt_conversion_time: time,
            ..self
        }
    }

    /// Set the operating mode of the device.
    pub fn mode(self, mode: OperatingMode) -> Self {
        Self { mode, ..self }
    }

    /// Check if a channel is enabled for measurement.
    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.channels[channel.index()]
    }

    /// Assemble the 16-bit configuration register word.
    pub fn register(&self) -> u16 {
        let mut word = 0u16;

        // Channel 1 is the most significant enable bit.
        for channel in Channel::ALL {
            word.set_bit(15 - channel as usize, self.is_enabled(channel));
        }

        word.set_bits(9..12, self.averaging as u16)
            .set_bits(6..9, self.bus_conversion_time as u16)
            .set_bits(3..6, self.shunt_conversion_time as u16)
            .set_bits(0..3, self.mode as u16);

        word
    }
}
