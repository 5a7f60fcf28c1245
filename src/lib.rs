//! Driver for the INA3221 3-channel shunt and bus voltage monitor.
//!
//! # Copyright
//! Copyright (C) 2020 QUARTIQ GmbH - All Rights Reserved
//! Unauthorized usage, editing, or copying is strictly prohibited.
//! Proprietary and confidential.
//!
//! # Description
//! The driver identifies the device on the bus, resets it into a known configuration and then
//! provides per-channel bus voltage, shunt voltage and current measurements. Current is derived
//! from the shunt voltage and a per-channel shunt resistance configured by the user.
//!
//! The driver owns whatever I2C handle it is given. To keep the bus with the caller, pass a
//! `&mut` reference or a shared bus device from `embedded-hal-bus`.
#![no_std]
#![deny(warnings)]

pub mod config;
mod error;

pub use config::{AveragingMode, Config, ConversionTime, OperatingMode};
pub use error::Error;

use embedded_hal::{delay::DelayNs, i2c::I2c};

/// The I2C address of the device with the A0 pin connected to ground.
pub const DEFAULT_ADDRESS: u8 = 0x40;

/// The shunt resistance assumed for every channel after initialization, in ohms.
pub const DEFAULT_SHUNT_OHMS: f32 = 0.1;

const MANUFACTURER_ID: u16 = 0x5449;
const DIE_ID: u16 = 0x3220;

// The device needs time to settle after each configuration write.
const SETTLE_TIME_US: u32 = 2000;

// The lower 3 bits of both voltage registers are not significant.
const VOLTAGE_LSB_DIVISOR: i16 = 8;
const BUS_VOLTS_PER_LSB: f32 = 8.0 / 1e3;
const SHUNT_VOLTS_PER_LSB: f32 = 40.0 / 1e6;

#[doc(hidden)]
#[derive(Copy, Clone, Debug)]
/// Represents the registers used by the driver. The per-channel voltage registers are laid out in
/// pairs following these base addresses.
enum Register {
    Configuration = 0x00,
    ShuntVoltageBase = 0x01,
    BusVoltageBase = 0x02,
    ManufacturerId = 0xfe,
    DieId = 0xff,
}

/// Represents the various states of the A0 address pin on the device. The value of the enum
/// corresponds to the 7-bit I2C bus address it represents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Address {
    Ground = 0x40,
    Supply = 0x41,
    Sda = 0x42,
    Scl = 0x43,
}

impl From<Address> for u8 {
    fn from(address: Address) -> u8 {
        address as u8
    }
}

/// An indication of which measurement channel to operate on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Channel {
    One = 1,
    Two = 2,
    Three = 3,
}

impl Channel {
    /// Every channel of the device, in order.
    pub const ALL: [Channel; 3] = [Channel::One, Channel::Two, Channel::Three];

    pub(crate) fn index(self) -> usize {
        self as usize - 1
    }

    fn shunt_voltage_register(self) -> u8 {
        Register::ShuntVoltageBase as u8 + self.index() as u8 * 2
    }

    fn bus_voltage_register(self) -> u8 {
        Register::BusVoltageBase as u8 + self.index() as u8 * 2
    }
}

impl TryFrom<u8> for Channel {
    type Error = Error;

    fn try_from(channel: u8) -> Result<Self, Error> {
        match channel {
            1 => Ok(Channel::One),
            2 => Ok(Channel::Two),
            3 => Ok(Channel::Three),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// A complete set of readings from one channel.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize)]
pub struct Measurement {
    /// The rail voltage relative to ground, in volts.
    pub bus_voltage: f32,

    /// The voltage across the shunt resistor, in volts.
    pub shunt_voltage: f32,

    /// The current through the shunt resistor, in amperes.
    pub current: f32,
}

/// The driver for the INA3221 current and voltage monitor.
pub struct Ina3221<I2C> {
    i2c: I2C,
    address: u8,
    config: Config,
    shunt_resistance: [f32; 3],
}

impl<I2C> Ina3221<I2C>
where
    I2C: I2c,
{
    /// Detect and initialize an INA3221.
    ///
    /// # Note
    /// The device is reset and configured to its default configuration, with every channel
    /// assuming a 0.1 Ohm shunt.
    ///
    /// # Args
    /// * `i2c` - The I2C interface used to communicate with the device.
    /// * `address` - The 7-bit I2C address of the device.
    /// * `delay` - A means of delaying while the device settles after reset.
    pub fn new(
        i2c: I2C,
        address: impl Into<u8>,
        delay: &mut impl DelayNs,
    ) -> Result<Self, Error> {
        Ina3221::with_config(i2c, address, Config::default(), delay)
    }

    /// Detect and initialize an INA3221 at the default address.
    ///
    /// # Args
    /// * `i2c` - The I2C interface used to communicate with the device.
    /// * `delay` - A means of delaying while the device settles after reset.
    pub fn default(i2c: I2C, delay: &mut impl DelayNs) -> Result<Self, Error> {
        Ina3221::new(i2c, DEFAULT_ADDRESS, delay)
    }

    /// Detect an INA3221 and initialize it with a custom configuration.
    ///
    /// # Args
    /// * `i2c` - The I2C interface used to communicate with the device.
    /// * `address` - The 7-bit I2C address of the device.
    /// * `config` - The configuration to program after reset.
    /// * `delay` - A means of delaying while the device settles after reset.
    ///
    /// # Returns
    /// The driver, or an error if the device could not be identified or configured. No driver
    /// exists on failure.
    pub fn with_config(
        i2c: I2C,
        address: impl Into<u8>,
        config: Config,
        delay: &mut impl DelayNs,
    ) -> Result<Self, Error> {
        let mut device = Ina3221 {
            i2c,
            address: address.into(),
            config,
            shunt_resistance: [DEFAULT_SHUNT_OHMS; 3],
        };

        device.detect()?;

        if let Err(error) = device.reset(delay) {
            log::warn!("Could not reset INA3221 at I2C {:#04x}", device.address);
            return Err(error);
        }

        log::info!("INA3221 initialized at I2C {:#04x}", device.address);
        Ok(device)
    }

    /// Tear down the driver.
    ///
    /// # Returns
    /// The I2C interface, untouched.
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Get the I2C address of the device.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Get the configuration programmed into the device at initialization.
    pub fn configuration(&self) -> Config {
        self.config
    }

    fn read(&mut self, register: u8) -> Result<u16, I2C::Error> {
        let mut data: [u8; 2] = [0; 2];
        self.i2c.write_read(self.address, &[register], &mut data)?;

        Ok(u16::from_be_bytes(data))
    }

    fn write(&mut self, register: Register, value: u16) -> Result<(), I2C::Error> {
        let [msb, lsb] = value.to_be_bytes();
        self.i2c.write(self.address, &[register as u8, msb, lsb])
    }

    fn detect(&mut self) -> Result<(), Error> {
        let manufacturer_id = self.read(Register::ManufacturerId as u8);
        let die_id = self.read(Register::DieId as u8);

        match (manufacturer_id, die_id) {
            (Ok(MANUFACTURER_ID), Ok(DIE_ID)) => Ok(()),
            (manufacturer_id, die_id) => {
                log::error!(
                    "I2C {:#04x} is not an INA3221 (manufacturer: {:x?}, die: {:x?})",
                    self.address,
                    manufacturer_id,
                    die_id
                );
                Err(Error::DeviceNotFound)
            }
        }
    }

    fn reset(&mut self, delay: &mut impl DelayNs) -> Result<(), Error> {
        self.write(Register::Configuration, config::RESET)
            .map_err(|_| Error::Hardware)?;
        delay.delay_us(SETTLE_TIME_US);

        let word = self.config.register();
        log::debug!("INA3221 {:#04x} configuration: {:#06x}", self.address, word);
        self.write(Register::Configuration, word)
            .map_err(|_| Error::Hardware)?;
        delay.delay_us(SETTLE_TIME_US);

        Ok(())
    }

    fn read_voltage(&mut self, register: u8) -> Result<i16, Error> {
        let raw = self.read(register).map_err(|_| Error::Io)? as i16;

        // Integer division truncates toward zero, discarding the insignificant bits.
        Ok(raw / VOLTAGE_LSB_DIVISOR)
    }

    /// Measure the bus voltage of a channel.
    ///
    /// # Args
    /// * `channel` - The channel to measure (1, 2 or 3).
    ///
    /// # Returns
    /// The bus voltage in volts.
    pub fn bus_voltage(&mut self, channel: u8) -> Result<f32, Error> {
        let channel = Channel::try_from(channel)?;
        let code = self.read_voltage(channel.bus_voltage_register())?;

        Ok(code as f32 * BUS_VOLTS_PER_LSB)
    }

    /// Measure the shunt voltage of a channel.
    ///
    /// # Args
    /// * `channel` - The channel to measure (1, 2 or 3).
    ///
    /// # Returns
    /// The shunt voltage in volts.
    pub fn shunt_voltage(&mut self, channel: u8) -> Result<f32, Error> {
        let channel = Channel::try_from(channel)?;
        let code = self.read_voltage(channel.shunt_voltage_register())?;

        Ok(code as f32 * SHUNT_VOLTS_PER_LSB)
    }

    /// Measure the current through the shunt of a channel.
    ///
    /// # Note
    /// The current is the shunt voltage divided by the configured shunt resistance.
    ///
    /// # Args
    /// * `channel` - The channel to measure (1, 2 or 3).
    ///
    /// # Returns
    /// The current in amperes.
    pub fn current(&mut self, channel: u8) -> Result<f32, Error> {
        let shunt_voltage = self.shunt_voltage(channel)?;
        let shunt_resistance = self.shunt_resistance(channel)?;

        Ok(shunt_voltage / shunt_resistance)
    }

    /// Measure bus voltage, shunt voltage and current of a channel.
    ///
    /// # Args
    /// * `channel` - The channel to measure (1, 2 or 3).
    pub fn measure(&mut self, channel: u8) -> Result<Measurement, Error> {
        let bus_voltage = self.bus_voltage(channel)?;
        let shunt_voltage = self.shunt_voltage(channel)?;
        let shunt_resistance = self.shunt_resistance(channel)?;

        Ok(Measurement {
            bus_voltage,
            shunt_voltage,
            current: shunt_voltage / shunt_resistance,
        })
    }

    /// Configure the shunt resistance of a channel.
    ///
    /// # Note
    /// A typical value is 0.1 Ohm, which yields a 1.6A measurement range. The sign and magnitude
    /// are not checked.
    ///
    /// # Args
    /// * `channel` - The channel to configure (1, 2 or 3).
    /// * `ohms` - The shunt resistance in ohms. Must be finite.
    pub fn set_shunt_resistance(&mut self, channel: u8, ohms: f32) -> Result<(), Error> {
        let channel = Channel::try_from(channel)?;
        if !ohms.is_finite() {
            return Err(Error::InvalidArgument);
        }

        self.shunt_resistance[channel.index()] = ohms;

        Ok(())
    }

    /// Get the configured shunt resistance of a channel in ohms.
    pub fn shunt_resistance(&self, channel: u8) -> Result<f32, Error> {
        let channel = Channel::try_from(channel)?;

        Ok(self.shunt_resistance[channel.index()])
    }
}
