//! Error type definitions for the INA3221 driver
//!
//! # Copyright
//! Copyright (C) 2020 QUARTIQ GmbH - All Rights Reserved
//! Unauthorized usage, editing, or copying is strictly prohibited.
//! Proprietary and confidential.

/// An enumeration of possible errors with the device.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Error {
    /// A channel outside of 1..=3, or a non-finite shunt resistance, was supplied.
    InvalidArgument,

    /// The identification registers did not match an INA3221.
    DeviceNotFound,

    /// A configuration write failed while resetting the device.
    Hardware,

    /// A measurement register could not be read.
    Io,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let description = match self {
            Error::InvalidArgument => "invalid argument",
            Error::DeviceNotFound => "device not found",
            Error::Hardware => "hardware error",
            Error::Io => "I/O error",
        };

        f.write_str(description)
    }
}
