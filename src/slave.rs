// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Station addressing

use std::{fmt, num::ParseIntError, str::FromStr};

/// Raw station identifier as transmitted on the wire.
pub type SlaveId = u8;

/// A single byte addressing a Modbus slave device.
///
/// On serial buses this is the station address in the first ADU byte;
/// within an MBAP frame the same byte is called the *unit identifier*.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Slave(pub SlaveId);

impl Slave {
    /// The one-way broadcast address.
    pub const BROADCAST: Self = Slave(0);

    /// The lowest address of an individual device.
    pub const MIN_DEVICE: Self = Slave(1);

    /// The highest address of an individual device. Addresses above
    /// this value are reserved.
    pub const MAX_DEVICE: Self = Slave(247);

    /// Checks whether this is the broadcast address.
    #[must_use]
    pub fn is_broadcast(self) -> bool {
        self == Self::BROADCAST
    }

    /// Checks whether this address selects a single device.
    #[must_use]
    pub fn is_single_device(self) -> bool {
        self >= Self::MIN_DEVICE && self <= Self::MAX_DEVICE
    }

    /// Checks whether this address falls into the reserved range.
    #[must_use]
    pub fn is_reserved(self) -> bool {
        self > Self::MAX_DEVICE
    }
}

impl From<SlaveId> for Slave {
    fn from(from: SlaveId) -> Self {
        Slave(from)
    }
}

impl From<Slave> for SlaveId {
    fn from(from: Slave) -> Self {
        from.0
    }
}

impl FromStr for Slave {
    type Err = ParseIntError;

    /// Parses a decimal (`"17"`) or hexadecimal (`"0x11"`) station address.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let slave_id = match s.parse::<u8>() {
            Ok(slave_id) => Ok(slave_id),
            Err(err) => {
                if let Some(stripped) = s.strip_prefix("0x") {
                    u8::from_str_radix(stripped, 16)
                } else {
                    Err(err)
                }
            }
        }?;
        Ok(Slave(slave_id))
    }
}

impl fmt::Display for Slave {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:0>2X})", self.0, self.0)
    }
}

/// Stateful selection of the currently addressed device.
///
/// Serial clients use the selected station for the ADU address field.
/// TCP clients use it as the MBAP unit identifier; MBAP-addressed
/// servers are usually reached with the default unit identifier `1`.
pub trait SlaveContext {
    /// Selects the station for all subsequent outgoing requests.
    fn set_slave(&mut self, slave: Slave);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decimal() {
        assert_eq!(Slave(0), Slave::from_str("0").unwrap());
        assert_eq!(Slave(42), Slave::from_str("42").unwrap());
        assert_eq!(Slave(255), Slave::from_str("255").unwrap());
        assert!(Slave::from_str("256").is_err());
        assert!(Slave::from_str("-1").is_err());
    }

    #[test]
    fn parse_hexadecimal() {
        assert_eq!(Slave(0x2A), Slave::from_str("0x2a").unwrap());
        assert_eq!(Slave(0x2A), Slave::from_str("0x2A").unwrap());
        assert!(Slave::from_str("0x100").is_err());
        assert!(Slave::from_str("0X2A").is_err());
    }

    #[test]
    fn address_ranges() {
        assert!(Slave::BROADCAST.is_broadcast());
        assert!(!Slave::BROADCAST.is_single_device());
        assert!(Slave(1).is_single_device());
        assert!(Slave(247).is_single_device());
        assert!(Slave(248).is_reserved());
        assert!(Slave(255).is_reserved());
    }
}
