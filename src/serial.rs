// SPDX-FileCopyrightText: Copyright (c) 2026 modbus-link contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serial line helpers.
//!
//! Opening and configuring the serial port itself is left to the
//! caller; clients and servers only require an async byte stream.
//! This module provides the timing helpers used on that stream and
//! the option types callers typically parse out of connection strings.

use std::{fmt, str::FromStr, time::Duration};

use thiserror::Error;

/// Approximates 3.5 character times of bus silence at 19 200 baud.
pub const INTER_FRAME_GAP: Duration = Duration::from_micros(1750);

#[cfg(feature = "rtu")]
pub(crate) use self::rtu_timing::{drain, InterFrameGap};

#[cfg(feature = "rtu")]
mod rtu_timing {
    use std::{
        io,
        time::{Duration, Instant},
    };

    use tokio::io::{AsyncRead, AsyncReadExt as _};

    /// Enforces a minimum gap of line silence before each write,
    /// measured from the last observed activity on the line.
    #[derive(Debug)]
    pub(crate) struct InterFrameGap {
        gap: Duration,
        last_activity: Option<Instant>,
    }

    impl InterFrameGap {
        pub(crate) fn new(gap: Duration) -> Self {
            Self {
                gap,
                last_activity: None,
            }
        }

        /// Sleeps until the configured gap has passed since the last
        /// [`mark`](Self::mark).
        pub(crate) async fn pause(&self) {
            if let Some(last_activity) = self.last_activity {
                let elapsed = last_activity.elapsed();
                if elapsed < self.gap {
                    tokio::time::sleep(self.gap - elapsed).await;
                }
            }
        }

        /// Records activity on the line.
        pub(crate) fn mark(&mut self) {
            self.last_activity = Some(Instant::now());
        }
    }

    /// Window of silence that counts as an inter-frame gap while
    /// resynchronizing.
    const QUIET: Duration = Duration::from_millis(20);

    /// Upper bound on the whole resynchronization.
    const LIMIT: Duration = Duration::from_secs(5);

    /// Reads and discards stale input until the line has been quiet
    /// for [`QUIET`], giving up after [`LIMIT`].
    pub(crate) async fn drain<T>(io: &mut T) -> io::Result<usize>
    where
        T: AsyncRead + Unpin,
    {
        let deadline = Instant::now() + LIMIT;
        let mut discarded = 0;
        let mut scratch = [0u8; 64];
        loop {
            match tokio::time::timeout(QUIET, io.read(&mut scratch)).await {
                Err(_) => break,
                Ok(Ok(0)) => break,
                Ok(Ok(len)) => {
                    discarded += len;
                    if Instant::now() >= deadline {
                        break;
                    }
                }
                Ok(Err(err)) => return Err(err),
            }
        }
        if discarded > 0 {
            log::warn!("Discarded {discarded} stale byte(s) while resynchronizing");
        }
        Ok(discarded)
    }

}

/// Parse failure for one of the serial option types.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unrecognized serial option value: {0}")]
pub struct InvalidSerialOption(String);

/// Number of data bits per transmitted character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataBits {
    /// 7 data bits (common for ASCII framing).
    Seven,
    /// 8 data bits.
    #[default]
    Eight,
}

impl FromStr for DataBits {
    type Err = InvalidSerialOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "7" => Ok(Self::Seven),
            "8" => Ok(Self::Eight),
            _ => Err(InvalidSerialOption(s.into())),
        }
    }
}

impl fmt::Display for DataBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Seven => f.write_str("7"),
            Self::Eight => f.write_str("8"),
        }
    }
}

/// Parity bit setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Parity {
    /// No parity bit (`N`).
    #[default]
    None,
    /// Even parity (`E`).
    Even,
    /// Odd parity (`O`).
    Odd,
}

impl FromStr for Parity {
    type Err = InvalidSerialOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(Self::None),
            "E" => Ok(Self::Even),
            "O" => Ok(Self::Odd),
            _ => Err(InvalidSerialOption(s.into())),
        }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("N"),
            Self::Even => f.write_str("E"),
            Self::Odd => f.write_str("O"),
        }
    }
}

/// Number of stop bits per transmitted character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopBits {
    /// 1 stop bit.
    #[default]
    One,
    /// 2 stop bits.
    Two,
}

impl FromStr for StopBits {
    type Err = InvalidSerialOption;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1" => Ok(Self::One),
            "2" => Ok(Self::Two),
            _ => Err(InvalidSerialOption(s.into())),
        }
    }
}

impl fmt::Display for StopBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::One => f.write_str("1"),
            Self::Two => f.write_str("2"),
        }
    }
}
