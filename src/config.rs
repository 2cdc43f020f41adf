use alloc::string::{String, ToString};
use core::fmt;

use crate::error::ConfigError;

const PIN_NAME_D10: &str = "D10";
const PIN_NAME_D12: &str = "D12";
const PIN_NAME_D18: &str = "D18";
const PIN_NAME_D21: &str = "D21";

/// Highest accepted brightness value
pub const MAX_BRIGHTNESS: u8 = 100;

/// Data pins an LED strip can be attached to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pin {
    D10,
    D12,
    D18,
    D21,
}

impl Pin {
    /// Every supported pin
    pub const ALL: [Self; 4] = [Self::D10, Self::D12, Self::D18, Self::D21];

    /// Number of supported pins, and so the most outputs that can be live
    pub const COUNT: usize = Self::ALL.len();

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::D10 => PIN_NAME_D10,
            Self::D12 => PIN_NAME_D12,
            Self::D18 => PIN_NAME_D18,
            Self::D21 => PIN_NAME_D21,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            PIN_NAME_D10 => Some(Self::D10),
            PIN_NAME_D12 => Some(Self::D12),
            PIN_NAME_D18 => Some(Self::D18),
            PIN_NAME_D21 => Some(Self::D21),
            _ => None,
        }
    }

    /// Position of the pin in [`Pin::ALL`]
    pub const fn index(self) -> usize {
        match self {
            Self::D10 => 0,
            Self::D12 => 1,
            Self::D18 => 2,
            Self::D21 => 3,
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration of one LED strip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Stable logical id frames are routed by
    pub output_id: String,
    pub pin: Pin,
    /// Number of addressable pixels
    pub leds: u16,
    /// Brightness in percent (0-100)
    pub brightness: u8,
}

impl OutputConfig {
    pub fn new(output_id: impl Into<String>, pin: Pin, leds: u16, brightness: u8) -> Self {
        Self {
            output_id: output_id.into(),
            pin,
            leds,
            brightness,
        }
    }

    /// Build a config from values supplied by an untrusted upstream.
    ///
    /// The id and pin are trimmed before they are checked.
    pub fn parse(
        output_id: &str,
        pin: &str,
        leds: u32,
        brightness: u32,
    ) -> Result<Self, ConfigError> {
        let output_id = output_id.trim();
        if output_id.is_empty() {
            return Err(ConfigError::BlankOutputId);
        }
        if leds == 0 {
            return Err(ConfigError::NoLeds(output_id.to_string()));
        }
        let brightness = u8::try_from(brightness)
            .ok()
            .filter(|value| *value <= MAX_BRIGHTNESS)
            .ok_or_else(|| ConfigError::BrightnessOutOfRange {
                output_id: output_id.to_string(),
                brightness,
            })?;
        let Some(pin) = Pin::parse_from_str(pin.trim()) else {
            return Err(ConfigError::UnknownPin {
                output_id: output_id.to_string(),
                pin: pin.to_string(),
            });
        };
        let leds = u16::try_from(leds).map_err(|_| ConfigError::TooManyLeds {
            output_id: output_id.to_string(),
            leds,
        })?;

        Ok(Self::new(output_id, pin, leds, brightness))
    }

    /// Check the invariants every applied config must hold
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_id.trim().is_empty() {
            return Err(ConfigError::BlankOutputId);
        }
        if self.leds == 0 {
            return Err(ConfigError::NoLeds(self.output_id.clone()));
        }
        if self.brightness > MAX_BRIGHTNESS {
            return Err(ConfigError::BrightnessOutOfRange {
                output_id: self.output_id.clone(),
                brightness: u32::from(self.brightness),
            });
        }
        Ok(())
    }
}
