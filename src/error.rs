//! Error types shared across the engine.
//!
//! None of these are fatal. The scheduler logs them at the tick boundary
//! and keeps going.

use alloc::string::String;

use thiserror::Error;

use crate::config::Pin;

/// Failure to turn an inbound payload into a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Header is truncated or the color data ends in a partial sample
    #[error("malformed frame message of {len} bytes")]
    Malformed { len: usize },
    /// Payload is not binary
    #[error("unsupported message type, frames must be binary")]
    UnsupportedMessageType,
}

/// Failure to obtain a pixel buffer for a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AcquireError {
    /// Another live buffer already drives the pin
    #[error("pin {0} is already claimed")]
    PinBusy(Pin),
    /// The hardware could not provide a buffer for the pin
    #[error("pin {0} is unavailable")]
    Unavailable(Pin),
}

/// Pixel data could not be pushed to the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to flush pixel buffer")]
pub struct FlushError;

/// Rejected output configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("LED strip id must be non-blank")]
    BlankOutputId,
    #[error("LED strip {0} must have more than 0 LEDs")]
    NoLeds(String),
    #[error("LED strip {output_id} has {leds} LEDs, more than a strip can address")]
    TooManyLeds { output_id: String, leds: u32 },
    #[error("LED strip {output_id} must have a brightness between 0 and 100, got {brightness}")]
    BrightnessOutOfRange { output_id: String, brightness: u32 },
    #[error("LED strip {output_id} must be assigned to pin D10, D12, D18 or D21, got {pin:?}")]
    UnknownPin { output_id: String, pin: String },
    #[error("LED strip {0} is configured more than once")]
    DuplicateOutput(String),
    #[error("pin {pin} is already used by LED strip {owner}")]
    PinInUse { pin: Pin, owner: String },
    #[error("LED strip {0} is not configured")]
    UnknownOutput(String),
    #[error("no free output slot for LED strip {0}")]
    RegistryFull(String),
    /// The config was valid but the hardware refused it
    #[error("failed to acquire output for LED strip {output_id}: {source}")]
    AcquisitionFailed {
        output_id: String,
        source: AcquireError,
    },
}

/// Failure to hand a frame from a transport to the engine
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IngestError {
    #[error(transparent)]
    Frame(#[from] FrameError),
    /// The inbound channel is full, the producer should slow down
    #[error("inbound channel is full")]
    Backpressure,
}
