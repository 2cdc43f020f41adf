//! Binary frame codec.
//!
//! A frame message is laid out as follows (integers are little-endian):
//!
//! | bytes    | meaning                                        |
//! |----------|------------------------------------------------|
//! | `0`      | [`RenderOptions`] bit flags                    |
//! | `1..5`   | reserved, ignored on decode, zero on encode    |
//! | `5..13`  | target timestamp, milliseconds since the epoch |
//! | `13..`   | zero or more `R, G, B` triples                 |
//!
//! The output a frame belongs to is not part of the payload. It is supplied
//! by the transport the message arrived on.

use alloc::string::String;
use alloc::vec::Vec;

use bitflags::bitflags;

use crate::color::Rgb;
use crate::error::FrameError;

/// Offset of the options byte
const OPTIONS_OFFSET: usize = 0;

/// Range of the little-endian timestamp
const TIMESTAMP_RANGE: core::ops::Range<usize> = 5..13;

/// Length of the fixed header preceding the color samples
pub const HEADER_LEN: usize = 13;

/// Bytes per color sample
pub const SAMPLE_LEN: usize = 3;

/// Timestamp value requesting an immediate render
pub const IMMEDIATE: u64 = 0;

bitflags! {
    /// Per-frame rendering options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RenderOptions: u8 {
        /// Drop every buffered frame of the output before handling this one
        const CLEAR_BUFFER = 1 << 0;
    }
}

/// One color update for a single output at a target time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Output the frame is routed to
    pub output_id: String,
    /// Target display time in milliseconds, [`IMMEDIATE`] to skip buffering
    pub timestamp: u64,
    pub options: RenderOptions,
    /// Colors starting at the first pixel of the strip
    pub samples: Vec<Rgb>,
}

/// Inbound payload as delivered by a message-oriented transport
#[derive(Debug, Clone, Copy)]
pub enum Payload<'a> {
    Binary(&'a [u8]),
    Text(&'a str),
}

impl Frame {
    pub fn new(
        output_id: impl Into<String>,
        timestamp: u64,
        options: RenderOptions,
        samples: Vec<Rgb>,
    ) -> Self {
        Self {
            output_id: output_id.into(),
            timestamp,
            options,
            samples,
        }
    }

    /// Decode a binary frame message routed to `output_id`.
    ///
    /// Reserved option bits and the reserved header bytes are ignored.
    pub fn decode(output_id: &str, bytes: &[u8]) -> Result<Self, FrameError> {
        if bytes.len() < HEADER_LEN || (bytes.len() - HEADER_LEN) % SAMPLE_LEN != 0 {
            return Err(FrameError::Malformed { len: bytes.len() });
        }

        let options = RenderOptions::from_bits_truncate(bytes[OPTIONS_OFFSET]);

        let mut timestamp = [0u8; 8];
        timestamp.copy_from_slice(&bytes[TIMESTAMP_RANGE]);
        let timestamp = u64::from_le_bytes(timestamp);

        let samples = bytes[HEADER_LEN..]
            .chunks_exact(SAMPLE_LEN)
            .map(|chunk| Rgb::new(chunk[0], chunk[1], chunk[2]))
            .collect();

        Ok(Self::new(output_id, timestamp, options, samples))
    }

    /// Encode the frame into its wire representation
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_LEN + self.samples.len() * SAMPLE_LEN);
        bytes.push(self.options.bits());
        bytes.extend_from_slice(&[0; 4]);
        bytes.extend_from_slice(&self.timestamp.to_le_bytes());
        for sample in &self.samples {
            bytes.extend_from_slice(&[sample.r, sample.g, sample.b]);
        }
        bytes
    }

    /// Returns true if the frame bypasses the playback buffer
    pub const fn is_immediate(&self) -> bool {
        self.timestamp == IMMEDIATE
    }

    /// Returns true if buffered frames of the output must be cleared first
    pub const fn clears_buffer(&self) -> bool {
        self.options.contains(RenderOptions::CLEAR_BUFFER)
    }
}

/// Decode a transport payload into a frame.
///
/// Text payloads are rejected with [`FrameError::UnsupportedMessageType`].
pub fn decode_payload(output_id: &str, payload: Payload<'_>) -> Result<Frame, FrameError> {
    match payload {
        Payload::Binary(bytes) => Frame::decode(output_id, bytes),
        Payload::Text(_) => Err(FrameError::UnsupportedMessageType),
    }
}
