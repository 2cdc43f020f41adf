//! Frame ingest
//!
//! Glue between a streaming transport and the scheduler. A transport keeps
//! one [`FrameIngest`] per connection, feeds it every inbound payload and
//! answers the sender with [`Ack::TOKEN`] once a frame is accepted into the
//! inbound channel. Acceptance does not mean the frame was rendered.

use alloc::string::String;

use log::{trace, warn};

use crate::error::IngestError;
use crate::frame::{Payload, decode_payload};
use crate::inbound::{InboundMessage, InboundSender};

/// Acknowledgment of an accepted frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack;

impl Ack {
    /// Token sent back to the producer
    pub const TOKEN: &'static str = "ACK";

    pub const fn as_str(self) -> &'static str {
        Self::TOKEN
    }
}

/// Decodes payloads of one connection and forwards them to the scheduler
pub struct FrameIngest<'a, const SIZE: usize> {
    output_id: String,
    sender: InboundSender<'a, SIZE>,
}

impl<'a, const SIZE: usize> FrameIngest<'a, SIZE> {
    /// Create an ingest for the connection routed to `output_id`
    pub fn new(output_id: impl Into<String>, sender: InboundSender<'a, SIZE>) -> Self {
        Self {
            output_id: output_id.into(),
            sender,
        }
    }

    pub fn output_id(&self) -> &str {
        &self.output_id
    }

    /// Decode a payload and hand it over without waiting.
    ///
    /// Fails with [`IngestError::Backpressure`] if the channel is full; the
    /// frame is discarded and the producer is expected to slow down.
    pub fn accept(&self, payload: Payload<'_>) -> Result<Ack, IngestError> {
        let message = self.decode(payload)?;
        self.sender.try_send(message).map_err(|_| {
            warn!("inbound channel full, rejecting frame for {}", self.output_id);
            IngestError::Backpressure
        })?;
        Ok(Ack)
    }

    /// Decode a payload and wait until the channel has room for it
    pub async fn accept_wait(&self, payload: Payload<'_>) -> Result<Ack, IngestError> {
        let message = self.decode(payload)?;
        self.sender.send(message).await;
        Ok(Ack)
    }

    fn decode(&self, payload: Payload<'_>) -> Result<InboundMessage, IngestError> {
        let frame = decode_payload(&self.output_id, payload).map_err(|err| {
            warn!("discarding message for {}: {}", self.output_id, err);
            err
        })?;
        trace!(
            "frame for {} at {} with {} samples",
            self.output_id,
            frame.timestamp,
            frame.samples.len()
        );
        Ok(InboundMessage::Frame(frame))
    }
}
