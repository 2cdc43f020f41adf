//! Messages consumed by the scheduler and the channel they travel on.

use alloc::string::String;
use alloc::vec::Vec;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::{Channel, Receiver, Sender};

use crate::config::OutputConfig;
use crate::frame::Frame;

/// Default depth of the inbound channel
pub const INBOUND_CHANNEL_SIZE: usize = 16;

/// Everything a producer can ask of the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    /// Create or replace one output
    ConfigUpdate(OutputConfig),
    /// Replace every output
    ConfigBatch(Vec<OutputConfig>),
    /// Remove one output
    ConfigRemove(String),
    /// Change the brightness of a live output
    Brightness { output_id: String, brightness: u8 },
    /// Render or buffer a frame
    Frame(Frame),
}

/// Type alias for the inbound channel
pub type InboundChannel<const SIZE: usize> =
    Channel<CriticalSectionRawMutex, InboundMessage, SIZE>;

/// Type alias for inbound sender
pub type InboundSender<'a, const SIZE: usize> =
    Sender<'a, CriticalSectionRawMutex, InboundMessage, SIZE>;

/// Type alias for inbound receiver
pub type InboundReceiver<'a, const SIZE: usize> =
    Receiver<'a, CriticalSectionRawMutex, InboundMessage, SIZE>;
