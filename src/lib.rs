//! Timestamped LED frame playback.
//!
//! Color frames arrive over the network, each carrying the time it should be
//! shown at. The [`FrameScheduler`] buffers them per output and renders each
//! one when its time comes, dropping frames that arrived too late.

#![no_std]

extern crate alloc;

pub mod color;
pub mod config;
pub mod driver;
pub mod error;
pub mod frame;
pub mod inbound;
pub mod ingest;
pub mod playback;
pub mod registry;
pub mod scheduler;

pub use config::{OutputConfig, Pin};
pub use driver::{OutputDriver, PixelBuffer, SmartLedsBuffer, SmartLedsDriver};
pub use error::{AcquireError, ConfigError, FlushError, FrameError, IngestError};
pub use frame::{Frame, Payload, RenderOptions, decode_payload};
pub use inbound::{
    INBOUND_CHANNEL_SIZE, InboundChannel, InboundMessage, InboundReceiver, InboundSender,
};
pub use ingest::{Ack, FrameIngest};
pub use playback::{DroppedFrame, PlaybackBuffer};
pub use registry::{Output, OutputRegistry};
pub use scheduler::{
    Clock, EngineConfig, FrameScheduler, LoopState, SchedulerTimings, TickReport,
};

pub use color::Rgb;
pub use embassy_time::Duration;
