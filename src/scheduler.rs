//! Frame scheduling loop
//!
//! The scheduler is the single owner of the output registry and the playback
//! buffer. Producers talk to it only through the inbound channel. Every tick
//! it handles at most one message, then decides which buffered frames to
//! render.
//!
//! Timestamps are wall-clock milliseconds since the epoch, supplied by a
//! [`Clock`]. Tolerance and stale windows are compared against the same
//! scale.

use embassy_time::{Duration, with_timeout};
use log::{debug, info, warn};

use crate::driver::{OutputDriver, PixelBuffer};
use crate::error::ConfigError;
use crate::frame::Frame;
use crate::inbound::{InboundMessage, InboundReceiver};
use crate::playback::PlaybackBuffer;
use crate::registry::OutputRegistry;

/// Frames within this distance of now are rendered
pub const DEFAULT_TOLERANCE: Duration = Duration::from_millis(10);

/// Frames older than this are dropped instead of rendered late
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_millis(1000);

/// Receive timeout while there is pending work
pub const DEFAULT_ACTIVE_POLL: Duration = Duration::from_millis(10);

/// Receive timeout while there is nothing to do
pub const DEFAULT_IDLE_POLL: Duration = Duration::from_millis(1000);

/// Default number of frames the playback buffer holds
pub const DEFAULT_BUFFER_CAPACITY: usize = 512;

/// Source of wall-clock time
pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_millis(&self) -> u64;
}

/// Timing knobs of the scheduler.
///
/// Tolerance and active poll are both around 10 ms by default, which makes
/// candidate selection sensitive to scheduling jitter under load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerTimings {
    /// Half-width of the window around now in which frames are rendered
    pub tolerance: Duration,
    /// Age after which an unrendered frame is dropped
    pub stale_after: Duration,
    /// Receive timeout in the active state
    pub active_poll: Duration,
    /// Receive timeout in the idle state
    pub idle_poll: Duration,
}

impl Default for SchedulerTimings {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            stale_after: DEFAULT_STALE_AFTER,
            active_poll: DEFAULT_ACTIVE_POLL,
            idle_poll: DEFAULT_IDLE_POLL,
        }
    }
}

/// Configuration for the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub timings: SchedulerTimings,
    /// Most frames kept in the playback buffer
    pub buffer_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timings: SchedulerTimings::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Work was done recently, poll with the short timeout
    Active,
    /// Nothing is pending, poll with the long timeout
    Idle,
}

/// Result of a scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// State after the tick
    pub state: LoopState,
    /// How long the next receive may wait
    pub poll_timeout: Duration,
    /// Whether a message was handled
    pub received: bool,
    /// Frames pushed to outputs
    pub rendered: usize,
    /// Buffered frames dropped as stale
    pub dropped: usize,
    /// Buffered frames discarded because their output went away
    pub purged: usize,
}

#[derive(Debug, Default)]
struct TickCounters {
    rendered: usize,
    dropped: usize,
    purged: usize,
}

/// Scheduler that buffers frames and renders them at their target time.
///
/// # Usage
///
/// ```ignore
/// static INBOUND: InboundChannel<16> = InboundChannel::new();
///
/// let mut scheduler = FrameScheduler::new(driver);
/// scheduler.run(INBOUND.receiver(), clock).await;
/// ```
pub struct FrameScheduler<D: OutputDriver> {
    registry: OutputRegistry<D>,
    playback: PlaybackBuffer,
    timings: SchedulerTimings,
    state: LoopState,
}

impl<D: OutputDriver> FrameScheduler<D> {
    /// Create a new scheduler with the default configuration
    pub fn new(driver: D) -> Self {
        Self::with_config(driver, &EngineConfig::default())
    }

    /// Create a new scheduler with custom timings and buffer size
    pub fn with_config(driver: D, config: &EngineConfig) -> Self {
        Self {
            registry: OutputRegistry::new(driver),
            playback: PlaybackBuffer::new(config.buffer_capacity),
            timings: config.timings,
            state: LoopState::Idle,
        }
    }

    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Receive timeout for the current state
    pub const fn poll_timeout(&self) -> Duration {
        match self.state {
            LoopState::Active => self.timings.active_poll,
            LoopState::Idle => self.timings.idle_poll,
        }
    }

    pub const fn registry(&self) -> &OutputRegistry<D> {
        &self.registry
    }

    pub const fn playback(&self) -> &PlaybackBuffer {
        &self.playback
    }

    pub const fn timings(&self) -> &SchedulerTimings {
        &self.timings
    }

    /// Run one scheduling step at `now`.
    ///
    /// Handles `message` if there is one, then runs the rendering decision
    /// over the playback buffer. Errors are logged and never stop the loop.
    pub fn tick(&mut self, message: Option<InboundMessage>, now: u64) -> TickReport {
        let mut counters = TickCounters::default();
        let received = message.is_some();

        if let Some(message) = message {
            self.handle(message, now, &mut counters);
        }
        if !self.playback.is_empty() {
            self.render_buffered(now, &mut counters);
        }

        self.state = if received || !self.playback.is_empty() {
            LoopState::Active
        } else {
            LoopState::Idle
        };

        TickReport {
            state: self.state,
            poll_timeout: self.poll_timeout(),
            received,
            rendered: counters.rendered,
            dropped: counters.dropped,
            purged: counters.purged,
        }
    }

    /// Wait for one message with the adaptive timeout, then tick
    pub async fn poll<C: Clock, const SIZE: usize>(
        &mut self,
        receiver: &InboundReceiver<'_, SIZE>,
        clock: &C,
    ) -> TickReport {
        let message = with_timeout(self.poll_timeout(), receiver.receive())
            .await
            .ok();
        self.tick(message, clock.now_millis())
    }

    /// Drive the scheduler for the lifetime of the program
    pub async fn run<C: Clock, const SIZE: usize>(
        &mut self,
        receiver: InboundReceiver<'_, SIZE>,
        clock: C,
    ) -> ! {
        info!("frame scheduler started");
        loop {
            self.poll(&receiver, &clock).await;
        }
    }

    fn handle(&mut self, message: InboundMessage, now: u64, counters: &mut TickCounters) {
        match message {
            InboundMessage::ConfigUpdate(config) => {
                debug!("applying config for {}", config.output_id);
                if let Err(err) = self.registry.apply_config(config) {
                    report_config_error(&err);
                }
            }
            InboundMessage::ConfigBatch(configs) => {
                debug!("applying batch of {} configs", configs.len());
                if let Err(err) = self.registry.apply_config_batch(&configs) {
                    report_config_error(&err);
                }
                counters.purged += self.purge_orphans();
            }
            InboundMessage::ConfigRemove(output_id) => {
                if self.registry.remove(&output_id) {
                    info!("removed output {}", output_id);
                }
                counters.purged += self.playback.clear(&output_id);
            }
            InboundMessage::Brightness {
                output_id,
                brightness,
            } => {
                if let Err(err) = self.registry.set_brightness(&output_id, brightness) {
                    report_config_error(&err);
                }
            }
            InboundMessage::Frame(frame) => self.handle_frame(frame, now, counters),
        }
    }

    fn handle_frame(&mut self, frame: Frame, now: u64, counters: &mut TickCounters) {
        if frame.clears_buffer() {
            let cleared = self.playback.clear(&frame.output_id);
            debug!("cleared {} buffered frames of {}", cleared, frame.output_id);
        }

        if frame.is_immediate() {
            if self.render(&frame) {
                counters.rendered += 1;
            }
            return;
        }

        // Frames are only buffered for outputs that are live
        if !self.registry.contains(&frame.output_id) {
            debug!(
                "no output {}, discarding frame at {}",
                frame.output_id, frame.timestamp
            );
            counters.purged += 1;
            return;
        }

        if frame.timestamp < now.saturating_sub(self.timings.stale_after.as_millis()) {
            debug!(
                "frame for {} at {} is already stale on arrival",
                frame.output_id, frame.timestamp
            );
        }
        if let Err(frame) = self.playback.enqueue(frame) {
            warn!(
                "playback buffer full ({} frames), dropping frame for {} at {}",
                self.playback.capacity(),
                frame.output_id,
                frame.timestamp
            );
        }
    }

    /// Render every buffered frame that is due and drop the stale ones
    fn render_buffered(&mut self, now: u64, counters: &mut TickCounters) {
        let registry = &self.registry;
        let drained = self.playback.drain_ready(
            now,
            self.timings.tolerance.as_millis(),
            self.timings.stale_after.as_millis(),
            |output_id| registry.contains(output_id),
        );

        for dropped in &drained.dropped {
            warn!(
                "buffered frame dropped: output {} timestamp {} cutoff {}",
                dropped.output_id, dropped.timestamp, dropped.cutoff
            );
        }
        counters.dropped += drained.dropped.len();
        counters.purged += drained.purged;

        for frame in &drained.ready {
            if self.render(frame) {
                counters.rendered += 1;
            }
        }
    }

    /// Write a frame to its output and flush it.
    ///
    /// Frames of unknown outputs are discarded, the output was most likely
    /// removed while the frame was in flight.
    fn render(&mut self, frame: &Frame) -> bool {
        let Some(output) = self.registry.lookup_mut(&frame.output_id) else {
            debug!("no output {}, discarding frame", frame.output_id);
            return false;
        };

        let buffer = output.buffer_mut();
        let count = buffer.len().min(frame.samples.len());
        buffer.write(&frame.samples[..count]);
        if let Err(err) = buffer.flush() {
            warn!("failed to render frame for {}: {}", frame.output_id, err);
            return false;
        }
        true
    }

    fn purge_orphans(&mut self) -> usize {
        let registry = &self.registry;
        let purged = self
            .playback
            .retain_outputs(|output_id| registry.contains(output_id));
        if purged > 0 {
            info!("purged {} frames of removed outputs", purged);
        }
        purged
    }
}

fn report_config_error(err: &ConfigError) {
    match err {
        // Already logged where the driver refused it
        ConfigError::AcquisitionFailed { .. } => {}
        _ => warn!("invalid output config: {}", err),
    }
}
