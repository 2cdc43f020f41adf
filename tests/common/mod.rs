#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use pixel_playback::{
    AcquireError, Clock, FlushError, OutputConfig, OutputDriver, Pin, PixelBuffer, Rgb,
};

pub const RED: Rgb = Rgb { r: 255, g: 0, b: 0 };
pub const GREEN: Rgb = Rgb { r: 0, g: 255, b: 0 };
pub const BLUE: Rgb = Rgb { r: 0, g: 0, b: 255 };
pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Some point in 2024, in milliseconds since the epoch
pub const T0: u64 = 1_717_000_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Acquire { pin: Pin, leds: u16, brightness: u8 },
    Release(Pin),
    Brightness { pin: Pin, brightness: u8 },
    Flush { pin: Pin, pixels: Vec<Rgb> },
}

pub type EventLog = Rc<RefCell<Vec<Event>>>;

/// Driver recording every call it receives
pub struct MockDriver {
    events: EventLog,
    live: Vec<Pin>,
    unavailable: Vec<Pin>,
    failing_flush: Vec<Pin>,
}

impl MockDriver {
    pub fn new() -> (Self, EventLog) {
        let events = EventLog::default();
        let driver = Self {
            events: events.clone(),
            live: Vec::new(),
            unavailable: Vec::new(),
            failing_flush: Vec::new(),
        };
        (driver, events)
    }

    /// Pins the hardware refuses to hand out
    pub fn with_unavailable(mut self, pins: &[Pin]) -> Self {
        self.unavailable.extend_from_slice(pins);
        self
    }

    /// Pins whose buffers fail to flush
    pub fn with_failing_flush(mut self, pins: &[Pin]) -> Self {
        self.failing_flush.extend_from_slice(pins);
        self
    }
}

impl OutputDriver for MockDriver {
    type Buffer = MockBuffer;

    fn acquire(&mut self, pin: Pin, leds: u16, brightness: u8) -> Result<MockBuffer, AcquireError> {
        if self.live.contains(&pin) {
            return Err(AcquireError::PinBusy(pin));
        }
        if self.unavailable.contains(&pin) {
            return Err(AcquireError::Unavailable(pin));
        }
        self.live.push(pin);
        self.events.borrow_mut().push(Event::Acquire {
            pin,
            leds,
            brightness,
        });
        Ok(MockBuffer {
            pin,
            pixels: vec![BLACK; usize::from(leds)],
            events: self.events.clone(),
            fail_flush: self.failing_flush.contains(&pin),
        })
    }

    fn release(&mut self, buffer: MockBuffer) {
        self.live.retain(|pin| *pin != buffer.pin);
        self.events.borrow_mut().push(Event::Release(buffer.pin));
    }
}

pub struct MockBuffer {
    pin: Pin,
    pixels: Vec<Rgb>,
    events: EventLog,
    fail_flush: bool,
}

impl PixelBuffer for MockBuffer {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn write(&mut self, colors: &[Rgb]) {
        assert!(colors.len() <= self.pixels.len(), "write past the end of the strip");
        self.pixels[..colors.len()].copy_from_slice(colors);
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.events.borrow_mut().push(Event::Brightness {
            pin: self.pin,
            brightness,
        });
    }

    fn flush(&mut self) -> Result<(), FlushError> {
        if self.fail_flush {
            return Err(FlushError);
        }
        self.events.borrow_mut().push(Event::Flush {
            pin: self.pin,
            pixels: self.pixels.clone(),
        });
        Ok(())
    }
}

/// Pixels of every flush, in order
pub fn flushes(events: &EventLog) -> Vec<(Pin, Vec<Rgb>)> {
    events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::Flush { pin, pixels } => Some((*pin, pixels.clone())),
            _ => None,
        })
        .collect()
}

pub fn acquisitions(events: &EventLog) -> usize {
    events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Acquire { .. }))
        .count()
}

pub fn strip(output_id: &str, pin: Pin, leds: u16) -> OutputConfig {
    OutputConfig::new(output_id, pin, leds, 50)
}

pub struct FixedClock(pub u64);

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0
    }
}
