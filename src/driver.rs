//! LED driver abstraction layer
//!
//! The engine never touches hardware directly. It asks an [`OutputDriver`]
//! for a [`PixelBuffer`] per configured pin and hands the buffer back when
//! the output is reconfigured or removed.

use alloc::vec;
use alloc::vec::Vec;
use core::marker::PhantomData;

use smart_leds::{SmartLedsWrite, brightness};

use crate::color::Rgb;
use crate::config::{MAX_BRIGHTNESS, Pin};
use crate::error::{AcquireError, FlushError};

/// Writable pixel memory of one LED strip
pub trait PixelBuffer {
    /// Number of addressable pixels
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write colors starting at the first pixel.
    ///
    /// Colors past the end of the strip are ignored and pixels past the end
    /// of `colors` keep their previous value.
    fn write(&mut self, colors: &[Rgb]);

    /// Change the output gain, in percent (0-100)
    fn set_brightness(&mut self, brightness: u8);

    /// Push the pixel memory to the strip
    fn flush(&mut self) -> Result<(), FlushError>;
}

/// Abstract LED driver trait
///
/// Implement this trait to support different hardware platforms.
/// The scheduler is generic over this trait.
pub trait OutputDriver {
    type Buffer: PixelBuffer;

    /// Claim `pin` and return a buffer of `leds` pixels.
    ///
    /// Must fail while another buffer for the same pin is live.
    fn acquire(&mut self, pin: Pin, leds: u16, brightness: u8)
    -> Result<Self::Buffer, AcquireError>;

    /// Return a buffer, freeing its pin
    fn release(&mut self, buffer: Self::Buffer);
}

/// Convert a 0-100 brightness into a 0-255 gain
pub fn gain_from_brightness(brightness: u8) -> u8 {
    let scaled = u16::from(brightness.min(MAX_BRIGHTNESS)) * u16::from(u8::MAX)
        / u16::from(MAX_BRIGHTNESS);
    u8::try_from(scaled).unwrap_or(u8::MAX)
}

/// Driver backed by [`SmartLedsWrite`] writers.
///
/// Writers are created on demand by `factory`, which returns `None` if the
/// pin cannot be driven on this board.
pub struct SmartLedsDriver<F, W> {
    factory: F,
    claimed: [bool; Pin::COUNT],
    _writer: PhantomData<fn() -> W>,
}

impl<F, W> SmartLedsDriver<F, W>
where
    F: FnMut(Pin) -> Option<W>,
    W: SmartLedsWrite<Color = Rgb>,
{
    pub const fn new(factory: F) -> Self {
        Self {
            factory,
            claimed: [false; Pin::COUNT],
            _writer: PhantomData,
        }
    }

    /// Returns true if a live buffer currently drives `pin`
    pub const fn is_claimed(&self, pin: Pin) -> bool {
        self.claimed[pin.index()]
    }
}

impl<F, W> OutputDriver for SmartLedsDriver<F, W>
where
    F: FnMut(Pin) -> Option<W>,
    W: SmartLedsWrite<Color = Rgb>,
{
    type Buffer = SmartLedsBuffer<W>;

    fn acquire(
        &mut self,
        pin: Pin,
        leds: u16,
        brightness: u8,
    ) -> Result<Self::Buffer, AcquireError> {
        if self.is_claimed(pin) {
            return Err(AcquireError::PinBusy(pin));
        }
        let writer = (self.factory)(pin).ok_or(AcquireError::Unavailable(pin))?;
        self.claimed[pin.index()] = true;

        Ok(SmartLedsBuffer {
            pin,
            writer,
            pixels: vec![Rgb::default(); usize::from(leds)],
            gain: gain_from_brightness(brightness),
        })
    }

    fn release(&mut self, buffer: Self::Buffer) {
        self.claimed[buffer.pin.index()] = false;
    }
}

/// Pixel memory in front of a [`SmartLedsWrite`] writer
pub struct SmartLedsBuffer<W> {
    pin: Pin,
    writer: W,
    pixels: Vec<Rgb>,
    gain: u8,
}

impl<W> SmartLedsBuffer<W> {
    pub const fn pin(&self) -> Pin {
        self.pin
    }

    /// Current pixel memory, before gain
    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    /// Current gain (0-255)
    pub const fn gain(&self) -> u8 {
        self.gain
    }

    pub const fn writer(&self) -> &W {
        &self.writer
    }
}

impl<W: SmartLedsWrite<Color = Rgb>> PixelBuffer for SmartLedsBuffer<W> {
    fn len(&self) -> usize {
        self.pixels.len()
    }

    fn write(&mut self, colors: &[Rgb]) {
        let count = colors.len().min(self.pixels.len());
        self.pixels[..count].copy_from_slice(&colors[..count]);
    }

    fn set_brightness(&mut self, brightness: u8) {
        self.gain = gain_from_brightness(brightness);
    }

    fn flush(&mut self) -> Result<(), FlushError> {
        self.writer
            .write(brightness(self.pixels.iter().copied(), self.gain))
            .map_err(|_| FlushError)
    }
}
