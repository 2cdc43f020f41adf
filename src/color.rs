use smart_leds::RGB8;

/// One 8-bit-per-channel color sample
pub type Rgb = RGB8;
