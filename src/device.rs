//! # Peripheral Driver Facade
//!
//! Thin traits over the two physical output devices: the scrolling
//! dot-matrix marquee and the 8-pixel, two-channel VU strip ("beat
//! display"). The real pixel-buffer drivers live behind these traits as
//! external collaborators; this module ships tracing-backed simulators so
//! the service runs (and is testable) on a desk with no hardware attached,
//! the same way the previous board deployment had an ASCII dev mode.
//!
//! Nothing here does any locking — exclusive access to a device is the
//! job of [`crate::gate::DeviceGate`], which owns the boxed device.

use std::io;
use thiserror::Error;

/// Visible columns on the marquee (17x7 dot matrix).
pub const MARQUEE_COLS: usize = 17;

/// Pixels per beat-display channel.
pub const BEAT_PIXELS: usize = 8;

/// Beat-display channel carrying the day-of-week indicator.
pub const DAY_CHANNEL: u8 = 0;

/// Beat-display channel carrying the minute-progress bar.
pub const PROGRESS_CHANNEL: u8 = 1;

/// The job-status pixel: leftmost pixel of channel 0. The day indicator
/// only ever lights columns 1..=7, so column 0 is free for status.
pub const STATUS_PIXEL: usize = 0;
pub const STATUS_CHANNEL: u8 = DAY_CHANNEL;
pub const STATUS_BRIGHTNESS: f32 = 0.05;

/// Errors surfaced by a device backend. The service logs these and keeps
/// going; a flaky bus must not take down the clock or the HTTP intake.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// Bus write failed (I2C/SPI transfer error from the backend)
    #[error("bus write failed: {0}")]
    Bus(#[from] io::Error),
}

/// Marquee fonts. The clock uses the small face so `HH:MM` fits the 17
/// visible columns; scrolled messages use the tall face for legibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Font {
    Small3x5,
    Tall5x7,
}

impl Font {
    /// Rendered width of one glyph plus its trailing spacing column.
    pub fn advance(&self) -> usize {
        match self {
            Font::Small3x5 => 4,
            Font::Tall5x7 => 6,
        }
    }
}

/// The scrolling dot-matrix display. Buffer mutations (`clear`, `write`,
/// `scroll`) are in-memory and infallible; only `show` touches the bus.
pub trait Marquee: Send {
    /// Reset the pixel buffer to blank.
    fn clear(&mut self);

    /// Render `text` into the buffer at the given brightness. The buffer
    /// grows to fit the text, which is what makes long messages scrollable.
    fn write(&mut self, text: &str, brightness: f32, font: Font);

    /// Shift the visible window right by `cols` columns.
    fn scroll(&mut self, cols: usize);

    /// Push the buffer to the device.
    fn show(&mut self) -> Result<(), DeviceError>;

    /// Current buffer width in columns (>= the visible width).
    fn buffer_width(&self) -> usize;

    /// Set display orientation. Applied once at startup.
    fn flip(&mut self, x: bool, y: bool);
}

/// The 8-pixel, two-channel VU strip. Both channels share one physical
/// bus, which is why a single gate covers the whole device.
pub trait BeatDisplay: Send {
    /// Stage one pixel's color on a channel. Out-of-range indices are
    /// ignored by backends rather than panicking.
    fn set_pixel(&mut self, index: usize, r: u8, g: u8, b: u8, brightness: f32, channel: u8);

    /// Stage a whole channel dark.
    fn clear(&mut self, channel: u8);

    /// Push staged pixels to the device.
    fn show(&mut self) -> Result<(), DeviceError>;
}

/// Marquee simulator: tracks buffer geometry and logs what the hardware
/// would show.
pub struct SimMarquee {
    text: String,
    cols: usize,
    offset: usize,
}

impl SimMarquee {
    pub fn new() -> Self {
        SimMarquee {
            text: String::new(),
            cols: MARQUEE_COLS,
            offset: 0,
        }
    }
}

impl Default for SimMarquee {
    fn default() -> Self {
        Self::new()
    }
}

impl Marquee for SimMarquee {
    fn clear(&mut self) {
        self.text.clear();
        self.cols = MARQUEE_COLS;
        self.offset = 0;
    }

    fn write(&mut self, text: &str, brightness: f32, font: Font) {
        self.text = text.to_string();
        self.cols = MARQUEE_COLS.max(text.chars().count() * font.advance());
        tracing::debug!(%text, brightness, "marquee write");
    }

    fn scroll(&mut self, cols: usize) {
        self.offset = (self.offset + cols) % self.cols.max(1);
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        tracing::trace!(text = %self.text, offset = self.offset, "marquee show");
        Ok(())
    }

    fn buffer_width(&self) -> usize {
        self.cols
    }

    fn flip(&mut self, x: bool, y: bool) {
        tracing::debug!(x, y, "marquee flip");
    }
}

/// Beat-display simulator: keeps the staged pixel state per channel and
/// logs frames as they are shown.
pub struct SimBeat {
    channels: [[(u8, u8, u8, f32); BEAT_PIXELS]; 2],
}

impl SimBeat {
    pub fn new() -> Self {
        SimBeat {
            channels: [[(0, 0, 0, 0.0); BEAT_PIXELS]; 2],
        }
    }

    /// Staged color of one pixel, for inspection.
    pub fn pixel(&self, index: usize, channel: u8) -> (u8, u8, u8, f32) {
        self.channels[channel as usize][index]
    }
}

impl Default for SimBeat {
    fn default() -> Self {
        Self::new()
    }
}

impl BeatDisplay for SimBeat {
    fn set_pixel(&mut self, index: usize, r: u8, g: u8, b: u8, brightness: f32, channel: u8) {
        if index >= BEAT_PIXELS || channel > 1 {
            return;
        }
        self.channels[channel as usize][index] = (r, g, b, brightness);
    }

    fn clear(&mut self, channel: u8) {
        if channel > 1 {
            return;
        }
        self.channels[channel as usize] = [(0, 0, 0, 0.0); BEAT_PIXELS];
    }

    fn show(&mut self) -> Result<(), DeviceError> {
        tracing::trace!(channels = ?self.channels, "beat show");
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_beat_set_and_clear() {
        let mut beat = SimBeat::new();
        beat.set_pixel(3, 0, 0, 254, 1.0, DAY_CHANNEL);
        assert_eq!(beat.pixel(3, DAY_CHANNEL), (0, 0, 254, 1.0));

        beat.clear(DAY_CHANNEL);
        assert_eq!(beat.pixel(3, DAY_CHANNEL), (0, 0, 0, 0.0));
    }

    #[test]
    fn sim_beat_ignores_out_of_range() {
        let mut beat = SimBeat::new();
        beat.set_pixel(BEAT_PIXELS, 254, 0, 0, 1.0, 0);
        beat.set_pixel(0, 254, 0, 0, 1.0, 2);
        for i in 0..BEAT_PIXELS {
            assert_eq!(beat.pixel(i, 0), (0, 0, 0, 0.0));
        }
    }

    #[test]
    fn sim_marquee_buffer_grows_with_text() {
        let mut marquee = SimMarquee::new();
        assert_eq!(marquee.buffer_width(), MARQUEE_COLS);

        marquee.write("hello world", 1.0, Font::Tall5x7);
        assert_eq!(marquee.buffer_width(), 11 * Font::Tall5x7.advance());

        marquee.clear();
        assert_eq!(marquee.buffer_width(), MARQUEE_COLS);
    }

    #[test]
    fn short_text_never_shrinks_below_visible_width() {
        let mut marquee = SimMarquee::new();
        marquee.write("hi", 0.1, Font::Small3x5);
        assert_eq!(marquee.buffer_width(), MARQUEE_COLS);
    }
}
