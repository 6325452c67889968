//! # Pixel Clock Core Library
//!
//! This library drives two low-resolution LED peripherals on a Raspberry Pi
//! Zero class board: a scrolling dot-matrix "marquee" and an 8-pixel,
//! two-channel VU strip (the "beat display"). One process renders a live
//! clock and day-of-week indicator once per second while an HTTP intake
//! accepts short text messages and job-status events that interrupt the
//! clock with a scroll animation or a status-color pulse.
//!
//! ## Design Philosophy
//!
//! ### Cooperative multiplexing
//! Everything runs on a single Tokio runtime; concurrency comes from
//! voluntary suspension (sleeps, lock waits), not parallelism. Each
//! physical bus is owned by a [`gate::DeviceGate`] so the devices never
//! see interleaved writes:
//! - HTTP handlers block on the gate — an accepted request always runs.
//! - The clock loop uses a short bounded retry and skips a tick's
//!   sub-update rather than stall — a frozen clock is worse than a
//!   missed second.
//!
//! ### Failure containment
//! The clock loop and the HTTP server run as independent tasks; a defect
//! in one is logged and never aborts the other. Device write failures are
//! logged and swallowed — they affect the physical display, never an HTTP
//! response.
//!
//! ## Core Types
//!
//! The library root exports the two plain data types shared across
//! modules:
//! - [`TimeSample`]: an immutable wall-clock snapshot taken once per tick
//! - [`JobStatus`]: inbound status keyword mapped to a status-pixel color

use chrono::{Datelike, Local, Timelike};

// Module declarations
pub mod brightness;
pub mod clock;
pub mod config;
pub mod device;
pub mod gate;
pub mod handlers;
pub mod server;

/// An immutable snapshot of local wall-clock time, taken once per clock
/// tick and never mutated.
///
/// `weekday` follows the Monday=0 convention (`chrono`'s
/// `num_days_from_monday`), which is what the day-of-week indicator math
/// expects: Monday lights column 7, Sunday column 1.
///
/// # Example
/// ```
/// use pixel_clock_lib::TimeSample;
///
/// let sample = TimeSample {
///     year: 2024, month: 6, day: 12,
///     weekday: 2, // Wednesday
///     hour: 10, minute: 0, second: 3,
/// };
/// assert_eq!(sample.hhmm(), "10:00");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimeSample {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Day of week, Monday = 0 .. Sunday = 6
    pub weekday: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
}

impl TimeSample {
    /// Snapshot the current local time.
    pub fn now() -> Self {
        let now = Local::now();
        TimeSample {
            year: now.year(),
            month: now.month(),
            day: now.day(),
            weekday: now.weekday().num_days_from_monday(),
            hour: now.hour(),
            minute: now.minute(),
            second: now.second(),
        }
    }

    /// Render the zero-padded `HH:MM` string shown on the marquee.
    pub fn hhmm(&self) -> String {
        format!("{:02}:{:02}", self.hour, self.minute)
    }
}

impl std::fmt::Display for TimeSample {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02}({}) - {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.weekday, self.hour, self.minute, self.second
        )
    }
}

/// Job state received on `POST /job`, mapped deterministically to the
/// status pixel's color.
///
/// Unrecognized input is [`JobStatus::Unknown`] — never a parse error.
/// The caller-visible contract is "any body is accepted"; a garbled token
/// simply turns the pixel off.
///
/// # Example
/// ```
/// use pixel_clock_lib::JobStatus;
///
/// assert_eq!(JobStatus::parse("error"), JobStatus::Error);
/// assert_eq!(JobStatus::parse("error").rgb(), (254, 0, 0));
/// assert_eq!(JobStatus::parse("lunch break"), JobStatus::Unknown);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobStatus {
    Start,
    Finished,
    Error,
    Unknown,
}

impl JobStatus {
    /// Map an inbound token to a status. Leading/trailing whitespace is
    /// ignored; anything unrecognized is `Unknown`.
    pub fn parse(token: &str) -> Self {
        match token.trim() {
            "start" => JobStatus::Start,
            "finished" => JobStatus::Finished,
            "error" => JobStatus::Error,
            _ => JobStatus::Unknown,
        }
    }

    /// The RGB triple shown on the status pixel for this state.
    /// `Unknown` is off, so stale statuses are cleared rather than kept.
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            JobStatus::Start => (0, 254, 254),    // cyan
            JobStatus::Finished => (0, 254, 0),   // green
            JobStatus::Error => (254, 0, 0),      // red
            JobStatus::Unknown => (0, 0, 0),      // off
        }
    }
}
