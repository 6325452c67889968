//! # Marquee Brightness Policy
//!
//! A pure function of the current hour/minute/second — no state, no
//! locking. The schedule is a user-visible contract:
//!
//! - **Night mode**: hours 0 through 6, display off entirely
//! - **Hour flash**: first 6 seconds of every other hour at full brightness
//! - **Otherwise**: dim, always-on

/// Night-mode hours: from midnight through 06:59 the display is dark.
const NIGHT_END_HOUR: u32 = 6;

/// Seconds of full brightness at the top of each (non-night) hour.
const FLASH_SECONDS: u32 = 6;

/// Brightness level in [0.0, 1.0] for a given wall-clock instant.
pub fn brightness(hour: u32, minute: u32, second: u32) -> f32 {
    if hour <= NIGHT_END_HOUR {
        return 0.0;
    }
    if minute == 0 && second < FLASH_SECONDS {
        return 1.0;
    }
    0.1
}
