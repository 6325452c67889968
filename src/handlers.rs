//! # Animation Handlers
//!
//! The two request-triggered behaviors: scrolling a text message across
//! the marquee and pulsing the job-status pixel on the beat display.
//!
//! Both acquire their device gate with the *blocking* policy — an
//! accepted request must eventually run, so concurrent requests serialize
//! on the gate rather than being dropped. That is deliberate
//! backpressure: a second message waits out the first one's animation.
//!
//! The gate guard is held across the animation's sleeps and dropped when
//! the handler returns, which is what lets the HTTP layer respond only
//! after true completion. Device write failures are logged and swallowed;
//! they never change the HTTP response.

use crate::config::MarqueeConfig;
use crate::device::{Font, STATUS_BRIGHTNESS, STATUS_CHANNEL, STATUS_PIXEL};
use crate::gate::{SharedBeat, SharedMarquee};
use crate::JobStatus;

/// Scroll `text` across the marquee at full brightness, then hold so the
/// tail of the message stays readable.
///
/// The input is truncated to `max_message_len` characters first, which
/// bounds the animation (and thus how long this call can hold the gate).
/// `2 x buffer_width` one-column steps is enough to carry the whole
/// rendered string off-screen.
pub async fn scroll_message(marquee: &SharedMarquee, cfg: &MarqueeConfig, text: &str) {
    let message: String = text.chars().take(cfg.max_message_len).collect();
    tracing::debug!(message = %message, "received message");

    let mut device = marquee.acquire().await;
    device.clear();
    device.write(&message, 1.0, Font::Tall5x7);

    let width = device.buffer_width();
    for _ in 0..width * 2 {
        if let Err(e) = device.show() {
            tracing::warn!("marquee update failed: {e}");
        }
        device.scroll(1);
        tokio::time::sleep(cfg.scroll_step()).await;
    }
    tokio::time::sleep(cfg.post_scroll_pause()).await;
    // Guard drops here; the next clock tick repaints the time
}

/// Set the status pixel to the color for `status`. Idempotent: the same
/// status always lands the same pixel state regardless of what was there.
pub async fn job_pulse(beat: &SharedBeat, status: JobStatus) {
    tracing::debug!(?status, "job status pulse");

    let mut device = beat.acquire().await;
    // Drop whatever color was staged before writing the new one
    device.set_pixel(STATUS_PIXEL, 0, 0, 0, 0.0, STATUS_CHANNEL);
    let (r, g, b) = status.rgb();
    device.set_pixel(STATUS_PIXEL, r, g, b, STATUS_BRIGHTNESS, STATUS_CHANNEL);
    if let Err(e) = device.show() {
        tracing::warn!("beat display update failed: {e}");
    }
}
