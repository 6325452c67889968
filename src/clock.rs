//! # Clock Loop
//!
//! The perpetual once-per-second task: renders `HH:MM` on the marquee,
//! keeps the day-of-week pixel and the minute-progress bar current on the
//! beat display, and backs off whenever an animation holds a device.
//!
//! Every device touch here is deliberately skippable. Missing one second
//! of display update is invisible; a clock loop wedged behind a slow
//! animation is not. So beat-display sub-updates go through the bounded
//! retry on the gate, and the marquee redraw is skipped outright when the
//! gate is held.
//!
//! The hour/minute caches are advanced even when a redraw loses the
//! retry, so a stale hour is retried at most once instead of on every
//! tick while an animation runs. They are a cache, not truth: losing them
//! just costs one redundant redraw.

use std::time::Duration;

use crate::brightness::brightness;
use crate::device::{Font, BEAT_PIXELS, DAY_CHANNEL, PROGRESS_CHANNEL};
use crate::gate::{RetryPolicy, SharedBeat, SharedMarquee};
use crate::TimeSample;

/// Day-of-week pixel color (blue).
const DAY_RGB: (u8, u8, u8) = (0, 0, 254);

/// Minute-progress bar color (dim amber).
const PROGRESS_RGB: (u8, u8, u8) = (254, 140, 0);
const PROGRESS_BRIGHTNESS: f32 = 0.05;

/// Last-rendered hour and minute. `None` means "unset", forcing a full
/// redraw on the first tick after startup.
#[derive(Debug, Default)]
struct RenderState {
    last_hour: Option<u32>,
    last_minute: Option<u32>,
}

/// The clock rendering task. Constructed once at startup with handles to
/// both device gates; [`ClockLoop::run`] never returns.
pub struct ClockLoop {
    marquee: SharedMarquee,
    beat: SharedBeat,
    retry: RetryPolicy,
    state: RenderState,
}

impl ClockLoop {
    pub fn new(marquee: SharedMarquee, beat: SharedBeat, retry: RetryPolicy) -> Self {
        ClockLoop {
            marquee,
            beat,
            retry,
            state: RenderState::default(),
        }
    }

    /// Run forever, one tick per second. Only exits with the process.
    pub async fn run(mut self) {
        loop {
            let now = TimeSample::now();
            self.tick(&now).await;
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
    }

    /// One iteration of the loop, driven by an externally sampled time so
    /// tests can replay exact instants.
    pub async fn tick(&mut self, now: &TimeSample) {
        // One log line per minute, not sixty
        if now.second < 2 {
            tracing::debug!("{now}");
        }

        if self.state.last_hour != Some(now.hour) {
            self.redraw_day_of_week(now).await;
            self.state.last_hour = Some(now.hour);
        }

        if self.state.last_minute != Some(now.minute) {
            self.redraw_minute_progress(now).await;
            self.state.last_minute = Some(now.minute);
        }

        let level = brightness(now.hour, now.minute, now.second);
        if self.marquee.is_held() {
            tracing::debug!("marquee gate is held, skipping clock update");
        } else {
            self.show_time(&now.hhmm(), level).await;
        }
    }

    /// Hourly beat-display update: move the day pixel and reset the
    /// minute-progress bar. Columns count down from the right, so Monday
    /// (weekday 0) lights pixel 7 and Sunday pixel 1.
    async fn redraw_day_of_week(&self, now: &TimeSample) {
        let Some(mut beat) = self.beat.acquire_retry(&self.retry).await else {
            return;
        };
        beat.clear(DAY_CHANNEL);
        let day_led = (BEAT_PIXELS - 1) - now.weekday.min(6) as usize;
        let (r, g, b) = DAY_RGB;
        beat.set_pixel(day_led, r, g, b, 1.0, DAY_CHANNEL);
        // New hour: the progress bar starts over
        beat.clear(PROGRESS_CHANNEL);
        if let Err(e) = beat.show() {
            tracing::warn!("beat display update failed: {e}");
        }
    }

    /// Light the minute-progress bar from pixel `7 - minute/10` through 7.
    /// Pixels left of the bar were cleared when the hour rolled over, so
    /// this only ever extends the lit range.
    async fn redraw_minute_progress(&self, now: &TimeSample) {
        let Some(mut beat) = self.beat.acquire_retry(&self.retry).await else {
            return;
        };
        let first = (BEAT_PIXELS - 1) - (now.minute / 10).min(6) as usize;
        let (r, g, b) = PROGRESS_RGB;
        for x in first..BEAT_PIXELS {
            beat.set_pixel(x, r, g, b, PROGRESS_BRIGHTNESS, PROGRESS_CHANNEL);
        }
        if let Err(e) = beat.show() {
            tracing::warn!("beat display update failed: {e}");
        }
    }

    /// Redraw `HH:MM`. The caller already saw the gate free, but that
    /// check is racy, so take the gate with a short poll and skip on loss.
    async fn show_time(&self, text: &str, level: f32) {
        let Some(mut marquee) = self.marquee.acquire_timeout(self.retry.poll_timeout).await
        else {
            tracing::debug!("marquee gate taken mid-tick, skipping clock update");
            return;
        };
        marquee.clear();
        marquee.write(text, level, Font::Small3x5);
        if let Err(e) = marquee.show() {
            tracing::warn!("marquee update failed: {e}");
        }
    }
}
