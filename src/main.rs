//! # Pixel Clock Entry Point
//!
//! Wires the pieces together: configuration, the two gated devices, the
//! clock loop task, and the HTTP intake. The clock loop and the server
//! run as separate tasks with independent failure domains — a defect in
//! one is logged without taking the other down.

use std::sync::Arc;

use pixel_clock_lib::clock::ClockLoop;
use pixel_clock_lib::config::Config;
use pixel_clock_lib::device::{
    BeatDisplay, Marquee, SimBeat, SimMarquee, DAY_CHANNEL, PROGRESS_CHANNEL,
};
use pixel_clock_lib::gate::{DeviceGate, RetryPolicy, SharedBeat, SharedMarquee};
use pixel_clock_lib::server::{self, AppState};

/// Clear both peripherals to a known blank state. Nothing persists
/// across restarts; the clock loop's unset caches force a full redraw on
/// its first tick.
async fn blank_displays(marquee: &SharedMarquee, beat: &SharedBeat) {
    {
        let mut device = marquee.acquire().await;
        device.clear();
        if let Err(e) = device.show() {
            tracing::warn!("marquee blank failed: {e}");
        }
    }
    let mut device = beat.acquire().await;
    device.clear(DAY_CHANNEL);
    device.clear(PROGRESS_CHANNEL);
    if let Err(e) = device.show() {
        tracing::warn!("beat display blank failed: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_target(false)
        .init();

    let config = Config::load();

    // Simulated backends; the real pixel-buffer drivers plug in behind
    // the same traits.
    let mut marquee_dev = SimMarquee::new();
    marquee_dev.flip(config.marquee.flip_x, config.marquee.flip_y);

    let marquee: SharedMarquee = Arc::new(DeviceGate::new(
        "marquee",
        Box::new(marquee_dev) as Box<dyn Marquee>,
    ));
    let beat: SharedBeat = Arc::new(DeviceGate::new(
        "beat",
        Box::new(SimBeat::new()) as Box<dyn BeatDisplay>,
    ));

    blank_displays(&marquee, &beat).await;

    tracing::info!("starting clock loop");
    let retry = RetryPolicy::from(&config.retry);
    let clock_task = tokio::spawn(ClockLoop::new(marquee.clone(), beat.clone(), retry).run());
    tokio::spawn(async move {
        // The clock loop never returns; reaching this at all is a defect.
        // Log it and keep serving requests.
        if let Err(e) = clock_task.await {
            tracing::error!("clock loop task aborted: {e}");
        }
    });

    let port = config.server.port;
    let state = AppState {
        marquee,
        beat,
        config,
    };
    server::serve(state, port).await
}
