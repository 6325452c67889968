//! # Request Intake
//!
//! The local-network HTTP surface: two POST routes taking raw text
//! bodies. There is no auth and no error status path — once a body is
//! accepted the response is `200 OK`, produced only after the animation
//! has finished and the device gate is released, so callers observe true
//! completion rather than mere acceptance.
//!
//! The router is built separately from `serve` so tests can drive it
//! with `tower::ServiceExt::oneshot` and no socket.

use axum::extract::State;
use axum::routing::post;
use axum::Router;

use crate::config::Config;
use crate::gate::{SharedBeat, SharedMarquee};
use crate::handlers;
use crate::JobStatus;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub marquee: SharedMarquee,
    pub beat: SharedBeat,
    pub config: Config,
}

/// Build the axum Router with both intake routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/receive", post(receive_message))
        .route("/job", post(receive_job))
        .with_state(state)
}

/// POST /receive — scroll the body text across the marquee.
async fn receive_message(State(app): State<AppState>, body: String) -> &'static str {
    handlers::scroll_message(&app.marquee, &app.config.marquee, &body).await;
    "OK"
}

/// POST /job — pulse the status pixel for the body's status token.
async fn receive_job(State(app): State<AppState>, body: String) -> &'static str {
    handlers::job_pulse(&app.beat, JobStatus::parse(&body)).await;
    "OK"
}

/// Bind and serve forever. Local network only; callers on the LAN push
/// notifications at the clock with plain `curl`.
pub async fn serve(state: AppState, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("listening on http://{addr}");

    let app = build_router(state);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MarqueeConfig;
    use crate::device::mock::{BeatOp, RecordingBeat, RecordingMarquee};
    use crate::device::{BeatDisplay, Marquee, STATUS_PIXEL};
    use crate::gate::DeviceGate;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_state() -> (
        AppState,
        std::sync::Arc<std::sync::Mutex<Vec<BeatOp>>>,
    ) {
        let (marquee, _marquee_ops) = RecordingMarquee::new(2);
        let (beat, beat_ops) = RecordingBeat::new();
        let state = AppState {
            marquee: Arc::new(DeviceGate::new(
                "marquee",
                Box::new(marquee) as Box<dyn Marquee>,
            )),
            beat: Arc::new(DeviceGate::new("beat", Box::new(beat) as Box<dyn BeatDisplay>)),
            config: Config {
                // Keep the scroll animation short for route tests
                marquee: MarqueeConfig {
                    scroll_step_ms: 0,
                    post_scroll_pause_ms: 0,
                    ..MarqueeConfig::default()
                },
                ..Config::default()
            },
        };
        (state, beat_ops)
    }

    #[tokio::test]
    async fn receive_replies_ok_after_the_animation() {
        let (state, _) = test_state();
        let marquee = state.marquee.clone();

        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/receive")
                    .body(Body::from("hello"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"OK");
        // Response means the gate was already released
        assert!(!marquee.is_held());
    }

    #[tokio::test]
    async fn job_route_sets_the_status_pixel() {
        let (state, beat_ops) = test_state();

        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/job")
                    .body(Body::from("error"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let ops = beat_ops.lock().unwrap();
        assert!(ops.iter().any(|op| matches!(
            op,
            BeatOp::Set { index, rgb: (254, 0, 0), .. } if *index == STATUS_PIXEL
        )));
    }

    #[tokio::test]
    async fn garbled_job_body_is_still_ok() {
        let (state, _) = test_state();

        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/job")
                    .body(Body::from("☃ not a status"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (state, _) = test_state();

        let resp = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/nope")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
