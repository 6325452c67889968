//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! pixel-clock.toml file. It centralizes the HTTP port, marquee animation
//! timing, and the clock loop's lock-retry tuning.
//!
//! All defaults match the deployed constants, so the binary runs with no
//! config file at all; a file only needs the keys it wants to override.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Application configuration loaded from pixel-clock.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// HTTP intake configuration
    pub server: ServerConfig,
    /// Marquee orientation and animation timing
    pub marquee: MarqueeConfig,
    /// Clock loop bounded-retry tuning
    pub retry: RetryConfig,
}

/// HTTP intake configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to listen on (local network, no auth)
    pub port: u16,
}

/// Marquee orientation and animation timing
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MarqueeConfig {
    /// Flip display horizontally (board is mounted upside down)
    pub flip_x: bool,
    /// Flip display vertically
    pub flip_y: bool,
    /// Inbound messages are truncated to this many characters so a single
    /// request cannot hold the marquee for an unbounded time
    pub max_message_len: usize,
    /// Pause between one-column scroll steps, in milliseconds
    pub scroll_step_ms: u64,
    /// Hold after scrolling completes so the message tail stays readable
    pub post_scroll_pause_ms: u64,
}

/// Clock loop bounded-retry tuning.
///
/// The clock loop never blocks indefinitely on a device gate: it makes
/// `attempts` tries, each waiting at most `poll_timeout_ms` for the lock,
/// sleeping `backoff_ms` between tries, then gives up on that sub-update
/// for the tick.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    pub attempts: u32,
    pub poll_timeout_ms: u64,
    pub backoff_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            marquee: MarqueeConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { port: 8080 }
    }
}

impl Default for MarqueeConfig {
    fn default() -> Self {
        MarqueeConfig {
            flip_x: true,
            flip_y: true,
            max_message_len: 100,
            scroll_step_ms: 50,
            post_scroll_pause_ms: 2000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            attempts: 4,
            poll_timeout_ms: 10,
            backoff_ms: 500,
        }
    }
}

impl MarqueeConfig {
    /// Pause between scroll steps as a `Duration`.
    pub fn scroll_step(&self) -> Duration {
        Duration::from_millis(self.scroll_step_ms)
    }

    /// Post-scroll hold as a `Duration`.
    pub fn post_scroll_pause(&self) -> Duration {
        Duration::from_millis(self.post_scroll_pause_ms)
    }
}

impl Config {
    /// Load configuration from pixel-clock.toml.
    /// Falls back to default configuration if the file doesn't exist or
    /// is invalid — a bad config must never keep the clock from starting.
    pub fn load() -> Self {
        Self::load_from_path("pixel-clock.toml")
    }

    /// Load configuration from the specified path.
    /// Falls back to default configuration if the file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    tracing::info!(port = config.server.port, "loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!("invalid config file format: {e}");
                    tracing::warn!("using default configuration");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!("no config file found, using default configuration");
                Self::default()
            }
        }
    }

    /// Save current configuration to pixel-clock.toml
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)?;
        fs::write("pixel-clock.toml", contents)?;
        Ok(())
    }
}
