//! # Xiaoai Teleop
//!
//! Drive the Xiaoai 4-DOF arm from a gamepad.
//!
//! This application loads a teleoperation config, connects the configured
//! teleoperator and runs the control loop, logging every tick.

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use xiaoai_teleop::config::{Config, RecordingConfig};
use xiaoai_teleop::recording::{EpisodeRecorder, TickRecord};
use xiaoai_teleop::teleop::make_teleoperator;

/// Config file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name of the diagnostic log written next to the recordings
const LOG_FILE_NAME: &str = "xiaoai-teleop.log";

/// Sets up console logging, plus a non-blocking file log in the recording
/// directory when recording is enabled.
///
/// The returned guard must be held for the life of the program so buffered
/// log lines are flushed on exit.
fn init_logging(
    recording: &RecordingConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    let filter = EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into());

    let (file_layer, guard) = if recording.enabled {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_NAME)
            .build(&recording.log_dir)
            .with_context(|| format!("Failed to open log file in {}", recording.log_dir))?;
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false);
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Main entry point for Xiaoai Teleop
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up logging
///    - Connect, calibrate and configure the teleoperator
///
/// 2. **Main Loop** (at `control.fps`)
///    - Read the action and clamp it with the robot's `max_relative_target`
///    - Read teleop events; success or terminate ends the current episode
///    - Record the tick
///    - Log status every `control.log_interval_frames` ticks
///
/// 3. **Graceful Shutdown** on Ctrl+C or gamepad loss
///    - Disconnect the teleoperator
///    - Flush the recording
///
/// # Errors
///
/// Returns error if:
/// - The configuration cannot be loaded
/// - No gamepad can be opened
/// - The recording directory cannot be created
#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    let _log_guard = init_logging(&config.recording)?;

    info!("Xiaoai Teleop v{} starting...", env!("CARGO_PKG_VERSION"));
    info!(
        "Teleoperator '{}', robot '{}' on {}",
        config.teleop.type_name(),
        config.robot.type_name(),
        config.robot.port()
    );

    let mut teleop = make_teleoperator(config.teleop.clone());
    teleop.connect().context("Failed to connect teleoperator")?;
    if !teleop.is_calibrated() {
        teleop.calibrate()?;
    }
    teleop.configure()?;

    let mut recorder = if config.recording.enabled {
        Some(EpisodeRecorder::new(&config.recording)?)
    } else {
        None
    };

    let mut ticker = interval(config.control.period());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Starting control loop at {}Hz", config.control.fps);
    info!("Press Ctrl+C to exit");

    let mut frame: u64 = 0;
    let mut episode: u64 = 0;

    // Main control loop
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !teleop.is_connected() {
                    warn!("Gamepad stopped responding, shutting down...");
                    break;
                }

                let mut action = teleop.get_action();
                config.robot.limit_action(&mut action);
                let events = teleop.get_teleop_events();

                if let Some(recorder) = recorder.as_mut() {
                    let record = TickRecord {
                        timestamp: Utc::now(),
                        episode,
                        frame,
                        action: &action,
                        events,
                    };
                    if let Err(e) = recorder.record(&record) {
                        warn!("Failed to record frame {}: {}", frame, e);
                    }
                }

                frame += 1;

                if events.success || events.terminate_episode {
                    info!(
                        "Episode {} ended at frame {} (success: {}, rerecord: {})",
                        episode, frame, events.success, events.rerecord_episode
                    );
                    episode += 1;
                }

                if frame % config.control.log_interval_frames == 0 {
                    info!("Frame {} (episode {}): {:?}", frame, episode, action);
                }
            }

            // Handle Ctrl+C for graceful shutdown
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    teleop.disconnect();
    if let Some(recorder) = recorder.as_mut() {
        recorder.flush()?;
    }
    info!("Total frames: {}, episodes: {}", frame, episode);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/default.toml");
        let config = Config::load(path).unwrap();
        assert_eq!(config.teleop.type_name(), "xiaoai_gamepad");
        assert_eq!(config.robot.type_name(), "xiaoai");
    }
}
