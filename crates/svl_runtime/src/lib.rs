//! SVL Runtime
//!
//! Timed playback on top of the replay engine. One loop task applies a
//! delta per tick; pause, reset and reload cancel it cleanly.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod playback;

pub use config::PlaybackConfig;
pub use playback::{PlaybackController, PlaybackState};
