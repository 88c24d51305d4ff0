//! GLVideo Decoder Library
//!
//! FFmpeg implementation of the `glvideo-core` decode backend. Each open
//! stream runs a decode thread that paces frames against a playback clock
//! and keeps only the latest one; the host's texture upload happens on the
//! render thread when the frame is fetched.

pub mod backend;
pub mod clock;
pub mod frame_slot;
mod pipeline;
pub mod video_reader;

pub use backend::{FfmpegBackend, FfmpegStream, TextureUploader};
pub use clock::PlaybackClock;
pub use frame_slot::{DecodedFrame, FrameSlot};
pub use video_reader::VideoReader;

use std::time::Duration;

/// Result type for glvideo-decoder operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for glvideo-decoder operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("FFmpeg error: {0}")]
    Ffmpeg(#[from] ffmpeg_next::Error),

    #[error("No video stream found")]
    NoVideoStream,

    #[error("Decoded frame has an invalid layout")]
    InvalidFrame,

    #[error("Decode thread exited unexpectedly")]
    WorkerGone,
}

/// Decoder configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Number of FFmpeg decode threads
    pub decode_threads: usize,
    /// Frames running later than this behind the clock are dropped
    pub max_frame_lag: Duration,
    /// How long the decode thread waits for commands while paused
    pub idle_poll: Duration,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            decode_threads: num_cpus::get(),
            max_frame_lag: Duration::from_millis(250),
            idle_poll: Duration::from_millis(50),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DecoderConfig::default();
        assert!(config.decode_threads >= 1);
        assert!(config.idle_poll < config.max_frame_lag);
    }
}
