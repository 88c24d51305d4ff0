//! Playback control: play, loop, pause, seek and speed

use crate::{MediaStream, RateError, SeekError, SessionHandle};
use tracing::warn;

/// Playback state as seen through a session handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PlaybackState {
    #[default]
    Paused,
    /// Playing once through, stopping at the end
    Playing,
    /// Playing and restarting at the end
    PlayingLooping,
}

impl<S: MediaStream> SessionHandle<S> {
    /// Starts or resumes playback until the end of the stream.
    ///
    /// Sessions start out paused; call this or [`loop_playback`](Self::loop_playback).
    pub fn play(&mut self) {
        self.with_live_mut((), |live| {
            live.looping = false;
            live.stream.set_looping(false);
            live.stream.start();
        });
    }

    /// Starts or resumes playback, restarting at the end of the stream.
    pub fn loop_playback(&mut self) {
        self.with_live_mut((), |live| {
            live.looping = true;
            live.stream.set_looping(true);
            live.stream.start();
        });
    }

    /// Pauses playback. The looping flag is kept.
    pub fn pause(&mut self) {
        self.with_live_mut((), |live| live.stream.stop());
    }

    /// Stops a looping session after its current iteration without pausing it.
    pub fn no_loop(&mut self) {
        self.with_live_mut((), |live| {
            live.looping = false;
            live.stream.set_looping(false);
        });
    }

    /// Jumps to `position` seconds from the start.
    ///
    /// Negative or non-finite positions are rejected without asking the
    /// backend. A rejected seek leaves playback untouched.
    pub fn seek(&mut self, position: f64) -> Result<(), SeekError> {
        self.with_live_mut(Ok(()), |live| {
            if !position.is_finite() || position < 0.0 || !live.stream.seek(position) {
                warn!(position, "cannot jump to position");
                return Err(SeekError::Unsupported { position });
            }
            Ok(())
        })
    }

    /// Changes the playback speed; `1.0` is real time.
    ///
    /// Negative rates (and NaN) are not supported. What a rate of exactly
    /// `0.0` does is up to the backend.
    pub fn set_rate(&mut self, rate: f64) -> Result<(), RateError> {
        self.with_live_mut(Ok(()), |live| {
            // also rejects NaN
            if !(rate >= 0.0) || !live.stream.set_rate(rate) {
                warn!(rate, "cannot set speed");
                return Err(RateError::Unsupported { rate });
            }
            Ok(())
        })
    }

    /// True while playing, including when playback is stalled on buffering.
    pub fn is_playing(&self) -> bool {
        self.with_live(false, |live| live.stream.is_playing())
    }

    pub fn state(&self) -> PlaybackState {
        self.with_live(PlaybackState::Paused, |live| {
            match (live.stream.is_playing(), live.looping) {
                (false, _) => PlaybackState::Paused,
                (true, false) => PlaybackState::Playing,
                (true, true) => PlaybackState::PlayingLooping,
            }
        })
    }

    /// Total length in seconds
    pub fn duration_seconds(&self) -> f64 {
        self.with_live(0.0, |live| live.stream.duration())
    }

    /// Current position in seconds
    pub fn position_seconds(&self) -> f64 {
        self.with_live(0.0, |live| live.stream.position())
    }

    /// Native width in pixels
    pub fn width(&self) -> u32 {
        self.with_live(0, |live| live.stream.width())
    }

    /// Native height in pixels
    pub fn height(&self) -> u32 {
        self.with_live(0, |live| live.stream.height())
    }

    /// Native frame rate in frames per second
    pub fn frame_rate_hz(&self) -> f64 {
        self.with_live(0.0, |live| live.stream.frame_rate())
    }
}
