//! Playback clock used to pace decoded frames
//!
//! Media time advances as `anchor_media + elapsed * rate` while running and
//! stands still while paused. Changing the rate re-anchors so the media time
//! stays continuous.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct PlaybackClock {
    anchor_media: f64,
    anchor: Option<Instant>,
    rate: f64,
}

impl Default for PlaybackClock {
    fn default() -> Self {
        Self {
            anchor_media: 0.0,
            anchor: None,
            rate: 1.0,
        }
    }
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    pub fn start(&mut self, now: Instant) {
        if self.anchor.is_none() {
            self.anchor = Some(now);
        }
    }

    pub fn pause(&mut self, now: Instant) {
        self.anchor_media = self.media_time(now);
        self.anchor = None;
    }

    /// Sets the real-time multiplier. A rate of 0 freezes media time.
    pub fn set_rate(&mut self, rate: f64, now: Instant) {
        self.reset(self.media_time(now), now);
        self.rate = rate;
    }

    /// Moves media time to `media` without changing the running state.
    pub fn reset(&mut self, media: f64, now: Instant) {
        self.anchor_media = media;
        if self.anchor.is_some() {
            self.anchor = Some(now);
        }
    }

    /// Current media time, saturating at `f64::MAX` for extreme rates.
    pub fn media_time(&self, now: Instant) -> f64 {
        match self.anchor {
            Some(anchor) => {
                let advanced = now.saturating_duration_since(anchor).as_secs_f64() * self.rate;
                let media = self.anchor_media + advanced;
                if media.is_finite() {
                    media
                } else {
                    f64::MAX
                }
            }
            None => self.anchor_media,
        }
    }

    /// How long to wait (in wall time) until a frame at `pts` is due.
    ///
    /// `None` means the frame is due now. If media time is not advancing
    /// the wait is unbounded and the caller is expected to cap it.
    pub fn wait_for(&self, pts: f64, now: Instant) -> Option<Duration> {
        let ahead = pts - self.media_time(now);
        if ahead <= 0.0 {
            return None;
        }
        if !self.is_running() || self.rate <= 0.0 {
            return Some(Duration::MAX);
        }
        Some(Duration::try_from_secs_f64(ahead / self.rate).unwrap_or(Duration::MAX))
    }

    /// How far (in media seconds) `pts` is behind the clock.
    pub fn lateness(&self, pts: f64, now: Instant) -> f64 {
        self.media_time(now) - pts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(value: f64) -> Duration {
        Duration::from_secs_f64(value)
    }

    #[test]
    fn test_paused_clock_stands_still() {
        let t0 = Instant::now();
        let clock = PlaybackClock::new();
        assert!(!clock.is_running());
        assert_eq!(clock.media_time(t0 + secs(5.0)), 0.0);
        assert_eq!(clock.wait_for(0.0, t0), None);
        assert_eq!(clock.wait_for(1.0, t0), Some(Duration::MAX));
    }

    #[test]
    fn test_running_clock_advances_with_rate() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        assert!((clock.media_time(t0 + secs(2.0)) - 2.0).abs() < 1e-9);

        clock.set_rate(2.0, t0 + secs(2.0));
        assert!((clock.media_time(t0 + secs(3.0)) - 4.0).abs() < 1e-9);

        // a frame at 5.0 is one media second ahead: half a second at 2x
        let wait = clock.wait_for(5.0, t0 + secs(3.0)).unwrap();
        assert!((wait.as_secs_f64() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_pause_and_resume_keep_position() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        clock.pause(t0 + secs(1.5));
        assert!((clock.media_time(t0 + secs(10.0)) - 1.5).abs() < 1e-9);

        clock.start(t0 + secs(10.0));
        assert!((clock.media_time(t0 + secs(11.0)) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_rate_freezes_time() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        clock.set_rate(0.0, t0 + secs(1.0));
        assert!((clock.media_time(t0 + secs(9.0)) - 1.0).abs() < 1e-9);
        assert_eq!(clock.wait_for(1.5, t0 + secs(9.0)), Some(Duration::MAX));
    }

    #[test]
    fn test_tiny_rate_waits_without_overflow() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        clock.set_rate(1e-20, t0);
        assert_eq!(
            clock.wait_for(1.0, t0 + Duration::from_millis(1)),
            Some(Duration::MAX)
        );
    }

    #[test]
    fn test_huge_rate_saturates_media_time() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        clock.set_rate(1e308, t0);
        let media = clock.media_time(t0 + secs(10.0));
        assert_eq!(media, f64::MAX);
        assert!(clock.lateness(3.0, t0 + secs(10.0)).is_finite());
        assert_eq!(clock.wait_for(3.0, t0 + secs(10.0)), None);
    }

    #[test]
    fn test_reset_and_lateness() {
        let t0 = Instant::now();
        let mut clock = PlaybackClock::new();
        clock.start(t0);
        clock.reset(30.0, t0 + secs(1.0));
        assert!((clock.media_time(t0 + secs(2.0)) - 31.0).abs() < 1e-9);
        assert!((clock.lateness(30.5, t0 + secs(2.0)) - 0.5).abs() < 1e-9);
    }
}
