//! Session handle: ownership of one open media source

use crate::{MediaStream, TextureId, NO_TEXTURE};
use tracing::debug;

/// Native properties of an open media source
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MediaInfo {
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Total length in seconds
    pub duration_seconds: f64,
    /// Native frame rate in frames per second
    pub frame_rate_hz: f64,
}

/// State that only exists while the session is open.
pub(crate) struct LiveSession<S> {
    pub(crate) stream: S,
    /// Looping flag as last requested through this handle
    pub(crate) looping: bool,
    /// Texture returned by the last fetch
    pub(crate) texture: TextureId,
}

/// An open (or closed) decode session.
///
/// The backend stream is held as `Option`: `Some` while open, `None` once
/// closed. Every operation on a closed handle is a silent no-op or returns a
/// neutral default (`false`, `0`, `0.0`).
///
/// Dropping the handle closes it.
pub struct SessionHandle<S: MediaStream> {
    live: Option<LiveSession<S>>,
    descriptor: String,
}

impl<S: MediaStream> SessionHandle<S> {
    pub(crate) fn from_stream(stream: S, descriptor: String) -> Self {
        Self {
            live: Some(LiveSession {
                stream,
                looping: false,
                texture: NO_TEXTURE,
            }),
            descriptor,
        }
    }

    /// Creates a handle that was never opened.
    pub fn closed(descriptor: impl Into<String>) -> Self {
        Self {
            live: None,
            descriptor: descriptor.into(),
        }
    }

    /// The resolved source this session was opened with
    pub fn descriptor(&self) -> &str {
        &self.descriptor
    }

    pub fn is_open(&self) -> bool {
        self.live.is_some()
    }

    /// Runs `f` against the live session, or returns `neutral` when closed.
    pub(crate) fn with_live<R>(&self, neutral: R, f: impl FnOnce(&LiveSession<S>) -> R) -> R {
        match &self.live {
            Some(live) => f(live),
            None => neutral,
        }
    }

    pub(crate) fn with_live_mut<R>(
        &mut self,
        neutral: R,
        f: impl FnOnce(&mut LiveSession<S>) -> R,
    ) -> R {
        match &mut self.live {
            Some(live) => f(live),
            None => neutral,
        }
    }

    pub fn media_info(&self) -> MediaInfo {
        self.with_live(MediaInfo::default(), |live| MediaInfo {
            width: live.stream.width(),
            height: live.stream.height(),
            duration_seconds: live.stream.duration(),
            frame_rate_hz: live.stream.frame_rate(),
        })
    }

    /// Releases the backend stream. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(mut live) = self.live.take() {
            live.stream.close();
            debug!(descriptor = %self.descriptor, "session closed");
        }
    }
}

impl<S: MediaStream> Drop for SessionHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<S: MediaStream> std::fmt::Debug for SessionHandle<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionHandle")
            .field("descriptor", &self.descriptor)
            .field("open", &self.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closing_stream, MockStream};

    #[test]
    fn test_close_is_idempotent() {
        let mut handle = SessionHandle::from_stream(closing_stream(), "clip.mp4".into());
        assert!(handle.is_open());

        for _ in 0..4 {
            handle.close();
            assert!(!handle.is_open());
        }
    }

    #[test]
    fn test_drop_closes_stream() {
        let handle = SessionHandle::from_stream(closing_stream(), "clip.mp4".into());
        drop(handle);
    }

    #[test]
    fn test_close_never_opened_handle() {
        let mut handle = SessionHandle::<MockStream>::closed("missing.mp4");
        handle.close();
        handle.close();
        assert!(!handle.is_open());
        assert_eq!(handle.descriptor(), "missing.mp4");
    }

    #[test]
    fn test_media_info_passthrough() {
        let mut stream = closing_stream();
        stream.expect_width().return_const(1280u32);
        stream.expect_height().return_const(720u32);
        stream.expect_duration().return_const(12.5);
        stream.expect_frame_rate().return_const(29.97);

        let mut handle = SessionHandle::from_stream(stream, "clip.mp4".into());
        let info = handle.media_info();
        assert_eq!(info.width, 1280);
        assert_eq!(info.height, 720);
        assert_eq!(info.duration_seconds, 12.5);
        assert_eq!(info.frame_rate_hz, 29.97);

        handle.close();
        assert_eq!(handle.media_info(), MediaInfo::default());
    }
}
