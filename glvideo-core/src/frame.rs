//! Frame polling for the host render loop
//!
//! The backend decodes on its own clock and keeps only its latest frame.
//! The host samples it once per render tick: if several frames were decoded
//! between two polls only the newest one is ever observed.

use crate::{MediaStream, SessionHandle, TextureId, NO_TEXTURE};

/// What the host can see of the session's output right now
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameSnapshot {
    /// Texture returned by the last fetch, [`NO_TEXTURE`] if none
    pub texture_id: TextureId,
    /// Whether a newer frame is waiting to be fetched
    pub available: bool,
}

impl<S: MediaStream> SessionHandle<S> {
    /// Returns whether a new frame is waiting to be displayed. Never blocks.
    pub fn has_new_frame(&self) -> bool {
        self.with_live(false, |live| live.stream.is_frame_available())
    }

    /// Fetches the most recent frame as a texture id.
    ///
    /// The id is borrowed: it stays valid until the next call to this method
    /// or until the session closes. Without a new frame the previous texture
    /// is returned again; [`NO_TEXTURE`] means nothing was decoded yet.
    pub fn fetch_frame(&mut self) -> TextureId {
        self.with_live_mut(NO_TEXTURE, |live| {
            live.texture = live.stream.fetch_frame();
            live.texture
        })
    }

    /// Fetches a frame only if a new one is waiting.
    pub fn poll_frame(&mut self) -> Option<TextureId> {
        if self.has_new_frame() {
            Some(self.fetch_frame()).filter(|&id| id != NO_TEXTURE)
        } else {
            None
        }
    }

    pub fn frame_snapshot(&self) -> FrameSnapshot {
        self.with_live(FrameSnapshot::default(), |live| FrameSnapshot {
            texture_id: live.texture,
            available: live.stream.is_frame_available(),
        })
    }
}
