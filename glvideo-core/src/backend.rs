//! Boundary toward the decode pipeline
//!
//! A backend is a black box that demuxes, decodes and uploads frames on its
//! own schedule. This crate only needs the control primitives below.

/// Identifier of a GPU texture holding a decoded frame.
///
/// Texture ids are borrowed from the backend: they stay valid until the next
/// successful fetch on the same session, or until the session closes.
pub type TextureId = u32;

/// Texture id meaning "no frame".
pub const NO_TEXTURE: TextureId = 0;

/// A decode runtime capable of opening media streams.
pub trait DecodeBackend {
    type Stream: MediaStream;

    /// Initializes the runtime. `false` means the runtime is unusable.
    ///
    /// Called at most once per [`SessionFactory`](crate::SessionFactory).
    fn init(&self) -> bool;

    /// Opens an already-resolved descriptor (URI or absolute path).
    fn open(&self, descriptor: &str) -> Option<Self::Stream>;
}

/// One open media source inside the backend.
///
/// All methods return immediately. Playback state changes may take a
/// backend-defined number of frames to become visible in the output.
pub trait MediaStream {
    /// Whether a frame was produced that has not been fetched yet.
    fn is_frame_available(&self) -> bool;

    /// Returns the texture of the latest decoded frame, or [`NO_TEXTURE`]
    /// if nothing has been decoded so far.
    fn fetch_frame(&mut self) -> TextureId;

    fn set_looping(&mut self, looping: bool);
    fn start(&mut self);
    fn stop(&mut self);

    /// True while playing, including when playback is stalled on buffering.
    fn is_playing(&self) -> bool;

    /// Requests a jump to `seconds`. Returns `false` if the backend rejects it.
    fn seek(&mut self, seconds: f64) -> bool;

    /// Sets the real-time multiplier. Only called with `rate >= 0`.
    fn set_rate(&mut self, rate: f64) -> bool;

    fn duration(&self) -> f64;
    fn position(&self) -> f64;
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn frame_rate(&self) -> f64;

    /// Releases all native resources. Called exactly once per stream.
    fn close(&mut self);
}
