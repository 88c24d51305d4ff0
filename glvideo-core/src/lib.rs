//! GLVideo Core Library
//!
//! This library provides the playback-control layer that sits between a host
//! rendering loop and a hardware-accelerated decode pipeline: opening a media
//! source, driving playback and fetching the texture of the latest decoded
//! frame once per rendered frame.
//!
//! The decode pipeline itself is abstracted behind [`DecodeBackend`] and
//! [`MediaStream`]; see the `glvideo-decoder` crate for the FFmpeg backend.
//!
//! A [`SessionHandle`] is driven from a single thread. Nothing in here takes
//! a lock: callers that share a handle across threads must serialize access
//! themselves.

pub mod backend;
pub mod factory;
pub mod frame;
pub mod playback;
pub mod runtime;
pub mod session;
pub mod source;

#[cfg(test)]
mod testing;

pub use backend::{DecodeBackend, MediaStream, TextureId, NO_TEXTURE};
pub use factory::SessionFactory;
pub use frame::FrameSnapshot;
pub use playback::PlaybackState;
pub use runtime::{BackendRuntime, RuntimeStatus};
pub use session::{MediaInfo, SessionHandle};
pub use source::resolve_source;

/// Result of [`SessionFactory::open`]; the other operations use their own
/// error types
pub type OpenResult<T> = std::result::Result<T, OpenError>;

/// Errors raised while opening a session
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OpenError {
    /// The decode runtime failed to initialize. This is permanent for the
    /// lifetime of the factory; initialization is never retried.
    #[error("Decode backend is unavailable")]
    BackendUnavailable,

    /// The backend could not open the given source.
    #[error("Could not load video: {descriptor:?}")]
    SourceUnreadable { descriptor: String },
}

/// Errors raised by [`SessionHandle::seek`]
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum SeekError {
    #[error("Cannot jump to {position}")]
    Unsupported { position: f64 },
}

/// Errors raised by [`SessionHandle::set_rate`]
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum RateError {
    #[error("Cannot set speed to {rate}")]
    Unsupported { rate: f64 },
}
