//! FFmpeg implementation of the decode backend boundary

use crate::pipeline::{Command, Pipeline};
use crate::video_reader::init_ffmpeg;
use crate::{DecodedFrame, DecoderConfig};
use glvideo_core::{DecodeBackend, MediaInfo, MediaStream, TextureId, NO_TEXTURE};
use std::sync::atomic::Ordering;
use tracing::warn;

/// Moves decoded frames into GPU textures owned by the host.
///
/// Called on the thread that fetches frames, which is the thread owning the
/// rendering context.
pub trait TextureUploader {
    /// Uploads `frame` and returns the texture holding it (never [`NO_TEXTURE`]).
    fn upload(&mut self, frame: &DecodedFrame) -> TextureId;

    /// Frees a texture previously returned by [`upload`](Self::upload).
    fn release(&mut self, texture: TextureId);
}

/// Decode backend built on FFmpeg. Every opened stream gets its own clone
/// of the uploader.
#[derive(Debug, Clone)]
pub struct FfmpegBackend<U> {
    config: DecoderConfig,
    uploader: U,
}

impl<U: TextureUploader + Clone> FfmpegBackend<U> {
    pub fn new(uploader: U) -> Self {
        Self::with_config(uploader, DecoderConfig::default())
    }

    pub fn with_config(uploader: U, config: DecoderConfig) -> Self {
        Self { config, uploader }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl<U: TextureUploader + Clone> DecodeBackend for FfmpegBackend<U> {
    type Stream = FfmpegStream<U>;

    fn init(&self) -> bool {
        init_ffmpeg()
    }

    fn open(&self, descriptor: &str) -> Option<FfmpegStream<U>> {
        match Pipeline::spawn(descriptor, self.config.clone()) {
            Ok(pipeline) => Some(FfmpegStream {
                pipeline,
                uploader: self.uploader.clone(),
                texture: NO_TEXTURE,
            }),
            Err(e) => {
                warn!(descriptor, error = %e, "failed to open source");
                None
            }
        }
    }
}

/// One open source decoding on its own thread
pub struct FfmpegStream<U: TextureUploader> {
    pipeline: Pipeline,
    uploader: U,
    /// Texture handed out by the last fetch
    texture: TextureId,
}

impl<U: TextureUploader> FfmpegStream<U> {
    pub fn info(&self) -> MediaInfo {
        self.pipeline.info()
    }
}

impl<U: TextureUploader> MediaStream for FfmpegStream<U> {
    fn is_frame_available(&self) -> bool {
        self.pipeline.shared().slot.is_ready()
    }

    fn fetch_frame(&mut self) -> TextureId {
        if let Some(frame) = self.pipeline.shared().slot.take() {
            let uploaded = self.uploader.upload(&frame);
            if self.texture != NO_TEXTURE && self.texture != uploaded {
                self.uploader.release(self.texture);
            }
            self.texture = uploaded;
        }
        self.texture
    }

    fn set_looping(&mut self, looping: bool) {
        self.pipeline.send(Command::SetLooping(looping));
    }

    fn start(&mut self) {
        self.pipeline.shared().playing.store(true, Ordering::Release);
        self.pipeline.send(Command::Start);
    }

    fn stop(&mut self) {
        self.pipeline.shared().playing.store(false, Ordering::Release);
        self.pipeline.send(Command::Stop);
    }

    fn is_playing(&self) -> bool {
        self.pipeline.shared().playing.load(Ordering::Acquire)
    }

    /// Live sources without a known duration cannot seek.
    fn seek(&mut self, seconds: f64) -> bool {
        let duration = self.info().duration_seconds;
        if duration <= 0.0 || !(0.0..=duration).contains(&seconds) {
            return false;
        }
        self.pipeline.send(Command::Seek(seconds));
        self.pipeline.shared().set_position(seconds);
        true
    }

    /// A rate of 0 freezes the playback clock without pausing.
    fn set_rate(&mut self, rate: f64) -> bool {
        if !rate.is_finite() || rate < 0.0 {
            return false;
        }
        self.pipeline.send(Command::SetRate(rate));
        true
    }

    fn duration(&self) -> f64 {
        self.info().duration_seconds
    }

    fn position(&self) -> f64 {
        self.pipeline.shared().position()
    }

    fn width(&self) -> u32 {
        self.info().width
    }

    fn height(&self) -> u32 {
        self.info().height
    }

    fn frame_rate(&self) -> f64 {
        self.info().frame_rate_hz
    }

    fn close(&mut self) {
        self.pipeline.shutdown();
        if self.texture != NO_TEXTURE {
            self.uploader.release(self.texture);
            self.texture = NO_TEXTURE;
        }
    }
}
