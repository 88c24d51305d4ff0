//! Incremental video decoding and RGBA conversion using FFmpeg

use crate::{DecodedFrame, DecoderConfig, Error, Result};
use ffmpeg_next as ffmpeg;
use glvideo_core::MediaInfo;
use image::RgbaImage;
use std::sync::OnceLock;
use tracing::{debug, error};

static FFMPEG_INIT: OnceLock<bool> = OnceLock::new();

/// Initializes FFmpeg once per process and reports whether it succeeded.
pub fn init_ffmpeg() -> bool {
    *FFMPEG_INIT.get_or_init(|| match ffmpeg::init() {
        Ok(()) => {
            ffmpeg::util::log::set_level(ffmpeg::util::log::Level::Error);
            true
        }
        Err(e) => {
            error!(error = %e, "failed to initialize FFmpeg");
            false
        }
    })
}

/// Video reader that decodes one frame at a time
pub struct VideoReader {
    input: ffmpeg::format::context::Input,
    video_stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    /// Seconds per timestamp unit of the video stream
    time_base: f64,
    info: MediaInfo,
    eof_sent: bool,
    /// Frames before this position are decoded but not returned (after a seek)
    skip_until: Option<f64>,
}

impl VideoReader {
    /// Opens a local file or network URI
    pub fn open(descriptor: &str, config: &DecoderConfig) -> Result<Self> {
        let input = ffmpeg::format::input(&descriptor)?;

        let video_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(Error::NoVideoStream)?;
        let video_stream_index = video_stream.index();
        let time_base = f64::from(video_stream.time_base());

        let avg_rate = video_stream.avg_frame_rate();
        let frame_rate = if avg_rate.numerator() > 0 && avg_rate.denominator() > 0 {
            f64::from(avg_rate)
        } else {
            let rate = video_stream.rate();
            if rate.denominator() > 0 {
                f64::from(rate)
            } else {
                0.0
            }
        };

        let duration_seconds = if video_stream.duration() > 0 {
            video_stream.duration() as f64 * time_base
        } else if input.duration() > 0 {
            // Fallback to container duration
            input.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        let mut context =
            ffmpeg::codec::context::Context::from_parameters(video_stream.parameters())?;
        context.set_threading(ffmpeg::codec::threading::Config::count(
            config.decode_threads.max(1),
        ));
        let decoder = context.decoder().video()?;

        let scaler = ffmpeg::software::scaling::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::format::Pixel::RGBA,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;

        let info = MediaInfo {
            width: decoder.width(),
            height: decoder.height(),
            duration_seconds,
            frame_rate_hz: frame_rate,
        };
        debug!(descriptor, ?info, "opened video stream");

        Ok(Self {
            input,
            video_stream_index,
            decoder,
            scaler,
            time_base,
            info,
            eof_sent: false,
            skip_until: None,
        })
    }

    pub fn info(&self) -> MediaInfo {
        self.info
    }

    /// Decodes the next frame, or `None` at the end of the stream
    pub fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        let mut decoded = ffmpeg::frame::Video::empty();
        loop {
            if self.decoder.receive_frame(&mut decoded).is_ok() {
                let pts = decoded
                    .timestamp()
                    .or(decoded.pts())
                    .map(|ts| ts as f64 * self.time_base)
                    .unwrap_or(0.0);

                if let Some(target) = self.skip_until {
                    if pts < target - self.half_frame() {
                        continue;
                    }
                    self.skip_until = None;
                }

                return self.convert(&decoded, pts).map(Some);
            }

            if self.eof_sent {
                return Ok(None);
            }

            match self.next_packet() {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        debug!(error = %e, "skipping undecodable packet");
                    }
                }
                None => {
                    // Flush decoder
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    /// Seeks to the keyframe at or before `seconds`; frames before the
    /// target are then skipped by [`next_frame`](Self::next_frame).
    pub fn seek(&mut self, seconds: f64) -> Result<()> {
        let timestamp = (seconds * ffmpeg::ffi::AV_TIME_BASE as f64) as i64;
        self.input.seek(timestamp, ..timestamp)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.skip_until = (seconds > 0.0).then_some(seconds);
        Ok(())
    }

    fn half_frame(&self) -> f64 {
        if self.info.frame_rate_hz > 0.0 {
            0.5 / self.info.frame_rate_hz
        } else {
            0.0
        }
    }

    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let index = self.video_stream_index;
        self.input
            .packets()
            .find_map(|(stream, packet)| (stream.index() == index).then_some(packet))
    }

    fn convert(&mut self, decoded: &ffmpeg::frame::Video, pts: f64) -> Result<DecodedFrame> {
        let mut rgba_frame = ffmpeg::frame::Video::empty();
        self.scaler.run(decoded, &mut rgba_frame)?;

        let width = rgba_frame.width();
        let height = rgba_frame.height();
        let stride = rgba_frame.stride(0);
        let data = rgba_frame.data(0);
        let row_bytes = width as usize * 4;

        // Copy rows without the stride padding
        let mut pixels = Vec::with_capacity(row_bytes * height as usize);
        for y in 0..height as usize {
            let start = y * stride;
            let row = data.get(start..start + row_bytes).ok_or(Error::InvalidFrame)?;
            pixels.extend_from_slice(row);
        }

        let image = RgbaImage::from_raw(width, height, pixels).ok_or(Error::InvalidFrame)?;
        Ok(DecodedFrame {
            image,
            pts_seconds: pts,
        })
    }
}
