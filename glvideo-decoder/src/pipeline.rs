//! Decode thread and its command channel
//!
//! FFmpeg contexts are created and used on the decode thread only. The
//! owning stream talks to it through a command channel and reads its output
//! from shared state: the frame slot, the playing flag and the position.

use crate::{DecodedFrame, DecoderConfig, Error, FrameSlot, PlaybackClock, Result, VideoReader};
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use glvideo_core::MediaInfo;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Command {
    Start,
    Stop,
    SetLooping(bool),
    Seek(f64),
    SetRate(f64),
    Shutdown,
}

/// Where the decode loop pulls frames from
pub(crate) trait FrameSource {
    /// The next frame in presentation order, or `None` at the end of the stream
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>>;

    fn seek(&mut self, seconds: f64) -> Result<()>;
}

impl FrameSource for VideoReader {
    fn next_frame(&mut self) -> Result<Option<DecodedFrame>> {
        VideoReader::next_frame(self)
    }

    fn seek(&mut self, seconds: f64) -> Result<()> {
        VideoReader::seek(self, seconds)
    }
}

/// State written by the decode thread and read by the owning stream
#[derive(Debug, Default)]
pub(crate) struct Shared {
    pub(crate) slot: FrameSlot,
    pub(crate) playing: AtomicBool,
    position_bits: AtomicU64,
}

impl Shared {
    pub(crate) fn position(&self) -> f64 {
        f64::from_bits(self.position_bits.load(Ordering::Acquire))
    }

    pub(crate) fn set_position(&self, seconds: f64) {
        self.position_bits.store(seconds.to_bits(), Ordering::Release);
    }
}

/// Handle to a running decode thread
pub(crate) struct Pipeline {
    commands: Sender<Command>,
    shared: Arc<Shared>,
    info: MediaInfo,
    worker: Option<JoinHandle<()>>,
}

impl Pipeline {
    /// Spawns the decode thread and waits until the source is opened.
    pub(crate) fn spawn(descriptor: &str, config: DecoderConfig) -> Result<Self> {
        let (command_tx, command_rx) = crossbeam_channel::unbounded();
        let (ready_tx, ready_rx) = crossbeam_channel::bounded::<Result<MediaInfo>>(1);
        let shared = Arc::new(Shared::default());

        let worker = thread::Builder::new()
            .name("glvideo-decode".into())
            .spawn({
                let shared = Arc::clone(&shared);
                let descriptor = descriptor.to_string();
                move || {
                    let reader = match VideoReader::open(&descriptor, &config) {
                        Ok(reader) => reader,
                        Err(e) => {
                            let _ = ready_tx.send(Err(e));
                            return;
                        }
                    };
                    if ready_tx.send(Ok(reader.info())).is_err() {
                        return;
                    }
                    DecodeLoop::new(reader, command_rx, shared, config).run();
                    debug!(descriptor, "decode thread finished");
                }
            })?;

        let info = match ready_rx.recv() {
            Ok(result) => result?,
            Err(_) => return Err(Error::WorkerGone),
        };

        Ok(Self {
            commands: command_tx,
            shared,
            info,
            worker: Some(worker),
        })
    }

    pub(crate) fn info(&self) -> MediaInfo {
        self.info
    }

    pub(crate) fn shared(&self) -> &Shared {
        &self.shared
    }

    pub(crate) fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(?command, "decode thread already exited");
        }
    }

    /// Stops the decode thread and waits for it to release the source.
    pub(crate) fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            self.send(Command::Shutdown);
            if worker.join().is_err() {
                warn!("decode thread panicked");
            }
            self.shared.playing.store(false, Ordering::Release);
            self.shared.slot.clear();
        }
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct DecodeLoop<R> {
    reader: R,
    commands: Receiver<Command>,
    shared: Arc<Shared>,
    config: DecoderConfig,
    clock: PlaybackClock,
    looping: bool,
    /// Set after open, seek and loop restarts: the next frame re-anchors the clock
    rebase: bool,
    at_end: bool,
    pending: Option<DecodedFrame>,
}

impl<R: FrameSource> DecodeLoop<R> {
    fn new(
        reader: R,
        commands: Receiver<Command>,
        shared: Arc<Shared>,
        config: DecoderConfig,
    ) -> Self {
        Self {
            reader,
            commands,
            shared,
            config,
            clock: PlaybackClock::new(),
            looping: false,
            rebase: true,
            at_end: false,
            pending: None,
        }
    }

    fn run(mut self) {
        loop {
            let timeout = if self.clock.is_running() {
                Duration::ZERO
            } else {
                self.config.idle_poll
            };
            if !self.process_commands(timeout) {
                return;
            }
            if !self.clock.is_running() {
                continue;
            }

            if self.pending.is_none() {
                match self.reader.next_frame() {
                    Ok(Some(frame)) => self.pending = Some(frame),
                    Ok(None) => {
                        self.end_of_stream();
                        continue;
                    }
                    Err(e) => {
                        warn!(error = %e, "decoding failed, stopping playback");
                        self.halt();
                        continue;
                    }
                }
            }

            let Some(pts) = self.pending.as_ref().map(|frame| frame.pts_seconds) else {
                continue;
            };
            let now = Instant::now();
            if self.rebase {
                self.clock.reset(pts, now);
                self.rebase = false;
            }

            if let Some(wait) = self.clock.wait_for(pts, now) {
                if !self.process_commands(wait.min(self.config.idle_poll)) {
                    return;
                }
                continue;
            }

            if let Some(frame) = self.pending.take() {
                let lateness = self.clock.lateness(pts, now);
                if lateness > self.config.max_frame_lag.as_secs_f64() {
                    trace!(pts, lateness, "dropping late frame");
                    continue;
                }
                self.shared.set_position(pts);
                if self.shared.slot.publish(frame) {
                    trace!(pts, "replaced unfetched frame");
                }
            }
        }
    }

    /// Waits up to `timeout` for a command, then drains the queue.
    /// Returns `false` when the thread should exit.
    fn process_commands(&mut self, timeout: Duration) -> bool {
        let first = if timeout.is_zero() {
            match self.commands.try_recv() {
                Ok(command) => Some(command),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => return false,
            }
        } else {
            match self.commands.recv_timeout(timeout) {
                Ok(command) => Some(command),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => return false,
            }
        };

        let Some(first) = first else {
            return true;
        };
        if !self.apply(first) {
            return false;
        }
        loop {
            match self.commands.try_recv() {
                Ok(command) => {
                    if !self.apply(command) {
                        return false;
                    }
                }
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: Command) -> bool {
        let now = Instant::now();
        match command {
            Command::Start => {
                if self.at_end && !self.restart() {
                    self.halt();
                    return true;
                }
                self.shared.playing.store(true, Ordering::Release);
                self.clock.start(now);
            }
            Command::Stop => self.halt(),
            Command::SetLooping(looping) => self.looping = looping,
            Command::Seek(seconds) => {
                self.seek(seconds);
                self.shared.set_position(seconds);
            }
            Command::SetRate(rate) => self.clock.set_rate(rate, now),
            Command::Shutdown => return false,
        }
        true
    }

    /// Returns `false` if the source refused to seek.
    fn seek(&mut self, seconds: f64) -> bool {
        self.pending = None;
        self.shared.slot.clear();
        self.at_end = false;
        self.rebase = true;
        match self.reader.seek(seconds) {
            Ok(()) => true,
            Err(e) => {
                warn!(seconds, error = %e, "seek failed");
                false
            }
        }
    }

    /// Rewinds to the start. A source that cannot rewind stays at its end.
    fn restart(&mut self) -> bool {
        if self.seek(0.0) {
            self.shared.set_position(0.0);
            true
        } else {
            self.at_end = true;
            false
        }
    }

    fn end_of_stream(&mut self) {
        if self.looping {
            debug!("end of stream, looping");
            if !self.restart() {
                self.halt();
            }
        } else {
            debug!("end of stream");
            self.at_end = true;
            self.halt();
        }
    }

    fn halt(&mut self) {
        self.clock.pause(Instant::now());
        self.shared.playing.store(false, Ordering::Release);
    }
}
