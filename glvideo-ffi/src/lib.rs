//! GLVideo C ABI
//!
//! Exposes `glvideo_*` functions for hosts that are not written in Rust.
//! A session is an opaque pointer returned by [`glvideo_open`] and freed by
//! [`glvideo_close`]. Textures are created and destroyed by the host through
//! the callbacks it passes when opening.
//!
//! Every function accepts a null handle and returns the neutral value of
//! its result type, matching a closed session.
//!
//! The decode runtime is shared by the whole process: it is initialized by
//! the first [`glvideo_init`] or [`glvideo_open`] and a failure is final.

use glvideo_core::{
    BackendRuntime, RuntimeStatus, SessionFactory, SessionHandle, TextureId, NO_TEXTURE,
};
use glvideo_decoder::{DecodedFrame, FfmpegBackend, FfmpegStream, TextureUploader};
use libc::{c_char, c_int, c_void};
use std::ffi::CStr;
use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use tracing::warn;

/// Uploads `width * height` RGBA pixels and returns a non-zero texture name.
pub type UploadFn =
    unsafe extern "C" fn(user_data: *mut c_void, pixels: *const u8, width: u32, height: u32) -> u32;

/// Deletes a texture previously returned by the upload callback.
pub type ReleaseFn = unsafe extern "C" fn(user_data: *mut c_void, texture: u32);

/// Texture callbacks supplied by the host, shared with C via repr(C).
///
/// Both callbacks run on the thread calling [`glvideo_get_frame`] or
/// [`glvideo_close`], which must own the rendering context.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct GlvideoTextureCallbacks {
    pub user_data: *mut c_void,
    pub upload: Option<UploadFn>,
    pub release: Option<ReleaseFn>,
}

#[derive(Debug, Clone, Copy)]
struct CallbackUploader {
    callbacks: GlvideoTextureCallbacks,
}

impl TextureUploader for CallbackUploader {
    fn upload(&mut self, frame: &DecodedFrame) -> TextureId {
        match self.callbacks.upload {
            Some(upload) => unsafe {
                upload(
                    self.callbacks.user_data,
                    frame.image.as_raw().as_ptr(),
                    frame.width(),
                    frame.height(),
                )
            },
            None => NO_TEXTURE,
        }
    }

    fn release(&mut self, texture: TextureId) {
        if let Some(release) = self.callbacks.release {
            unsafe { release(self.callbacks.user_data, texture) }
        }
    }
}

type Session = SessionHandle<FfmpegStream<CallbackUploader>>;

static RUNTIME: BackendRuntime = BackendRuntime::new();

const NO_CALLBACKS: GlvideoTextureCallbacks = GlvideoTextureCallbacks {
    user_data: ptr::null_mut(),
    upload: None,
    release: None,
};

/// Process-wide runtime status, shared with C via repr(C).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlvideoRuntimeStatus {
    Uninitialized = 0,
    Ready = 1,
    Unavailable = 2,
}

impl From<RuntimeStatus> for GlvideoRuntimeStatus {
    fn from(status: RuntimeStatus) -> Self {
        match status {
            RuntimeStatus::Uninitialized => Self::Uninitialized,
            RuntimeStatus::Ready => Self::Ready,
            RuntimeStatus::Unavailable => Self::Unavailable,
        }
    }
}

fn backend(callbacks: GlvideoTextureCallbacks) -> FfmpegBackend<CallbackUploader> {
    FfmpegBackend::new(CallbackUploader { callbacks })
}

/// Runs `f` on the session behind `handle`, or returns `neutral` for a null
/// handle or a panic.
unsafe fn with_session<R>(handle: *mut c_void, neutral: R, f: impl FnOnce(&mut Session) -> R) -> R {
    if handle.is_null() {
        return neutral;
    }
    let session = unsafe { &mut *(handle as *mut Session) };
    match panic::catch_unwind(AssertUnwindSafe(|| f(session))) {
        Ok(value) => value,
        Err(_) => {
            warn!("panic inside a glvideo call");
            neutral
        }
    }
}

// ──────────────────── C-ABI functions ────────────────────

/// Initialize the decode runtime. Safe to call more than once; only the
/// first call does any work. Returns whether the runtime is usable.
#[no_mangle]
pub extern "C" fn glvideo_init() -> bool {
    panic::catch_unwind(|| RUNTIME.ensure(&backend(NO_CALLBACKS)) == RuntimeStatus::Ready)
        .unwrap_or(false)
}

/// Report whether the decode runtime was initialized, and how that went.
#[no_mangle]
pub extern "C" fn glvideo_runtime_status() -> GlvideoRuntimeStatus {
    RUNTIME.status().into()
}

/// Open a file name or URI.
/// Returns an opaque handle, or NULL if the source could not be opened.
///
/// # Safety
/// `uri` must be NULL or a valid NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn glvideo_open(
    uri: *const c_char,
    callbacks: GlvideoTextureCallbacks,
) -> *mut c_void {
    let result = panic::catch_unwind(|| {
        if uri.is_null() || callbacks.upload.is_none() {
            return ptr::null_mut();
        }
        let descriptor = match unsafe { CStr::from_ptr(uri) }.to_str() {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(error = %e, "source name is not valid UTF-8");
                return ptr::null_mut();
            }
        };

        let ffmpeg = backend(callbacks);
        if RUNTIME.ensure(&ffmpeg) != RuntimeStatus::Ready {
            warn!("decode runtime is unavailable");
            return ptr::null_mut();
        }

        match SessionFactory::new(ffmpeg).open(descriptor) {
            Ok(session) => Box::into_raw(Box::new(session)) as *mut c_void,
            Err(e) => {
                warn!("{e}");
                ptr::null_mut()
            }
        }
    });

    result.unwrap_or(ptr::null_mut())
}

/// Whether a frame newer than the last fetched one is waiting.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_is_available(handle: *mut c_void) -> bool {
    unsafe { with_session(handle, false, |session| session.has_new_frame()) }
}

/// Upload the latest decoded frame and return its texture, or the last
/// fetched texture when nothing new arrived. Returns 0 before the first frame.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_get_frame(handle: *mut c_void) -> u32 {
    unsafe { with_session(handle, NO_TEXTURE, |session| session.fetch_frame()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_play(handle: *mut c_void) {
    unsafe { with_session(handle, (), |session| session.play()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_loop(handle: *mut c_void) {
    unsafe { with_session(handle, (), |session| session.loop_playback()) }
}

/// Stop looping; playback continues if it was running.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_no_loop(handle: *mut c_void) {
    unsafe { with_session(handle, (), |session| session.no_loop()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_pause(handle: *mut c_void) {
    unsafe { with_session(handle, (), |session| session.pause()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_is_playing(handle: *mut c_void) -> bool {
    unsafe { with_session(handle, false, |session| session.is_playing()) }
}

/// Jump to `seconds`. Returns 0 on success, -1 if the position was rejected.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_seek(handle: *mut c_void, seconds: f64) -> c_int {
    unsafe {
        with_session(handle, 0, |session| match session.seek(seconds) {
            Ok(()) => 0,
            Err(_) => -1,
        })
    }
}

/// Set the playback rate. Returns 0 on success, -1 if the rate was rejected.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_set_speed(handle: *mut c_void, rate: f64) -> c_int {
    unsafe {
        with_session(handle, 0, |session| match session.set_rate(rate) {
            Ok(()) => 0,
            Err(_) => -1,
        })
    }
}

/// Duration in seconds, 0 when unknown.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_duration(handle: *mut c_void) -> f64 {
    unsafe { with_session(handle, 0.0, |session| session.duration_seconds()) }
}

/// Position of the latest decoded frame in seconds.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_time(handle: *mut c_void) -> f64 {
    unsafe { with_session(handle, 0.0, |session| session.position_seconds()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_width(handle: *mut c_void) -> u32 {
    unsafe { with_session(handle, 0, |session| session.width()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_height(handle: *mut c_void) -> u32 {
    unsafe { with_session(handle, 0, |session| session.height()) }
}

/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`].
#[no_mangle]
pub unsafe extern "C" fn glvideo_frame_rate(handle: *mut c_void) -> f64 {
    unsafe { with_session(handle, 0.0, |session| session.frame_rate_hz()) }
}

/// Stop decoding, release the current texture and free the handle.
///
/// # Safety
/// `handle` must be NULL or a live pointer returned by [`glvideo_open`]; it
/// is dangling afterwards.
#[no_mangle]
pub unsafe extern "C" fn glvideo_close(handle: *mut c_void) {
    if handle.is_null() {
        return;
    }
    let mut session = unsafe { Box::from_raw(handle as *mut Session) };
    if panic::catch_unwind(AssertUnwindSafe(|| session.close())).is_err() {
        warn!("panic while closing a glvideo session");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::ffi::CString;

    #[derive(Default)]
    struct Recorder {
        uploads: Vec<(u32, u32, [u8; 4])>,
        released: Vec<u32>,
    }

    unsafe extern "C" fn record_upload(
        user_data: *mut c_void,
        pixels: *const u8,
        width: u32,
        height: u32,
    ) -> u32 {
        let recorder = unsafe { &mut *(user_data as *mut Recorder) };
        let first = unsafe { std::slice::from_raw_parts(pixels, 4) };
        recorder
            .uploads
            .push((width, height, [first[0], first[1], first[2], first[3]]));
        recorder.uploads.len() as u32
    }

    unsafe extern "C" fn record_release(user_data: *mut c_void, texture: u32) {
        let recorder = unsafe { &mut *(user_data as *mut Recorder) };
        recorder.released.push(texture);
    }

    fn callbacks(recorder: &mut Recorder) -> GlvideoTextureCallbacks {
        GlvideoTextureCallbacks {
            user_data: recorder as *mut Recorder as *mut c_void,
            upload: Some(record_upload),
            release: Some(record_release),
        }
    }

    #[test]
    fn test_null_handle_is_neutral() {
        let handle = ptr::null_mut();
        unsafe {
            glvideo_play(handle);
            glvideo_loop(handle);
            glvideo_no_loop(handle);
            glvideo_pause(handle);
            assert!(!glvideo_is_available(handle));
            assert_eq!(glvideo_get_frame(handle), 0);
            assert!(!glvideo_is_playing(handle));
            assert_eq!(glvideo_seek(handle, 3.0), 0);
            assert_eq!(glvideo_set_speed(handle, -1.0), 0);
            assert_eq!(glvideo_duration(handle), 0.0);
            assert_eq!(glvideo_time(handle), 0.0);
            assert_eq!(glvideo_width(handle), 0);
            assert_eq!(glvideo_height(handle), 0);
            assert_eq!(glvideo_frame_rate(handle), 0.0);
            glvideo_close(handle);
        }
    }

    #[test]
    fn test_init_records_process_status() {
        let ready = glvideo_init();
        let status = glvideo_runtime_status();
        assert_ne!(status, GlvideoRuntimeStatus::Uninitialized);
        assert_eq!(status == GlvideoRuntimeStatus::Ready, ready);

        // later calls only report the recorded outcome
        assert_eq!(glvideo_init(), ready);
        assert_eq!(glvideo_runtime_status(), status);
    }

    #[test]
    fn test_open_rejects_bad_arguments() {
        let mut recorder = Recorder::default();
        let uri = CString::new("clip.mp4").unwrap();
        unsafe {
            assert!(glvideo_open(ptr::null(), callbacks(&mut recorder)).is_null());

            let mut no_upload = callbacks(&mut recorder);
            no_upload.upload = None;
            assert!(glvideo_open(uri.as_ptr(), no_upload).is_null());
        }
    }

    #[test]
    fn test_open_missing_file_returns_null() {
        let mut recorder = Recorder::default();
        let uri = CString::new("/nonexistent/glvideo/missing-clip.mp4").unwrap();
        let handle = unsafe { glvideo_open(uri.as_ptr(), callbacks(&mut recorder)) };
        assert!(handle.is_null());
        assert!(recorder.uploads.is_empty());
    }

    #[test]
    fn test_uploader_forwards_to_callbacks() {
        let mut recorder = Recorder::default();
        let mut uploader = CallbackUploader {
            callbacks: callbacks(&mut recorder),
        };
        let frame = DecodedFrame {
            image: RgbaImage::from_pixel(4, 2, image::Rgba([10, 20, 30, 255])),
            pts_seconds: 0.5,
        };

        assert_eq!(uploader.upload(&frame), 1);
        assert_eq!(uploader.upload(&frame), 2);
        uploader.release(1);

        assert_eq!(recorder.uploads, vec![(4, 2, [10, 20, 30, 255]); 2]);
        assert_eq!(recorder.released, vec![1]);
    }

    #[test]
    fn test_uploader_without_release_is_noop() {
        let mut uploader = CallbackUploader {
            callbacks: GlvideoTextureCallbacks {
                user_data: ptr::null_mut(),
                upload: None,
                release: None,
            },
        };
        let frame = DecodedFrame {
            image: RgbaImage::new(1, 1),
            pts_seconds: 0.0,
        };
        assert_eq!(uploader.upload(&frame), NO_TEXTURE);
        uploader.release(7);
    }
}
