//! Mock backend types shared by the unit tests

use crate::{DecodeBackend, MediaStream, TextureId};
use mockall::mock;

mock! {
    pub Stream {}

    impl MediaStream for Stream {
        fn is_frame_available(&self) -> bool;
        fn fetch_frame(&mut self) -> TextureId;
        fn set_looping(&mut self, looping: bool);
        fn start(&mut self);
        fn stop(&mut self);
        fn is_playing(&self) -> bool;
        fn seek(&mut self, seconds: f64) -> bool;
        fn set_rate(&mut self, rate: f64) -> bool;
        fn duration(&self) -> f64;
        fn position(&self) -> f64;
        fn width(&self) -> u32;
        fn height(&self) -> u32;
        fn frame_rate(&self) -> f64;
        fn close(&mut self);
    }
}

mock! {
    pub Backend {}

    impl DecodeBackend for Backend {
        type Stream = MockStream;

        fn init(&self) -> bool;
        fn open(&self, descriptor: &str) -> Option<MockStream>;
    }
}

/// A stream that expects to be closed exactly once and nothing else.
pub fn closing_stream() -> MockStream {
    let mut stream = MockStream::new();
    stream.expect_close().times(1).return_const(());
    stream
}
