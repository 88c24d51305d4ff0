//! Session factory: runtime initialization and opening sources

use crate::{BackendRuntime, DecodeBackend, OpenError, OpenResult, RuntimeStatus, SessionHandle};
use tracing::{debug, warn};

/// Opens sessions on a decode backend.
///
/// The backend runtime is initialized on the first [`open`](Self::open) and
/// never again. If that fails, every open fails with
/// [`OpenError::BackendUnavailable`].
#[derive(Debug)]
pub struct SessionFactory<B: DecodeBackend> {
    backend: B,
    runtime: BackendRuntime,
}

impl<B: DecodeBackend> SessionFactory<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            runtime: BackendRuntime::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn runtime_status(&self) -> RuntimeStatus {
        self.runtime.status()
    }

    /// Opens an already-resolved source (see [`resolve_source`](crate::resolve_source)).
    ///
    /// Sessions start out paused.
    pub fn open(&self, descriptor: &str) -> OpenResult<SessionHandle<B::Stream>> {
        if self.runtime.ensure(&self.backend) != RuntimeStatus::Ready {
            return Err(OpenError::BackendUnavailable);
        }

        let unreadable = || OpenError::SourceUnreadable {
            descriptor: descriptor.to_string(),
        };

        if descriptor.is_empty() {
            warn!("refusing to open an empty source descriptor");
            return Err(unreadable());
        }

        let stream = self.backend.open(descriptor).ok_or_else(|| {
            warn!(descriptor, "could not load video");
            unreadable()
        })?;

        debug!(descriptor, "session opened");
        Ok(SessionHandle::from_stream(stream, descriptor.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{closing_stream, MockBackend};
    use mockall::predicate::function;

    #[test]
    fn test_open_success() {
        let mut backend = MockBackend::new();
        backend.expect_init().times(1).return_const(true);
        backend
            .expect_open()
            .with(function(|d: &str| d == "/data/clip.mp4"))
            .times(2)
            .returning(|_| Some(closing_stream()));

        let factory = SessionFactory::new(backend);
        assert_eq!(factory.runtime_status(), RuntimeStatus::Uninitialized);

        let first = factory.open("/data/clip.mp4").unwrap();
        let second = factory.open("/data/clip.mp4").unwrap();
        assert!(first.is_open());
        assert!(second.is_open());
        assert_eq!(first.descriptor(), "/data/clip.mp4");
        assert_eq!(factory.runtime_status(), RuntimeStatus::Ready);
    }

    #[test]
    fn test_backend_unavailable_is_sticky() {
        let mut backend = MockBackend::new();
        backend.expect_init().times(1).return_const(false);
        backend.expect_open().never();

        let factory = SessionFactory::new(backend);
        for _ in 0..3 {
            assert_eq!(
                factory.open("/data/clip.mp4").unwrap_err(),
                OpenError::BackendUnavailable
            );
        }
        assert_eq!(factory.runtime_status(), RuntimeStatus::Unavailable);
    }

    #[test]
    fn test_empty_descriptor_is_unreadable() {
        let mut backend = MockBackend::new();
        backend.expect_init().return_const(true);
        backend.expect_open().never();

        let factory = SessionFactory::new(backend);
        assert_eq!(
            factory.open("").unwrap_err(),
            OpenError::SourceUnreadable {
                descriptor: String::new()
            }
        );
    }

    #[test]
    fn test_backend_open_failure() {
        let mut backend = MockBackend::new();
        backend.expect_init().return_const(true);
        backend.expect_open().returning(|_| None);

        let factory = SessionFactory::new(backend);
        let err = factory.open("http://example.com/missing.mp4").unwrap_err();
        assert!(matches!(err, OpenError::SourceUnreadable { .. }));
        assert_eq!(
            err.to_string(),
            "Could not load video: \"http://example.com/missing.mp4\""
        );
    }
}
