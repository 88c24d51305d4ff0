//! One-time backend runtime initialization

use crate::DecodeBackend;
use std::sync::OnceLock;
use tracing::{error, info};

/// Initialization status of a decode runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeStatus {
    /// No session has been opened yet
    Uninitialized,
    /// The runtime initialized successfully
    Ready,
    /// The runtime failed to initialize; no session can ever be opened
    Unavailable,
}

/// Tracks whether a backend's runtime has been initialized.
///
/// The first call to [`ensure`](Self::ensure) runs `DecodeBackend::init` and
/// records the outcome; later calls only report it. A failed init is never
/// retried.
#[derive(Debug, Default)]
pub struct BackendRuntime {
    status: OnceLock<RuntimeStatus>,
}

impl BackendRuntime {
    /// Usable in a `static`.
    pub const fn new() -> Self {
        Self {
            status: OnceLock::new(),
        }
    }

    /// Initializes `backend` on the first call and returns the recorded status.
    pub fn ensure<B: DecodeBackend>(&self, backend: &B) -> RuntimeStatus {
        *self.status.get_or_init(|| {
            if backend.init() {
                info!("decode runtime initialized");
                RuntimeStatus::Ready
            } else {
                error!("decode runtime failed to initialize");
                RuntimeStatus::Unavailable
            }
        })
    }

    pub fn status(&self) -> RuntimeStatus {
        self.status
            .get()
            .copied()
            .unwrap_or(RuntimeStatus::Uninitialized)
    }
}
