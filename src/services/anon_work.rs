//! Request-scoped anonymous work.
//!
//! The browser keeps pre-auth work in session storage and uploads it with
//! the sign-in/sign-up request. Clearing it here drops the server copy and
//! flags the response so the client discards its own.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use super::ServiceError;
use super::resolver::{AnonWork, AnonWorkStore};

#[derive(Debug, Default)]
pub struct RequestAnonWork {
    snapshot: Mutex<Option<AnonWork>>,
    cleared: AtomicBool,
}

impl RequestAnonWork {
    #[must_use]
    pub fn new(snapshot: Option<AnonWork>) -> Self {
        Self { snapshot: Mutex::new(snapshot), cleared: AtomicBool::new(false) }
    }

    /// Whether the snapshot was consumed and the client copy must go.
    #[must_use]
    pub fn was_cleared(&self) -> bool {
        self.cleared.load(Ordering::Acquire)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Option<AnonWork>>, ServiceError> {
        self.snapshot
            .lock()
            .map_err(|_| ServiceError::Unavailable("anonymous work lock poisoned".into()))
    }
}

#[async_trait::async_trait]
impl AnonWorkStore for RequestAnonWork {
    async fn read(&self) -> Result<Option<AnonWork>, ServiceError> {
        Ok(self.lock()?.clone())
    }

    async fn clear(&self) -> Result<(), ServiceError> {
        self.lock()?.take();
        self.cleared.store(true, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
#[path = "anon_work_test.rs"]
mod tests;
