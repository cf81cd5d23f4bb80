//! Cooperative cancellation for strategy runs
//!
//! A run checks the token between steps and between transactions. A
//! transaction that was already handed to the executor is never interrupted.

use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

use crate::error::{ExecError, Result};

#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        if !*self.tx.borrow() {
            info!("Cancellation requested; stopping after the in-flight step");
        }
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// `Err(Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExecError::Cancelled)
        } else {
            Ok(())
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
