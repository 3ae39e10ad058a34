//! Bookkeeping shared by the build and validate walks: cancellation, depth and cooperative
//! yielding.

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::{config::EngineConfig, error::ReweaveError};

#[derive(Debug)]
pub(crate) struct Traversal {
    config: EngineConfig,
    cancel: CancellationToken,
    depth: usize,
    visited: usize,
}

impl Traversal {
    pub(crate) fn new(config: &EngineConfig, cancel: &CancellationToken) -> Self {
        Traversal {
            config: config.clone(),
            cancel: cancel.clone(),
            depth: 0,
            visited: 0,
        }
    }

    pub(crate) fn visited(&self) -> usize {
        self.visited
    }

    fn check_cancelled(&self) -> Result<(), ReweaveError> {
        if self.cancel.is_cancelled() {
            Err(ReweaveError::OperationCancelled)
        } else {
            Ok(())
        }
    }

    /// Called once per newly registered node, before its members are visited.
    pub(crate) async fn enter(&mut self) -> Result<(), ReweaveError> {
        self.check_cancelled()?;
        if let Some(max_depth) = self.config.max_depth {
            if self.depth >= max_depth {
                return Err(ReweaveError::DepthExceeded(max_depth));
            }
        }
        self.depth += 1;
        self.visited += 1;

        if let Some(interval) = self.config.yield_interval.filter(|n| *n > 0) {
            if self.visited % interval == 0 {
                tokio::task::yield_now().await;
                self.check_cancelled()?;
            }
        }
        Ok(())
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// Runs a caller-supplied suspension point, abandoning it if the traversal is cancelled.
    pub(crate) async fn guard<T, F>(&self, fut: F) -> Result<T, ReweaveError>
    where
        F: Future<Output = Result<T, ReweaveError>>,
    {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(ReweaveError::OperationCancelled),
            result = fut => result,
        }
    }
}
