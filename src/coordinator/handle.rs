use super::error::PutError;
use crate::model::VersionId;

use std::future::Future;
use tokio::runtime::Handle;
use tokio::sync::oneshot;

/// Terminal outcome of one spawned coordinator.
///
/// The coordinator runs as its own task; the handle only receives the final
/// result. Intermediate attempts are never delivered.
pub struct OperationHandle<T> {
    outcome: oneshot::Receiver<T>,
}

impl<T: Send + 'static> OperationHandle<T> {
    pub fn spawn_on<F>(runtime: &Handle, operation: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        runtime.spawn(async move {
            // The caller may have dropped the handle; the operation still completes.
            let _ = tx.send(operation.await);
        });
        Self { outcome: rx }
    }

    /// Waits for the outcome. `None` if the task died before finishing.
    pub async fn wait(self) -> Option<T> {
        self.outcome.await.ok()
    }

    /// Blocks the calling thread until the outcome is recorded.
    ///
    /// Must not be called from inside an async context; use [`wait`](Self::wait) there.
    pub fn wait_blocking(self) -> Option<T> {
        self.outcome.blocking_recv().ok()
    }
}

/// Event-style receiver of a put's terminal outcome.
pub trait PutListener: Send + Sync {
    fn on_put_success(&self, version: VersionId);
    fn on_put_failure(&self, error: &PutError);
}
