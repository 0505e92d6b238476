//! # Worker Pool
//!
//! Bounded pool for blocking store work. Each job holds one permit for its
//! whole run on the blocking thread pool, so at most `size` jobs touch the
//! store at once.

use std::sync::Arc;

use tokio::sync::Semaphore;

use super::errors::{RestError, RestResult};

#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits not currently held by a running job
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `job` on a blocking thread once a permit is free
    pub async fn run<F, T>(&self, job: F) -> RestResult<T>
    where
        F: FnOnce() -> RestResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| RestError::Internal("worker pool is closed".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| RestError::Internal(format!("worker task failed: {}", e)))?
    }
}
