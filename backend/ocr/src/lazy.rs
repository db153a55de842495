//! Initialize-once holder for heavy OCR engines.
//!
//! The engine is built on first use, not at startup. The build runs on the blocking
//! pool and owns the cell, so it finishes and publishes its result even if the caller
//! that started it is cancelled. Concurrent first callers block on the same build;
//! once built, reads go through `OnceCell::get` without taking a lock.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::info;

use crate::error::OcrError;

type Factory<E> = Arc<dyn Fn() -> Result<E, OcrError> + Send + Sync>;

pub struct LazyEngine<E> {
    label: &'static str,
    cell: Arc<OnceCell<Arc<E>>>,
    factory: Factory<E>,
}

impl<E: Send + Sync + 'static> LazyEngine<E> {
    /// `factory` runs on the blocking pool, at most once per successful initialization.
    pub fn new<F>(label: &'static str, factory: F) -> Self
    where
        F: Fn() -> Result<E, OcrError> + Send + Sync + 'static,
    {
        Self {
            label,
            cell: Arc::new(OnceCell::new()),
            factory: Arc::new(factory),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.get().is_some()
    }

    /// Return the shared engine, building it if this is the first call.
    ///
    /// A failed initialization leaves the cell empty so a later request can try again.
    pub async fn get(&self) -> Result<Arc<E>, OcrError> {
        if let Some(engine) = self.cell.get() {
            return Ok(Arc::clone(engine));
        }

        let cell = Arc::clone(&self.cell);
        let factory = Arc::clone(&self.factory);
        let label = self.label;
        tokio::task::spawn_blocking(move || {
            cell.get_or_try_init(|| {
                info!(engine = label, "Initializing OCR engine (first use)");
                let engine = factory().map(Arc::new);
                if engine.is_ok() {
                    info!(engine = label, "OCR engine ready");
                }
                engine
            })
            .map(Arc::clone)
        })
        .await
        .map_err(|e| OcrError::Engine(format!("{label} initialization panicked: {e}")))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_use_builds_once() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let lazy = Arc::new(LazyEngine::new("counting", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            Ok(42u32)
        }));

        let mut set = tokio::task::JoinSet::new();
        for _ in 0..16 {
            let lazy = Arc::clone(&lazy);
            set.spawn(async move { lazy.get().await.map(|e| *e) });
        }
        while let Some(res) = set.join_next().await {
            assert_eq!(res.unwrap().unwrap(), 42);
        }
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        assert!(lazy.is_initialized());
    }

    #[tokio::test]
    async fn failed_init_is_retried_on_next_call() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&attempts);
        let lazy = LazyEngine::new("flaky", move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(OcrError::EngineUnavailable("models still downloading".into()))
            } else {
                Ok("ready")
            }
        });

        assert!(matches!(lazy.get().await, Err(OcrError::EngineUnavailable(_))));
        assert!(!lazy.is_initialized());
        assert_eq!(*lazy.get().await.unwrap(), "ready");
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn cancelled_first_caller_does_not_trigger_second_build() {
        let builds = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&builds);
        let lazy = Arc::new(LazyEngine::new("slow", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(300));
            Ok("loaded")
        }));

        let first = {
            let lazy = Arc::clone(&lazy);
            tokio::spawn(async move { lazy.get().await.map(|e| *e) })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        first.abort();
        assert!(first.await.unwrap_err().is_cancelled());

        assert_eq!(*lazy.get().await.unwrap(), "loaded");
        assert_eq!(builds.load(Ordering::SeqCst), 1);
    }
}
