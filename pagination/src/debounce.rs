//! Debounced recomputation on content change.
//!
//! DESIGN
//! ======
//! Full remeasurement is the expensive step, so content-change notifications
//! are coalesced: a background task waits until no new content has arrived
//! for the debounce window, then paginates the latest content once and
//! publishes the result on a `watch` channel. Intermediate versions are never
//! paginated. Pagination itself runs on tokio's blocking pool, so a slow
//! [`MeasureSurface`] never stalls the runtime's workers. The task exits once
//! the [`Repaginator`] is dropped.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::engine::{Page, Paginator};
use crate::measure::MeasureSurface;

/// Quiet period after the last change before pages are recomputed.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(150);

/// Handle to a background pagination task.
pub struct Repaginator {
    content_tx: watch::Sender<String>,
    pages_tx: Arc<watch::Sender<Vec<Page>>>,
    recomputes: Arc<AtomicUsize>,
    task: JoinHandle<()>,
}

impl Repaginator {
    /// Spawn the task on the current tokio runtime.
    ///
    /// The initial page list is the pagination of empty content.
    #[must_use]
    pub fn spawn<S>(paginator: Paginator<S>, window: Duration) -> Self
    where
        S: MeasureSurface + Send + Sync + 'static,
    {
        let (content_tx, mut content_rx) = watch::channel(String::new());
        let (pages_tx, _) = watch::channel(paginator.paginate(""));
        let pages_tx = Arc::new(pages_tx);
        let recomputes = Arc::new(AtomicUsize::new(0));

        let publisher = Arc::clone(&pages_tx);
        let counter = Arc::clone(&recomputes);
        let paginator = Arc::new(paginator);
        let task = tokio::spawn(async move {
            while content_rx.changed().await.is_ok() {
                let mut open = true;
                while open {
                    tokio::select! {
                        changed = content_rx.changed() => open = changed.is_ok(),
                        () = tokio::time::sleep(window) => break,
                    }
                }
                let html = content_rx.borrow_and_update().clone();
                let worker = Arc::clone(&paginator);
                match tokio::task::spawn_blocking(move || worker.paginate(&html)).await {
                    Ok(pages) => {
                        let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
                        info!(pages = pages.len(), recompute = n, "repaginated");
                        publisher.send_replace(pages);
                    }
                    Err(e) => warn!(error = %e, "repagination task failed"),
                }
                if !open {
                    break;
                }
            }
        });

        Self { content_tx, pages_tx, recomputes, task }
    }

    /// Report new content. Cheap; pagination happens after the quiet period.
    pub fn notify(&self, html: impl Into<String>) {
        self.content_tx.send_replace(html.into());
    }

    /// Receiver for the latest page list.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Vec<Page>> {
        self.pages_tx.subscribe()
    }

    /// Most recently published pages.
    #[must_use]
    pub fn pages(&self) -> Vec<Page> {
        self.pages_tx.borrow().clone()
    }

    /// Number of completed recomputations.
    #[must_use]
    pub fn recomputes(&self) -> usize {
        self.recomputes.load(Ordering::Relaxed)
    }

    /// Stop the task without waiting for a pending recompute.
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl std::fmt::Debug for Repaginator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repaginator").field("recomputes", &self.recomputes()).finish_non_exhaustive()
    }
}
