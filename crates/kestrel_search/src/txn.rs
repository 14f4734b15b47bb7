//! Read-snapshot lifecycle for the dispatch path.
//!
//! A snapshot is acquired before fan-out and must be released exactly once
//! on every exit path — success, timeout, or failure. The guard releases on
//! drop, so early returns and `?` propagation are covered.

/// Provider of per-request read snapshots.
pub trait SnapshotSource: Send + Sync {
    fn begin(&self) -> SnapshotGuard;
}

/// RAII handle over one read snapshot.
pub struct SnapshotGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl SnapshotGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// A guard with nothing to release.
    pub fn noop() -> Self {
        Self { release: None }
    }

    /// Release eagerly instead of waiting for drop.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Snapshot source for deployments without read transactions.
pub struct NoopSnapshots;

impl SnapshotSource for NoopSnapshots {
    fn begin(&self) -> SnapshotGuard {
        SnapshotGuard::noop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_guard_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        {
            let counter = Arc::clone(&released);
            let _guard = SnapshotGuard::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_explicit_release_is_exactly_once() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&released);
        let guard = SnapshotGuard::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        guard.release();
        // Drop already consumed the closure; nothing runs twice.
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_noop_guard_is_inert() {
        let _guard = NoopSnapshots.begin();
    }
}
