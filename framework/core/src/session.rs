use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Source of session tokens for a single monitor.
///
/// Every call to [SessionEpoch::begin] or [SessionEpoch::invalidate] moves the epoch forward, which
/// makes every token handed out before that point stale. A polling cycle compares its token at the
/// moment it applies results, so work that was in flight for a previous target can never land in
/// the state of the current one.
#[derive(Debug, Clone, Default)]
pub struct SessionEpoch {
    current: Arc<AtomicU64>,
}

impl SessionEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new session, invalidating any token issued for an earlier one.
    pub fn begin(&self) -> SessionToken {
        let epoch = self.current.fetch_add(1, Ordering::AcqRel) + 1;
        SessionToken {
            epoch,
            current: self.current.clone(),
        }
    }

    /// End the current session without starting another.
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::AcqRel);
    }

    /// The epoch of the newest session, `0` before the first one starts.
    pub fn current(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }
}

/// Invalidation token held by the poller of one session.
#[derive(Debug, Clone)]
pub struct SessionToken {
    epoch: u64,
    current: Arc<AtomicU64>,
}

impl SessionToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Point in time check that the session this token was issued for is still the active one.
    pub fn is_current(&self) -> bool {
        self.current.load(Ordering::Acquire) == self.epoch
    }
}
