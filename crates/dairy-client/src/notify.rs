//! # Notice Delivery
//!
//! Workflows report user-facing outcomes (toasts) through a [`NoticeSink`].
//! The mobile shell implements it; tests collect notices in memory.

use std::sync::Mutex;

use dairy_core::Notice;
use tracing::debug;

/// Receives notices raised by workflows.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Discards every notice.
pub struct NoOpNoticeSink;

impl NoticeSink for NoOpNoticeSink {
    fn notify(&self, notice: Notice) {
        debug!(title = %notice.title, "Notice dropped");
    }
}

/// Keeps notices in order of arrival.
#[derive(Default)]
pub struct CollectingNoticeSink {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns everything received so far.
    pub fn notices(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Removes and returns everything received so far.
    pub fn drain(&self) -> Vec<Notice> {
        match self.notices.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NoticeSink for CollectingNoticeSink {
    fn notify(&self, notice: Notice) {
        match self.notices.lock() {
            Ok(mut guard) => guard.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }
}
