use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use tibet_signing_core::{Notice, NoticeLevel, Notifier};

/// Log-only notifier for headless runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
    }
}

/// Toasts waiting to be drawn. Bounded: the oldest toast is dropped once full.
#[derive(Debug, Clone)]
pub struct ToastQueue {
    inner: Arc<Mutex<VecDeque<Notice>>>,
    capacity: usize,
}

impl Default for ToastQueue {
    fn default() -> Self {
        Self::with_capacity(16)
    }
}

impl ToastQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity: capacity.max(1),
        }
    }

    pub fn drain(&self) -> Vec<Notice> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Notice> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }
}

impl Notifier for ToastQueue {
    fn notify(&self, notice: Notice) {
        log_notice(&notice);
        let mut queue = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if queue.len() == self.capacity {
            queue.pop_front();
        }
        queue.push_back(notice);
    }
}

fn log_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info => tracing::info!(message = %notice.message, "notice"),
        NoticeLevel::Success => tracing::info!(message = %notice.message, "notice ok"),
        NoticeLevel::Error => tracing::warn!(message = %notice.message, "notice error"),
    }
}

#[cfg(test)]
mod tests {
    use tibet_signing_core::{Notice, Notifier};

    use super::ToastQueue;

    #[test]
    fn full_queue_drops_oldest() {
        let queue = ToastQueue::with_capacity(2);
        queue.notify(Notice::info("one"));
        queue.notify(Notice::info("two"));
        queue.notify(Notice::error("three"));

        let messages: Vec<_> = queue.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
        assert!(queue.snapshot().is_empty());
    }
}
