//! Close handles for out-of-band channel presenters.
//!
//! A presenter returns a [`ModalHandle`] from `present`; whoever drives the handshake owns it
//! and closes it once the approval resolves. Closing runs the presenter's teardown exactly
//! once. Dropping the last strong handle closes as well.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::watch;

type CloseHook = Box<dyn FnOnce() + Send>;

#[derive(Clone)]
pub struct ModalHandle {
    inner: Arc<ModalInner>,
}

/// Non-owning handle, for UI surfaces that must be able to cancel a modal without keeping it
/// alive.
#[derive(Clone)]
pub struct WeakModalHandle {
    inner: Weak<ModalInner>,
}

struct ModalInner {
    closed: watch::Sender<bool>,
    on_close: Mutex<Option<CloseHook>>,
}

impl ModalInner {
    fn close(&self) {
        let hook = self
            .on_close
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(hook) = hook {
            hook();
        }
        self.closed.send_replace(true);
    }
}

impl Drop for ModalInner {
    fn drop(&mut self) {
        self.close();
    }
}

impl ModalHandle {
    pub fn new(on_close: impl FnOnce() + Send + 'static) -> Self {
        let (closed, _) = watch::channel(false);
        Self {
            inner: Arc::new(ModalInner {
                closed,
                on_close: Mutex::new(Some(Box::new(on_close))),
            }),
        }
    }

    /// A handle with nothing to tear down.
    pub fn detached() -> Self {
        Self::new(|| {})
    }

    pub fn close(&self) {
        self.inner.close();
    }

    pub fn is_closed(&self) -> bool {
        *self.inner.closed.borrow()
    }

    /// Resolves once the modal has been closed, by the flow or by the user.
    pub async fn closed(&self) {
        let mut rx = self.inner.closed.subscribe();
        let _ = rx.wait_for(|closed| *closed).await;
    }

    pub fn downgrade(&self) -> WeakModalHandle {
        WeakModalHandle {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

impl std::fmt::Debug for ModalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModalHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl WeakModalHandle {
    /// Returns `false` when the modal no longer exists.
    pub fn close(&self) -> bool {
        match self.inner.upgrade() {
            Some(inner) => {
                inner.close();
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for WeakModalHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakModalHandle").finish_non_exhaustive()
    }
}
