//! Pairing modal presenter. The UI polls [`QrConnectionModal::open_modals`] to draw whatever is
//! currently presented; the flow's close handle removes the entry again.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use tibet_signing_core::{ConnectionPresenter, ModalHandle, PortError, WeakModalHandle};

use crate::qr::{render_matrix, render_text_qr, QrMatrix, QrRenderError};

#[derive(Clone)]
pub struct PresentedModal {
    pub id: u64,
    pub payload: String,
    pub qr: QrMatrix,
    /// Terminal rendering of the same code, for headless pairing.
    pub text_qr: String,
    handle: WeakModalHandle,
}

impl PresentedModal {
    /// User dismissed the modal. Cancels the handshake waiting on it.
    pub fn cancel(&self) -> bool {
        self.handle.close()
    }
}

impl std::fmt::Debug for PresentedModal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PresentedModal")
            .field("id", &self.id)
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
pub struct QrConnectionModal {
    inner: Arc<Mutex<ModalRegistry>>,
}

#[derive(Debug, Default)]
struct ModalRegistry {
    next_id: u64,
    presented_total: u64,
    open: BTreeMap<u64, PresentedModal>,
}

impl QrConnectionModal {
    pub fn open_modals(&self) -> Vec<PresentedModal> {
        self.registry().open.values().cloned().collect()
    }

    /// How many modals were ever presented, closed ones included.
    pub fn presented_count(&self) -> u64 {
        self.registry().presented_total
    }

    pub fn cancel(&self, id: u64) -> bool {
        // Clone out first: closing re-enters the registry.
        let modal = self.registry().open.get(&id).cloned();
        modal.map(|m| m.cancel()).unwrap_or(false)
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, ModalRegistry> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConnectionPresenter for QrConnectionModal {
    fn present(&self, payload: &str) -> Result<ModalHandle, PortError> {
        let encode_err =
            |e: QrRenderError| PortError::Validation(format!("pairing uri not encodable: {e}"));
        let qr = render_matrix(payload).map_err(encode_err)?;
        let text_qr = render_text_qr(payload).map_err(encode_err)?;

        let mut g = self.registry();
        g.next_id = g.next_id.saturating_add(1);
        g.presented_total = g.presented_total.saturating_add(1);
        let id = g.next_id;

        let registry = Arc::downgrade(&self.inner);
        let handle = ModalHandle::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .open
                    .remove(&id);
            }
            tracing::debug!(modal = id, "pairing modal closed");
        });
        g.open.insert(
            id,
            PresentedModal {
                id,
                payload: payload.to_owned(),
                qr,
                text_qr: text_qr.clone(),
                handle: handle.downgrade(),
            },
        );
        tracing::info!(modal = id, uri = %payload, "presenting pairing modal\n{text_qr}");
        Ok(handle)
    }
}
