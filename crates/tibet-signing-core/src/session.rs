use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::domain::{ClientOptions, PairingSession, SessionRecord};
use crate::integration::{WaitStage, WalletError};
use crate::ports::{SignClientFactory, SignClientPort};

/// First pairing flagged active, in the signer's store order.
pub fn active_pairing(pairings: &[PairingSession]) -> Option<&PairingSession> {
    pairings.iter().find(|pairing| pairing.active)
}

/// First acknowledged session, in the signer's store order.
pub fn canonical_session(sessions: &[SessionRecord]) -> Option<&SessionRecord> {
    sessions.iter().find(|session| session.acknowledged)
}

/// Lazily initialized SDK client. At most one client is ever constructed; a failed or timed
/// out init leaves the cell empty so the next call starts over.
pub struct SignerClient {
    factory: Arc<dyn SignClientFactory>,
    options: ClientOptions,
    init_timeout: Duration,
    client: OnceCell<Arc<dyn SignClientPort>>,
}

impl SignerClient {
    pub fn new(
        factory: Arc<dyn SignClientFactory>,
        options: ClientOptions,
        init_timeout: Duration,
    ) -> Self {
        Self {
            factory,
            options,
            init_timeout,
            client: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    /// The client if one was already constructed; never triggers init.
    pub fn get(&self) -> Option<Arc<dyn SignClientPort>> {
        self.client.get().map(Arc::clone)
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub async fn get_or_init(&self) -> Result<Arc<dyn SignClientPort>, WalletError> {
        let client = self
            .client
            .get_or_try_init(|| async {
                tracing::debug!(project_id = %self.options.project_id, "initializing sign client");
                tokio::time::timeout(self.init_timeout, self.factory.init(&self.options))
                    .await
                    .map_err(|_| WalletError::Timeout(WaitStage::ClientInit))?
                    .map_err(|e| WalletError::Initialization(e.to_string()))
            })
            .await?;
        Ok(Arc::clone(client))
    }
}

impl std::fmt::Debug for SignerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignerClient")
            .field("options", &self.options)
            .field("init_timeout", &self.init_timeout)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{active_pairing, canonical_session};
    use crate::domain::{PairingSession, SessionRecord};

    fn pairing(topic: &str, active: bool) -> PairingSession {
        PairingSession {
            topic: topic.to_owned(),
            active,
            granted_methods: BTreeSet::new(),
            granted_chains: BTreeSet::new(),
        }
    }

    #[test]
    fn inactive_pairing_never_wins_over_active_in_any_order() {
        let orders = [
            vec![pairing("stale", false), pairing("live", true)],
            vec![pairing("live", true), pairing("stale", false)],
            vec![
                pairing("stale-a", false),
                pairing("live", true),
                pairing("stale-b", false),
            ],
        ];
        for order in orders {
            let selected = active_pairing(&order).expect("active pairing");
            assert_eq!(selected.topic, "live");
        }
        assert!(active_pairing(&[pairing("stale", false)]).is_none());
    }

    #[test]
    fn first_active_pairing_breaks_ties() {
        let store = vec![pairing("first", true), pairing("second", true)];
        assert_eq!(active_pairing(&store).expect("pairing").topic, "first");
    }

    #[test]
    fn canonical_session_skips_unacknowledged() {
        let sessions = vec![
            SessionRecord {
                topic: "pending".to_owned(),
                pairing_topic: "p".to_owned(),
                acknowledged: false,
                namespaces: Default::default(),
            },
            SessionRecord {
                topic: "acked".to_owned(),
                pairing_topic: "p".to_owned(),
                acknowledged: true,
                namespaces: Default::default(),
            },
        ];
        assert_eq!(
            canonical_session(&sessions).expect("session").topic,
            "acked"
        );
    }
}
