use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    NoClient,
    ClientReady,
    NoPairing,
    PairingActive,
    HandshakePending,
    SessionApproved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionAction {
    ClientInitialized,
    ClientInitFailed,
    SessionFound,
    SessionLost,
    ActivePairingFound,
    NoActivePairing,
    HandshakePresented,
    Approved,
    Rejected,
    Cancelled,
    TimedOut,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub reason: &'static str,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("illegal connection transition: {from:?} on {action:?}")]
    IllegalTransition {
        from: ConnectionState,
        action: ConnectionAction,
    },
}

pub fn connection_transition(
    from: ConnectionState,
    action: ConnectionAction,
) -> Result<(ConnectionState, StateTransition), StateError> {
    use ConnectionAction as A;
    use ConnectionState as S;

    let (to, reason) = match (from, action) {
        (S::NoClient, A::ClientInitialized) => (S::ClientReady, "signer client initialized"),
        // Already-initialized clients are reused; init is idempotent.
        (S::ClientReady, A::ClientInitialized) => (S::ClientReady, "signer client reused"),
        (S::NoClient, A::ClientInitFailed) => (S::NoClient, "signer client init failed"),
        (S::ClientReady, A::SessionFound) => (S::SessionApproved, "approved session in store"),
        (S::SessionApproved, A::SessionFound) => (S::SessionApproved, "session still approved"),
        (S::SessionApproved, A::SessionLost) => (S::ClientReady, "session missing from store"),
        (S::ClientReady, A::ActivePairingFound) => (S::PairingActive, "resuming active pairing"),
        (S::ClientReady, A::NoActivePairing) => (S::NoPairing, "no active pairing"),
        (S::NoPairing, A::HandshakePresented) => {
            (S::HandshakePending, "pairing uri presented")
        }
        (S::PairingActive | S::HandshakePending, A::Approved) => {
            (S::SessionApproved, "session approved")
        }
        (S::PairingActive | S::HandshakePending | S::NoPairing, A::Rejected) => {
            (S::ClientReady, "session rejected")
        }
        (S::NoPairing | S::PairingActive | S::HandshakePending, A::Cancelled) => {
            (S::ClientReady, "handshake cancelled")
        }
        (S::PairingActive | S::HandshakePending, A::TimedOut) => {
            (S::ClientReady, "approval timed out")
        }
        (S::SessionApproved | S::ClientReady, A::Disconnect) => {
            (S::ClientReady, "local session released")
        }
        (S::NoClient, A::Disconnect) => (S::NoClient, "nothing to release"),
        _ => return Err(StateError::IllegalTransition { from, action }),
    };

    Ok((
        to,
        StateTransition {
            from,
            to,
            reason,
        },
    ))
}

/// Replays `actions` from `NoClient`, stopping at the first illegal step.
pub fn replay(actions: &[ConnectionAction]) -> Result<ConnectionState, StateError> {
    actions
        .iter()
        .try_fold(ConnectionState::NoClient, |state, action| {
            connection_transition(state, *action).map(|(next, _)| next)
        })
}
