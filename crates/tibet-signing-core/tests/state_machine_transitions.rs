use tibet_signing_core::{
    connection_transition, replay, ConnectionAction, ConnectionState, StateError,
};

#[test]
fn fresh_handshake_path_transitions() {
    let (s1, _) = connection_transition(ConnectionState::NoClient, ConnectionAction::ClientInitialized)
        .expect("no client -> ready");
    assert_eq!(s1, ConnectionState::ClientReady);
    let (s2, _) = connection_transition(s1, ConnectionAction::NoActivePairing)
        .expect("ready -> no pairing");
    assert_eq!(s2, ConnectionState::NoPairing);
    let (s3, _) = connection_transition(s2, ConnectionAction::HandshakePresented)
        .expect("no pairing -> pending");
    assert_eq!(s3, ConnectionState::HandshakePending);
    let (s4, transition) =
        connection_transition(s3, ConnectionAction::Approved).expect("pending -> approved");
    assert_eq!(s4, ConnectionState::SessionApproved);
    assert_eq!(transition.from, ConnectionState::HandshakePending);
    assert_eq!(transition.reason, "session approved");
}

#[test]
fn resumed_pairing_skips_handshake() {
    let state = replay(&[
        ConnectionAction::ClientInitialized,
        ConnectionAction::ActivePairingFound,
        ConnectionAction::Approved,
    ])
    .expect("resume path");
    assert_eq!(state, ConnectionState::SessionApproved);

    let err = connection_transition(
        ConnectionState::PairingActive,
        ConnectionAction::HandshakePresented,
    )
    .expect_err("resumed pairing never presents a modal");
    assert!(err.to_string().contains("illegal connection transition"));
}

#[test]
fn init_failure_stays_without_client() {
    let (state, _) =
        connection_transition(ConnectionState::NoClient, ConnectionAction::ClientInitFailed)
            .expect("init failure");
    assert_eq!(state, ConnectionState::NoClient);

    let err = connection_transition(ConnectionState::NoClient, ConnectionAction::SessionFound)
        .expect_err("store lookups need a client");
    assert_eq!(
        err,
        StateError::IllegalTransition {
            from: ConnectionState::NoClient,
            action: ConnectionAction::SessionFound,
        }
    );
}

#[test]
fn handshake_failures_return_to_client_ready() {
    for action in [
        ConnectionAction::Rejected,
        ConnectionAction::Cancelled,
        ConnectionAction::TimedOut,
    ] {
        let (state, _) = connection_transition(ConnectionState::HandshakePending, action)
            .expect("failure edge");
        assert_eq!(state, ConnectionState::ClientReady);
    }
}

#[test]
fn disconnect_and_session_loss_release_the_session() {
    let state = replay(&[
        ConnectionAction::ClientInitialized,
        ConnectionAction::SessionFound,
        ConnectionAction::Disconnect,
    ])
    .expect("disconnect");
    assert_eq!(state, ConnectionState::ClientReady);

    let (state, _) =
        connection_transition(ConnectionState::SessionApproved, ConnectionAction::SessionLost)
            .expect("session lost");
    assert_eq!(state, ConnectionState::ClientReady);
}

#[test]
fn replay_stops_at_first_illegal_step() {
    let err = replay(&[
        ConnectionAction::ClientInitialized,
        ConnectionAction::Approved,
        ConnectionAction::Disconnect,
    ])
    .expect_err("approval without a handshake");
    assert!(matches!(
        err,
        StateError::IllegalTransition {
            from: ConnectionState::ClientReady,
            action: ConnectionAction::Approved,
        }
    ));
}
