//! Connection dedup, symmetry, identity resolution and delete scoping.

#![allow(clippy::unwrap_used)]

mod support;

use icebreak_core::entities::connections::ConnectionKind;
use icebreak_core::entities::events::EventRecord;
use icebreak_core::entities::participants::Participant;
use icebreak_core::entities::users::UserRecord;
use icebreak_core::live::JoinNotifier;
use icebreak_core::services::connections::{ConnectionError, EndpointSide};
use icebreak_core::services::identity::IdentityError;
use support::{MemBackend, MemConnectionService};
use uuid::Uuid;

/// Event with two registered users admitted as participants.
async fn seed() -> (MemBackend, EventRecord, UserRecord, UserRecord, Participant, Participant) {
    let backend = MemBackend::new();
    let event = backend.add_event("Mixer", "48151623", 16);
    let alice = backend.add_user("alice@example.com", "Alice");
    let bob = backend.add_user("bob@example.com", "Bob");
    let admission = support::admission(&backend, JoinNotifier::new());
    let alice_p = admission.admit_user(event.id, alice.id, "Alice").await.unwrap();
    let bob_p = admission.admit_user(event.id, bob.id, "Bob").await.unwrap();
    (backend, event, alice, bob, alice_p, bob_p)
}

fn user_connections(backend: &MemBackend) -> MemConnectionService {
    support::connections(backend, ConnectionKind::User)
}

fn participant_connections(backend: &MemBackend) -> MemConnectionService {
    support::connections(backend, ConnectionKind::Participant)
}

#[tokio::test]
async fn duplicate_ordered_pair_conflicts_and_returns_the_existing_record() {
    let (backend, event, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();
    let b = bob.id.to_string();

    let first = svc
        .create(event.id, &a, &b, Some("met at the bar".into()))
        .await
        .unwrap();
    assert!(first.id.starts_with("userConnection_"));

    let err = svc.create(event.id, &a, &b, None).await.unwrap_err();
    match err {
        ConnectionError::Duplicate { existing } => assert_eq!(existing.id, first.id),
        other => panic!("expected Duplicate, got {other}"),
    }
}

#[tokio::test]
async fn reversed_pair_is_not_a_duplicate() {
    // Dedup is on the ordered pair: this is the source system's behavior,
    // kept deliberately even though the relation reads as symmetric.
    let (backend, event, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();
    let b = bob.id.to_string();

    let forward = svc.create(event.id, &a, &b, None).await.unwrap();
    let reverse = svc.create(event.id, &b, &a, None).await.unwrap();
    assert_ne!(forward.id, reverse.id);
}

#[tokio::test]
async fn queries_are_symmetric_over_either_endpoint() {
    let (backend, event, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();
    let b = bob.id.to_string();

    let conn = svc
        .create(event.id, &a, &b, Some("likes coffee".into()))
        .await
        .unwrap();

    let via_a = svc.list_by_endpoint(event.id, &a).await.unwrap();
    let via_b = svc.list_by_endpoint(event.id, &b).await.unwrap();
    assert_eq!(via_a, vec![conn.clone()]);
    assert_eq!(via_b, vec![conn]);
}

#[tokio::test]
async fn email_path_resolves_to_the_same_endpoints_as_direct_ids() {
    let (backend, event, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);

    let conn = svc
        .create_by_email(event.id, " Alice@Example.com", "bob@example.com", None)
        .await
        .unwrap();
    assert_eq!(conn.primary_id, alice.id.to_string());
    assert_eq!(conn.secondary_id, bob.id.to_string());

    // Reversed emails make a reversed ordered pair: a second record.
    let reversed = svc
        .create_by_email(event.id, "bob@example.com", "alice@example.com", None)
        .await
        .unwrap();
    assert_eq!(reversed.primary_id, bob.id.to_string());
    assert_ne!(reversed.id, conn.id);
}

#[tokio::test]
async fn email_path_rejects_equal_and_malformed_addresses() {
    let (backend, event, _, _, _, _) = seed().await;
    let svc = user_connections(&backend);

    let err = svc
        .create_by_email(event.id, "alice@example.com", " ALICE@example.com ", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::SameEmail), "{err}");

    let err = svc
        .create_by_email(event.id, "not-an-email", "bob@example.com", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidEmail(_)), "{err}");
}

#[tokio::test]
async fn missing_endpoints_are_reported_per_side() {
    let (backend, event, alice, _, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();
    let ghost = Uuid::new_v4().to_string();

    let err = svc.create(event.id, &ghost, &a, None).await.unwrap_err();
    assert!(
        matches!(
            err,
            ConnectionError::EndpointNotFound {
                side: EndpointSide::Primary,
                ..
            }
        ),
        "{err}"
    );

    let err = svc.create(event.id, &a, &ghost, None).await.unwrap_err();
    assert!(
        matches!(
            err,
            ConnectionError::EndpointNotFound {
                side: EndpointSide::Secondary,
                ..
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn participant_endpoints_must_belong_to_the_event() {
    let (backend, event, _, _, alice_p, bob_p) = seed().await;
    let svc = participant_connections(&backend);

    let conn = svc
        .create(event.id, &alice_p.id, &bob_p.id, None)
        .await
        .unwrap();
    assert!(conn.id.starts_with("participantConnection_"));

    // A participant of a different event is not a valid endpoint here.
    let elsewhere = backend.add_event("Elsewhere", "10101010", 4);
    let admission = support::admission(&backend, JoinNotifier::new());
    let stranger = admission
        .admit_guest(elsewhere.id, "Stranger")
        .await
        .unwrap();

    let err = svc
        .create(event.id, &alice_p.id, &stranger.id, None)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ConnectionError::EndpointNotFound {
                side: EndpointSide::Secondary,
                ..
            }
        ),
        "{err}"
    );
}

#[tokio::test]
async fn participant_email_path_distinguishes_resolution_failures() {
    let (backend, event, _, _, _, _) = seed().await;
    let svc = participant_connections(&backend);

    // Registered user who never joined this event.
    let outsider = backend.add_user("zoe@example.com", "Zoe");

    let err = svc
        .create_by_email(event.id, "zoe@example.com", "bob@example.com", None)
        .await
        .unwrap_err();
    match err {
        ConnectionError::Identity(IdentityError::ParticipantNotFound { user_id, .. }) => {
            assert_eq!(user_id, outsider.id);
        }
        other => panic!("expected ParticipantNotFound, got {other}"),
    }

    let err = svc
        .create_by_email(event.id, "nobody@example.com", "bob@example.com", None)
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ConnectionError::Identity(IdentityError::UserNotFound { .. })
        ),
        "{err}"
    );
}

#[tokio::test]
async fn email_path_creates_participant_connections() {
    let (backend, event, _, _, alice_p, bob_p) = seed().await;
    let svc = participant_connections(&backend);

    let conn = svc
        .create_by_email(event.id, "alice@example.com", "bob@example.com", None)
        .await
        .unwrap();
    assert_eq!(conn.primary_id, alice_p.id);
    assert_eq!(conn.secondary_id, bob_p.id);

    let listed = svc
        .list_by_email(event.id, "Bob@example.com")
        .await
        .unwrap();
    assert_eq!(listed, vec![conn]);
}

#[tokio::test]
async fn deletes_are_scoped_to_the_owning_event() {
    let (backend, event, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);
    let conn = svc
        .create(event.id, &alice.id.to_string(), &bob.id.to_string(), None)
        .await
        .unwrap();

    let wrong_event = backend.add_event("Wrong", "20202020", 4);
    let err = svc.delete(wrong_event.id, &conn.id).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound { .. }), "{err}");

    let deleted = svc.delete(event.id, &conn.id).await.unwrap();
    assert_eq!(deleted, conn);

    let err = svc.delete(event.id, &conn.id).await.unwrap_err();
    assert!(matches!(err, ConnectionError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn malformed_ids_fail_before_any_store_access() {
    let (backend, event, alice, _, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();

    let err = svc.create(event.id, "not-a-uuid", &a, None).await.unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidEndpoint(_)), "{err}");

    let err = svc.delete(event.id, "garbage").await.unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidConnectionId(_)), "{err}");

    let err = svc.list_by_endpoint(event.id, "???").await.unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidEndpoint(_)), "{err}");

    let svc = participant_connections(&backend);
    let err = svc
        .create(event.id, "userConnection_abc123", &a, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::InvalidEndpoint(_)), "{err}");
}

#[tokio::test]
async fn unknown_event_is_reported_on_create() {
    let (backend, _, alice, bob, _, _) = seed().await;
    let svc = user_connections(&backend);

    let err = svc
        .create(
            Uuid::new_v4(),
            &alice.id.to_string(),
            &bob.id.to_string(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ConnectionError::EventNotFound(_)), "{err}");
}

#[tokio::test]
async fn self_connection_is_allowed_on_the_id_path() {
    // The raw-id path carries no endpoints-must-differ check; only the
    // email path rejects identical endpoints. Source behavior, kept as is.
    let (backend, event, alice, _, _, _) = seed().await;
    let svc = user_connections(&backend);
    let a = alice.id.to_string();

    let conn = svc.create(event.id, &a, &a, None).await.unwrap();
    assert_eq!(conn.primary_id, conn.secondary_id);
}
