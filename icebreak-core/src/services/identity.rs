//! Email-based identity resolution.
//!
//! Two independent steps, each with its own not-found failure: an unknown
//! email and a user who never joined the event are actionable differently
//! by clients.

use crate::entities::participants::Participant;
use crate::entities::users::UserRecord;
use crate::stores::{ParticipantStore, StoreError, UserStore};
use std::fmt;
use uuid::Uuid;

/// A normalized (trimmed, lowercased) and validated email address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid email address: {0:?}")]
pub struct InvalidEmail(pub String);

impl EmailAddress {
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let normalized = raw.trim().to_ascii_lowercase();
        if is_valid_email(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(InvalidEmail(raw.trim().to_owned()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && email.bytes().all(|b| b.is_ascii_graphic())
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("no user with email {email}")]
    UserNotFound { email: EmailAddress },
    #[error("user {user_id} has not joined event {event_id}")]
    ParticipantNotFound { event_id: Uuid, user_id: Uuid },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolves emails to users and users to per-event participants.
#[derive(Clone)]
pub struct IdentityResolver<U, P> {
    users: U,
    participants: P,
}

impl<U: UserStore, P: ParticipantStore> IdentityResolver<U, P> {
    pub fn new(users: U, participants: P) -> Self {
        Self { users, participants }
    }

    pub async fn user_by_email(&self, email: &EmailAddress) -> Result<UserRecord, IdentityError> {
        self.users
            .find_by_email(email.as_str())
            .await?
            .ok_or_else(|| IdentityError::UserNotFound {
                email: email.clone(),
            })
    }

    pub async fn participant_for_user(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Participant, IdentityError> {
        self.participants
            .find_by_user(event_id, user_id)
            .await?
            .ok_or(IdentityError::ParticipantNotFound { event_id, user_id })
    }

    /// Full chain: email → user → participant in the given event.
    pub async fn participant_by_email(
        &self,
        event_id: Uuid,
        email: &EmailAddress,
    ) -> Result<Participant, IdentityError> {
        let user = self.user_by_email(email).await?;
        self.participant_for_user(event_id, user.id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let email = EmailAddress::parse("  Alice@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "alice@example.com");
    }

    #[test]
    fn equal_after_normalization() {
        let a = EmailAddress::parse("alice@example.com").unwrap();
        let b = EmailAddress::parse(" ALICE@EXAMPLE.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parse_rejects_malformed_addresses() {
        for bad in [
            "",
            "alice",
            "@example.com",
            "alice@",
            "alice@example",
            "alice@.example.com",
            "alice@example.com.",
            "alice@exa mple.com",
            "alice@b@example.com",
        ] {
            assert!(EmailAddress::parse(bad).is_err(), "accepted {bad:?}");
        }
    }
}
