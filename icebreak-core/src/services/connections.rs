//! Connection creation, dedup, deletion and queries.
//!
//! One service covers both connection variants; [`ConnectionKind`] selects
//! the endpoint validation, the id prefix and the backing table. Dedup is
//! on the ordered `(primary, secondary)` pair — `(a, b)` and `(b, a)`
//! coexist — while queries treat the pair as symmetric.

use crate::entities::connections::{Connection, ConnectionKind, NewConnection};
use crate::ids;
use crate::services::identity::{EmailAddress, IdentityError, IdentityResolver, InvalidEmail};
use crate::stores::{ConnectionStore, EventStore, ParticipantStore, StoreError, UniqueKey, UserStore};
use std::fmt;
use uuid::Uuid;

/// Which endpoint of a pair an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointSide {
    Primary,
    Secondary,
}

impl fmt::Display for EndpointSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EndpointSide::Primary => "primary",
            EndpointSide::Secondary => "secondary",
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConnectionError {
    #[error("invalid endpoint id: {0:?}")]
    InvalidEndpoint(String),
    #[error("invalid connection id: {0:?}")]
    InvalidConnectionId(String),
    #[error(transparent)]
    InvalidEmail(#[from] InvalidEmail),
    #[error("primary and secondary emails must differ")]
    SameEmail,
    #[error("event not found: {0}")]
    EventNotFound(Uuid),
    #[error("{side} endpoint not found in this event: {endpoint_id}")]
    EndpointNotFound {
        side: EndpointSide,
        endpoint_id: String,
    },
    #[error("connection already exists for this pair")]
    Duplicate { existing: Box<Connection> },
    #[error("connection {connection_id} not found in event {event_id}")]
    NotFound {
        event_id: Uuid,
        connection_id: String,
    },
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Records and queries pairwise connections within one event's scope.
#[derive(Clone)]
pub struct ConnectionService<C, E, U, P> {
    kind: ConnectionKind,
    store: C,
    events: E,
    users: U,
    participants: P,
    resolver: IdentityResolver<U, P>,
}

impl<C, E, U, P> ConnectionService<C, E, U, P>
where
    C: ConnectionStore,
    E: EventStore,
    U: UserStore + Clone,
    P: ParticipantStore + Clone,
{
    pub fn new(kind: ConnectionKind, store: C, events: E, users: U, participants: P) -> Self {
        let resolver = IdentityResolver::new(users.clone(), participants.clone());
        Self {
            kind,
            store,
            events,
            users,
            participants,
            resolver,
        }
    }

    pub fn kind(&self) -> ConnectionKind {
        self.kind
    }

    /// Create a connection between two already-resolved endpoint ids.
    ///
    /// Endpoint format is validated before any store access. On a duplicate
    /// ordered pair the pre-existing record is returned inside the error.
    #[tracing::instrument(skip(self, description), fields(%event_id))]
    pub async fn create(
        &self,
        event_id: Uuid,
        primary_id: &str,
        secondary_id: &str,
        description: Option<String>,
    ) -> Result<Connection, ConnectionError> {
        let primary = self.parse_endpoint(primary_id)?;
        let secondary = self.parse_endpoint(secondary_id)?;

        self.require_event(event_id).await?;
        self.check_endpoint(event_id, EndpointSide::Primary, &primary)
            .await?;
        self.check_endpoint(event_id, EndpointSide::Secondary, &secondary)
            .await?;

        if let Some(existing) = self
            .store
            .find_by_pair(event_id, &primary, &secondary)
            .await?
        {
            return Err(ConnectionError::Duplicate {
                existing: Box::new(existing),
            });
        }

        let new = NewConnection {
            id: ids::generate_entity_id(self.kind.id_prefix()),
            event_id,
            primary_id: primary.clone(),
            secondary_id: secondary.clone(),
            description,
        };
        match self.store.insert(new).await {
            Ok(connection) => Ok(connection),
            Err(StoreError::UniqueViolation(UniqueKey::ConnectionPair)) => {
                // Lost the insert race; surface the surviving record.
                match self
                    .store
                    .find_by_pair(event_id, &primary, &secondary)
                    .await?
                {
                    Some(existing) => Err(ConnectionError::Duplicate {
                        existing: Box::new(existing),
                    }),
                    None => Err(ConnectionError::Store(StoreError::UniqueViolation(
                        UniqueKey::ConnectionPair,
                    ))),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Create a connection addressed by the endpoints' emails.
    ///
    /// Emails are normalized and validated first; identical normalized
    /// emails are rejected (the id path carries no such check).
    #[tracing::instrument(skip(self, description), fields(%event_id))]
    pub async fn create_by_email(
        &self,
        event_id: Uuid,
        primary_email: &str,
        secondary_email: &str,
        description: Option<String>,
    ) -> Result<Connection, ConnectionError> {
        let primary = EmailAddress::parse(primary_email)?;
        let secondary = EmailAddress::parse(secondary_email)?;
        if primary == secondary {
            return Err(ConnectionError::SameEmail);
        }
        let primary_id = self.resolve_email(event_id, &primary).await?;
        let secondary_id = self.resolve_email(event_id, &secondary).await?;
        self.create(event_id, &primary_id, &secondary_id, description)
            .await
    }

    /// Delete a connection, scoped to its event.
    #[tracing::instrument(skip(self), fields(%event_id, %connection_id))]
    pub async fn delete(
        &self,
        event_id: Uuid,
        connection_id: &str,
    ) -> Result<Connection, ConnectionError> {
        if !ids::is_well_formed_entity_id(connection_id, self.kind.id_prefix()) {
            return Err(ConnectionError::InvalidConnectionId(
                connection_id.to_owned(),
            ));
        }
        self.store
            .delete(event_id, connection_id)
            .await?
            .ok_or_else(|| ConnectionError::NotFound {
                event_id,
                connection_id: connection_id.to_owned(),
            })
    }

    /// All connections in the event touching the endpoint, on either side.
    pub async fn list_by_endpoint(
        &self,
        event_id: Uuid,
        endpoint_id: &str,
    ) -> Result<Vec<Connection>, ConnectionError> {
        let endpoint = self.parse_endpoint(endpoint_id)?;
        Ok(self.store.list_by_endpoint(event_id, &endpoint).await?)
    }

    /// Resolve an email to its endpoint, then query symmetrically.
    pub async fn list_by_email(
        &self,
        event_id: Uuid,
        email: &str,
    ) -> Result<Vec<Connection>, ConnectionError> {
        let email = EmailAddress::parse(email)?;
        let endpoint = self.resolve_email(event_id, &email).await?;
        Ok(self.store.list_by_endpoint(event_id, &endpoint).await?)
    }

    async fn require_event(&self, event_id: Uuid) -> Result<(), ConnectionError> {
        self.events
            .find_by_id(event_id)
            .await?
            .ok_or(ConnectionError::EventNotFound(event_id))?;
        Ok(())
    }

    /// Normalize an endpoint id, rejecting malformed input before any
    /// store access.
    fn parse_endpoint(&self, raw: &str) -> Result<String, ConnectionError> {
        let raw = raw.trim();
        match self.kind {
            ConnectionKind::User => Uuid::parse_str(raw)
                .map(|id| id.to_string())
                .map_err(|_| ConnectionError::InvalidEndpoint(raw.to_owned())),
            ConnectionKind::Participant => {
                if ids::is_well_formed_entity_id(raw, ids::PARTICIPANT_ID_PREFIX) {
                    Ok(raw.to_owned())
                } else {
                    Err(ConnectionError::InvalidEndpoint(raw.to_owned()))
                }
            }
        }
    }

    /// Endpoint existence, scoped to the event for the participant variant.
    async fn check_endpoint(
        &self,
        event_id: Uuid,
        side: EndpointSide,
        endpoint_id: &str,
    ) -> Result<(), ConnectionError> {
        let found = match self.kind {
            ConnectionKind::User => match Uuid::parse_str(endpoint_id) {
                Ok(user_id) => self.users.exists(user_id).await?,
                Err(_) => false,
            },
            ConnectionKind::Participant => self
                .participants
                .find_by_id(endpoint_id)
                .await?
                .is_some_and(|p| p.event_id == event_id),
        };
        if found {
            Ok(())
        } else {
            Err(ConnectionError::EndpointNotFound {
                side,
                endpoint_id: endpoint_id.to_owned(),
            })
        }
    }

    async fn resolve_email(
        &self,
        event_id: Uuid,
        email: &EmailAddress,
    ) -> Result<String, ConnectionError> {
        let user = self.resolver.user_by_email(email).await?;
        match self.kind {
            ConnectionKind::User => Ok(user.id.to_string()),
            ConnectionKind::Participant => Ok(self
                .resolver
                .participant_for_user(event_id, user.id)
                .await?
                .id),
        }
    }
}
