use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Event, EventChanges, EventFilter, NewEvent, Participant};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryEventStore;
pub use postgres::PgEventStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt event document {id}: {reason}")]
    Corrupt { id: Uuid, reason: String },
}

/// Result of a conditional participant append.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinOutcome {
    Joined(Event),
    AlreadyJoined,
    NotFound,
}

/// Persistence primitives for the `events` collection.
///
/// Implementations must make [`EventStore::append_participant`] a single
/// atomic conditional write: the participant lands only if no existing
/// participant has the same `user_email`, and the count moves with it.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError>;

    /// Events dated at or after `now`, ascending by event date.
    async fn find_upcoming(
        &self,
        filter: &EventFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError>;

    /// Newest first.
    async fn find_by_creator(&self, email: &str) -> Result<Vec<Event>, StoreError>;

    /// Ascending by event date.
    async fn find_by_participant(&self, email: &str) -> Result<Vec<Event>, StoreError>;

    async fn append_participant(
        &self,
        id: Uuid,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError>;

    /// Applies `changes` to the event owned by `creator_email`. Returns `None`
    /// when no document matched.
    async fn apply_changes(
        &self,
        id: Uuid,
        creator_email: &str,
        changes: &EventChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError>;
}
