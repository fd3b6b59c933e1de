use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::{EventStore, JoinOutcome, StoreError};
use crate::models::{Event, EventChanges, EventFilter, NewEvent, Participant};

const EVENT_COLUMNS: &str = "id, title, description, event_type, thumbnail, location, \
    event_date, creator_id, creator_email, creator_name, creator_photo, created_at, \
    updated_at, participants, participant_count";

/// Event documents stored one row per event, participants embedded as a
/// JSONB array.
#[derive(Debug, Clone)]
pub struct PgEventStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct EventRow {
    id: Uuid,
    title: String,
    description: String,
    event_type: String,
    thumbnail: String,
    location: String,
    event_date: DateTime<Utc>,
    creator_id: String,
    creator_email: String,
    creator_name: String,
    creator_photo: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    participants: Json<Vec<Participant>>,
    participant_count: i32,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let participants = row.participants.0;
        if usize::try_from(row.participant_count).ok() != Some(participants.len()) {
            return Err(StoreError::Corrupt {
                id: row.id,
                reason: format!(
                    "participant_count {} does not match {} participants",
                    row.participant_count,
                    participants.len()
                ),
            });
        }

        Ok(Event {
            id: row.id,
            title: row.title,
            description: row.description,
            event_type: row.event_type,
            thumbnail: row.thumbnail,
            location: row.location,
            event_date: row.event_date,
            creator_id: row.creator_id,
            creator_email: row.creator_email,
            creator_name: row.creator_name,
            creator_photo: row.creator_photo,
            created_at: row.created_at,
            updated_at: row.updated_at,
            participants,
            participant_count: row.participant_count,
        })
    }
}

fn into_events(rows: Vec<EventRow>) -> Result<Vec<Event>, StoreError> {
    rows.into_iter().map(Event::try_from).collect()
}

impl PgEventStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: Uuid) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM events WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError> {
        let sql = format!(
            "INSERT INTO events (title, description, event_type, thumbnail, location, \
             event_date, creator_id, creator_email, creator_name, creator_photo, created_at, \
             updated_at, participants, participant_count) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11, '[]'::jsonb, 0) \
             RETURNING {EVENT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.event_type)
            .bind(&event.thumbnail)
            .bind(&event.location)
            .bind(event.event_date)
            .bind(&event.creator_id)
            .bind(&event.creator_email)
            .bind(&event.creator_name)
            .bind(&event.creator_photo)
            .bind(event.created_at)
            .fetch_one(&self.pool)
            .await?;

        Event::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        let sql = format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1");

        sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Event::try_from)
            .transpose()
    }

    async fn find_upcoming(
        &self,
        filter: &EventFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE event_date >= $1 \
               AND ($2::text IS NULL OR event_type = $2) \
               AND ($3::text IS NULL OR strpos(lower(title), lower($3)) > 0) \
             ORDER BY event_date ASC"
        );

        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(now)
            .bind(filter.event_type.as_deref())
            .bind(filter.search_text.as_deref())
            .fetch_all(&self.pool)
            .await?;

        into_events(rows)
    }

    async fn find_by_creator(&self, email: &str) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE creator_email = $1 ORDER BY created_at DESC"
        );

        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        into_events(rows)
    }

    async fn find_by_participant(&self, email: &str) -> Result<Vec<Event>, StoreError> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events \
             WHERE participants @> jsonb_build_array(jsonb_build_object('userEmail', $1::text)) \
             ORDER BY event_date ASC"
        );

        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(email)
            .fetch_all(&self.pool)
            .await?;

        into_events(rows)
    }

    async fn append_participant(
        &self,
        id: Uuid,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        // The containment predicate is re-checked against the latest row
        // version after the row lock is acquired, so racing joins by the
        // same email cannot both match.
        let sql = format!(
            "UPDATE events \
             SET participants = participants || jsonb_build_array($2::jsonb), \
                 participant_count = participant_count + 1, \
                 updated_at = $3 \
             WHERE id = $1 \
               AND NOT participants @> \
                   jsonb_build_array(jsonb_build_object('userEmail', $4::text)) \
             RETURNING {EVENT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(Json(&participant))
            .bind(now)
            .bind(&participant.user_email)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(JoinOutcome::Joined(Event::try_from(row)?)),
            None if self.exists(id).await? => Ok(JoinOutcome::AlreadyJoined),
            None => Ok(JoinOutcome::NotFound),
        }
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        creator_email: &str,
        changes: &EventChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let sql = format!(
            "UPDATE events \
             SET title = COALESCE($3, title), \
                 description = COALESCE($4, description), \
                 event_type = COALESCE($5, event_type), \
                 thumbnail = COALESCE($6, thumbnail), \
                 location = COALESCE($7, location), \
                 event_date = COALESCE($8, event_date), \
                 updated_at = $9 \
             WHERE id = $1 AND creator_email = $2 \
             RETURNING {EVENT_COLUMNS}"
        );

        sqlx::query_as::<_, EventRow>(&sql)
            .bind(id)
            .bind(creator_email)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.event_type.as_deref())
            .bind(changes.thumbnail.as_deref())
            .bind(changes.location.as_deref())
            .bind(changes.event_date)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .map(Event::try_from)
            .transpose()
    }
}
