use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    parse_event_date, CreateEventInput, Event, EventChanges, EventFilter, EventPatch, Identity,
    NewEvent, Participant,
};
use crate::store::{EventStore, JoinOutcome, StoreError};

pub const ALL_FIELDS_REQUIRED: &str = "All fields are required";

#[derive(Debug, Error)]
pub enum EventError {
    #[error("{0}")]
    Validation(String),

    #[error("event not found")]
    NotFound,

    #[error("caller is not the event creator")]
    Forbidden,

    #[error("caller already joined the event")]
    AlreadyJoined,

    #[error("no changes to apply")]
    NoChanges,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Rules applied to event dates on create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventPolicy {
    /// Reject event dates that are not strictly after the current time.
    pub require_future_event_date: bool,
}

impl Default for EventPolicy {
    fn default() -> Self {
        Self {
            require_future_event_date: true,
        }
    }
}

/// Domain operations over the `events` collection.
pub struct EventRepository {
    store: Arc<dyn EventStore>,
    policy: EventPolicy,
}

impl EventRepository {
    pub fn new(store: Arc<dyn EventStore>, policy: EventPolicy) -> Self {
        Self { store, policy }
    }

    pub async fn list_upcoming(&self, filter: EventFilter) -> Result<Vec<Event>, EventError> {
        let filter = filter.normalized();
        Ok(self.store.find_upcoming(&filter, Utc::now()).await?)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Event, EventError> {
        let id = parse_id(id)?;
        self.store
            .find_by_id(id)
            .await?
            .ok_or(EventError::NotFound)
    }

    pub async fn create(
        &self,
        input: CreateEventInput,
        identity: &Identity,
    ) -> Result<Event, EventError> {
        let title = required(input.title)?;
        let description = required(input.description)?;
        let event_type = required(input.event_type)?;
        let thumbnail = required(input.thumbnail)?;
        let location = required(input.location)?;
        let event_date = required(input.event_date)?;

        let now = Utc::now();
        let event_date = self.check_event_date(&event_date, now)?;

        let event = self
            .store
            .insert(NewEvent {
                title,
                description,
                event_type,
                thumbnail,
                location,
                event_date,
                creator_id: identity.uid.clone(),
                creator_email: identity.email.clone(),
                creator_name: identity.name.clone(),
                creator_photo: identity.picture.clone().unwrap_or_default(),
                created_at: now,
            })
            .await?;

        info!(event_id = %event.id, creator = %event.creator_email, "Event created");
        Ok(event)
    }

    pub async fn join(&self, id: &str, identity: &Identity) -> Result<Event, EventError> {
        let id = parse_id(id)?;
        let now = Utc::now();
        let participant = Participant::from_identity(identity, now);

        match self.store.append_participant(id, participant, now).await? {
            JoinOutcome::Joined(event) => {
                info!(
                    event_id = %event.id,
                    user = %identity.email,
                    participant_count = event.participant_count,
                    "Participant joined event"
                );
                Ok(event)
            }
            JoinOutcome::AlreadyJoined => Err(EventError::AlreadyJoined),
            JoinOutcome::NotFound => Err(EventError::NotFound),
        }
    }

    pub async fn list_created_by(&self, email: &str) -> Result<Vec<Event>, EventError> {
        Ok(self.store.find_by_creator(email).await?)
    }

    pub async fn list_joined_by(&self, email: &str) -> Result<Vec<Event>, EventError> {
        Ok(self.store.find_by_participant(email).await?)
    }

    pub async fn update(
        &self,
        id: &str,
        patch: EventPatch,
        identity: &Identity,
    ) -> Result<Event, EventError> {
        let id = parse_id(id)?;
        let existing = self
            .store
            .find_by_id(id)
            .await?
            .ok_or(EventError::NotFound)?;

        if existing.creator_email != identity.email {
            return Err(EventError::Forbidden);
        }
        if patch.is_empty() {
            return Err(EventError::NoChanges);
        }

        let now = Utc::now();
        let changes = EventChanges {
            title: patched("title", patch.title)?,
            description: patched("description", patch.description)?,
            event_type: patched("eventType", patch.event_type)?,
            thumbnail: patched("thumbnail", patch.thumbnail)?,
            location: patched("location", patch.location)?,
            event_date: patched("eventDate", patch.event_date)?
                .map(|raw| self.check_event_date(&raw, now))
                .transpose()?,
        };

        let updated = self
            .store
            .apply_changes(id, &identity.email, &changes, now)
            .await?
            .ok_or(EventError::NoChanges)?;

        info!(event_id = %updated.id, "Event updated");
        Ok(updated)
    }

    fn check_event_date(&self, raw: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, EventError> {
        let event_date = parse_event_date(raw)
            .ok_or_else(|| EventError::Validation("Invalid event date".to_string()))?;

        if self.policy.require_future_event_date && event_date <= now {
            return Err(EventError::Validation(
                "Event date must be in the future".to_string(),
            ));
        }
        Ok(event_date)
    }
}

/// Malformed ids cannot name a stored event.
fn parse_id(id: &str) -> Result<Uuid, EventError> {
    Uuid::parse_str(id.trim()).map_err(|_| EventError::NotFound)
}

fn required(value: Option<String>) -> Result<String, EventError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EventError::Validation(ALL_FIELDS_REQUIRED.to_string()))
}

fn patched(field: &str, value: Option<String>) -> Result<Option<String>, EventError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if v.is_empty() => Err(EventError::Validation(format!(
            "{field} cannot be empty"
        ))),
        other => Ok(other),
    }
}
