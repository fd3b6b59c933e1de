use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::identity::Identity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub creator_id: String,
    pub creator_email: String,
    pub creator_name: String,
    pub creator_photo: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
    pub participant_count: i32,
}

impl Event {
    pub fn has_participant(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p.user_email == email)
    }
}

/// Snapshot of a user's identity taken when they joined an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user_id: String,
    pub user_email: String,
    pub user_name: String,
    pub user_photo: String,
    pub joined_at: DateTime<Utc>,
}

impl Participant {
    pub fn from_identity(identity: &Identity, joined_at: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.uid.clone(),
            user_email: identity.email.clone(),
            user_name: identity.name.clone(),
            user_photo: identity.picture.clone().unwrap_or_default(),
            joined_at,
        }
    }
}

/// Fully validated event ready to be inserted. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub thumbnail: String,
    pub location: String,
    pub event_date: DateTime<Utc>,
    pub creator_id: String,
    pub creator_email: String,
    pub creator_name: String,
    pub creator_photo: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for event creation. Every field is optional at the wire
/// level so that missing fields surface as validation errors.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
}

/// The patchable subset of an event.
///
/// This is an allow-list: any key not named here (`_id`, `creatorEmail`,
/// `participants`, ...) is dropped during deserialization and can never reach
/// the store.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<String>,
}

impl EventPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.event_type.is_none()
            && self.thumbnail.is_none()
            && self.location.is_none()
            && self.event_date.is_none()
    }
}

/// Validated field changes handed to the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    pub thumbnail: Option<String>,
    pub location: Option<String>,
    pub event_date: Option<DateTime<Utc>>,
}

impl EventChanges {
    pub fn apply_to(&self, event: &mut Event) {
        if let Some(title) = &self.title {
            event.title = title.clone();
        }
        if let Some(description) = &self.description {
            event.description = description.clone();
        }
        if let Some(event_type) = &self.event_type {
            event.event_type = event_type.clone();
        }
        if let Some(thumbnail) = &self.thumbnail {
            event.thumbnail = thumbnail.clone();
        }
        if let Some(location) = &self.location {
            event.location = location.clone();
        }
        if let Some(event_date) = self.event_date {
            event.event_date = event_date;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventFilter {
    pub event_type: Option<String>,
    #[serde(rename = "search")]
    pub search_text: Option<String>,
}

impl EventFilter {
    /// Drops blank values so that `?search=` behaves like no filter.
    pub fn normalized(self) -> Self {
        fn clean(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }

        Self {
            event_type: clean(self.event_type),
            search_text: clean(self.search_text),
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        if let Some(event_type) = &self.event_type {
            if &event.event_type != event_type {
                return false;
            }
        }
        if let Some(search) = &self.search_text {
            if !event
                .title
                .to_lowercase()
                .contains(&search.to_lowercase())
            {
                return false;
            }
        }
        true
    }
}

/// Parses an event date as sent by clients.
///
/// Accepts RFC 3339, a `datetime-local` style value without offset (taken as
/// UTC), or a bare calendar date (midnight UTC).
pub fn parse_event_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(date) = DateTime::parse_from_rfc3339(raw) {
        return Some(date.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
