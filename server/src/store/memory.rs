use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{EventStore, JoinOutcome, StoreError};
use crate::models::{Event, EventChanges, EventFilter, NewEvent, Participant};

/// Process-local event store. All writes take the write lock, so the
/// duplicate check and the append in `append_participant` cannot interleave
/// with another writer.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<HashMap<Uuid, Event>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an event as-is, bypassing validation. Used to seed fixtures.
    pub async fn put(&self, event: Event) {
        self.events.write().await.insert(event.id, event);
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn insert(&self, event: NewEvent) -> Result<Event, StoreError> {
        let stored = Event {
            id: Uuid::new_v4(),
            title: event.title,
            description: event.description,
            event_type: event.event_type,
            thumbnail: event.thumbnail,
            location: event.location,
            event_date: event.event_date,
            creator_id: event.creator_id,
            creator_email: event.creator_email,
            creator_name: event.creator_name,
            creator_photo: event.creator_photo,
            created_at: event.created_at,
            updated_at: event.created_at,
            participants: Vec::new(),
            participant_count: 0,
        };

        self.events.write().await.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>, StoreError> {
        Ok(self.events.read().await.get(&id).cloned())
    }

    async fn find_upcoming(
        &self,
        filter: &EventFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        let mut upcoming: Vec<Event> = events
            .values()
            .filter(|e| e.event_date >= now && filter.matches(e))
            .cloned()
            .collect();
        upcoming.sort_by_key(|e| e.event_date);
        Ok(upcoming)
    }

    async fn find_by_creator(&self, email: &str) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        let mut created: Vec<Event> = events
            .values()
            .filter(|e| e.creator_email == email)
            .cloned()
            .collect();
        created.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(created)
    }

    async fn find_by_participant(&self, email: &str) -> Result<Vec<Event>, StoreError> {
        let events = self.events.read().await;
        let mut joined: Vec<Event> = events
            .values()
            .filter(|e| e.has_participant(email))
            .cloned()
            .collect();
        joined.sort_by_key(|e| e.event_date);
        Ok(joined)
    }

    async fn append_participant(
        &self,
        id: Uuid,
        participant: Participant,
        now: DateTime<Utc>,
    ) -> Result<JoinOutcome, StoreError> {
        let mut events = self.events.write().await;
        let Some(event) = events.get_mut(&id) else {
            return Ok(JoinOutcome::NotFound);
        };

        if event.has_participant(&participant.user_email) {
            return Ok(JoinOutcome::AlreadyJoined);
        }

        event.participants.push(participant);
        event.participant_count += 1;
        event.updated_at = now;
        Ok(JoinOutcome::Joined(event.clone()))
    }

    async fn apply_changes(
        &self,
        id: Uuid,
        creator_email: &str,
        changes: &EventChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Event>, StoreError> {
        let mut events = self.events.write().await;
        match events.get_mut(&id) {
            Some(event) if event.creator_email == creator_email => {
                changes.apply_to(event);
                event.updated_at = now;
                Ok(Some(event.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn new_event(title: &str, creator: &str, offset_days: i64) -> NewEvent {
        let now = Utc::now();
        NewEvent {
            title: title.to_string(),
            description: "desc".to_string(),
            event_type: "meetup".to_string(),
            thumbnail: "thumb.png".to_string(),
            location: "Park".to_string(),
            event_date: now + Duration::days(offset_days),
            creator_id: format!("uid-{creator}"),
            creator_email: creator.to_string(),
            creator_name: creator.to_string(),
            creator_photo: String::new(),
            created_at: now,
        }
    }

    fn participant(email: &str) -> Participant {
        Participant {
            user_id: format!("uid-{email}"),
            user_email: email.to_string(),
            user_name: email.to_string(),
            user_photo: String::new(),
            joined_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_append_participant_rejects_duplicate_email() {
        let store = InMemoryEventStore::new();
        let event = store.insert(new_event("Run", "host@x.io", 3)).await.unwrap();

        let first = store
            .append_participant(event.id, participant("a@x.io"), Utc::now())
            .await
            .unwrap();
        assert!(matches!(first, JoinOutcome::Joined(ref e) if e.participant_count == 1));

        let second = store
            .append_participant(event.id, participant("a@x.io"), Utc::now())
            .await
            .unwrap();
        assert_eq!(second, JoinOutcome::AlreadyJoined);

        let missing = store
            .append_participant(Uuid::new_v4(), participant("a@x.io"), Utc::now())
            .await
            .unwrap();
        assert_eq!(missing, JoinOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_concurrent_joins_land_once() {
        let store = Arc::new(InMemoryEventStore::new());
        let event = store.insert(new_event("Run", "host@x.io", 3)).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store
                    .append_participant(event.id, participant("a@x.io"), Utc::now())
                    .await
                    .unwrap()
            }));
        }

        let mut joined = 0;
        for handle in handles {
            if let JoinOutcome::Joined(_) = handle.await.unwrap() {
                joined += 1;
            }
        }
        assert_eq!(joined, 1);

        let stored = store.find_by_id(event.id).await.unwrap().unwrap();
        assert_eq!(stored.participants.len(), 1);
        assert_eq!(stored.participant_count, 1);
    }

    #[tokio::test]
    async fn test_query_ordering() {
        let store = InMemoryEventStore::new();
        let later = store.insert(new_event("Later", "host@x.io", 10)).await.unwrap();
        let sooner = store.insert(new_event("Sooner", "host@x.io", 2)).await.unwrap();
        let past = store.insert(new_event("Past", "host@x.io", -2)).await.unwrap();

        let upcoming = store
            .find_upcoming(&EventFilter::default(), Utc::now())
            .await
            .unwrap();
        let ids: Vec<Uuid> = upcoming.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![sooner.id, later.id]);

        let created = store.find_by_creator("host@x.io").await.unwrap();
        assert_eq!(created.len(), 3);
        assert!(created.windows(2).all(|w| w[0].created_at >= w[1].created_at));

        for id in [later.id, past.id] {
            store
                .append_participant(id, participant("a@x.io"), Utc::now())
                .await
                .unwrap();
        }
        let joined = store.find_by_participant("a@x.io").await.unwrap();
        let ids: Vec<Uuid> = joined.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![past.id, later.id]);
    }

    #[tokio::test]
    async fn test_apply_changes_requires_creator() {
        let store = InMemoryEventStore::new();
        let event = store.insert(new_event("Run", "host@x.io", 3)).await.unwrap();
        let changes = EventChanges {
            title: Some("Walk".to_string()),
            ..EventChanges::default()
        };

        let denied = store
            .apply_changes(event.id, "other@x.io", &changes, Utc::now())
            .await
            .unwrap();
        assert!(denied.is_none());

        let updated = store
            .apply_changes(event.id, "host@x.io", &changes, Utc::now())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.title, "Walk");
        assert!(updated.updated_at >= event.updated_at);
    }
}
