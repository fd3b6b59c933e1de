use std::sync::Arc;

use crate::auth::IdentityVerifier;
use crate::repository::EventRepository;

#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<EventRepository>,
    pub verifier: Arc<dyn IdentityVerifier>,
}

impl AppState {
    pub fn new(repository: EventRepository, verifier: Arc<dyn IdentityVerifier>) -> Self {
        Self {
            repository: Arc::new(repository),
            verifier,
        }
    }
}
