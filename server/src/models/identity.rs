use serde::{Deserialize, Serialize};

/// Caller identity as resolved by an [`IdentityVerifier`](crate::auth::IdentityVerifier).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}
