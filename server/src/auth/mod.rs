//! Identity resolution for protected routes.
//!
//! Handlers never see credentials: the [`AuthUser`] extractor pulls the bearer
//! credential from the request and hands it to the configured
//! [`IdentityVerifier`], which resolves it to an [`Identity`].

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::Identity;

pub mod extractor;

pub use extractor::AuthUser;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    /// The verifier could not reach its identity provider. Remote verifiers
    /// (token introspection, signing-key fetches) return this; the local
    /// development and token-table verifiers never do.
    #[error("identity provider failure: {0}")]
    Provider(String),
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError>;
}

/// Development verifier: any non-empty credential resolves to the same
/// configured identity. Not for production use.
#[derive(Debug, Clone)]
pub struct DevIdentityVerifier {
    identity: Identity,
}

impl DevIdentityVerifier {
    pub fn new(identity: Identity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl IdentityVerifier for DevIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        if credential.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        Ok(self.identity.clone())
    }
}

/// Verifier backed by a fixed credential-to-identity table.
#[derive(Debug, Clone, Default)]
pub struct TokenTableVerifier {
    tokens: HashMap<String, Identity>,
}

impl TokenTableVerifier {
    pub fn new(tokens: HashMap<String, Identity>) -> Self {
        Self { tokens }
    }

    /// Parses a JSON object of the form `{"<token>": {"uid", "email", "name", "picture"}}`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn with_token(mut self, credential: impl Into<String>, identity: Identity) -> Self {
        self.tokens.insert(credential.into(), identity);
        self
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[async_trait]
impl IdentityVerifier for TokenTableVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, AuthError> {
        self.tokens
            .get(credential)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}
