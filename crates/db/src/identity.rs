//! Session identity for collection access.
//!
//! Collections may only be read or written after the client holds a session
//! identity. Only its presence matters; nothing else inspects it.

use async_trait::async_trait;
use caseta_core::config::CasetaConfig;
use caseta_core::errors::{CasetaError, CasetaResult};
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub uid: String,
    pub anonymous: bool,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self) -> CasetaResult<SessionIdentity>;
}

/// Signs in without credentials, under a fresh random uid.
#[derive(Debug, Default)]
pub struct AnonymousSignIn;

#[async_trait]
impl IdentityProvider for AnonymousSignIn {
    async fn sign_in(&self) -> CasetaResult<SessionIdentity> {
        let identity = SessionIdentity {
            uid: Uuid::new_v4().to_string(),
            anonymous: true,
        };
        info!("Signed in anonymously as {}", identity.uid);
        Ok(identity)
    }
}

/// Signs in with a custom token issued outside this system.
#[derive(Debug)]
pub struct TokenSignIn {
    token: String,
}

impl TokenSignIn {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for TokenSignIn {
    async fn sign_in(&self) -> CasetaResult<SessionIdentity> {
        let token = self.token.trim();
        if token.is_empty() {
            return Err(CasetaError::AuthFailure(
                "Custom sign-in token is empty".to_string(),
            ));
        }
        info!("Signed in with custom token");
        Ok(SessionIdentity {
            uid: token.to_string(),
            anonymous: false,
        })
    }
}

/// Token sign-in when the configuration carries a token, anonymous otherwise.
pub fn identity_provider_for(config: &CasetaConfig) -> Box<dyn IdentityProvider> {
    match &config.auth_token {
        Some(token) => Box::new(TokenSignIn::new(token.clone())),
        None => Box::new(AnonymousSignIn),
    }
}
