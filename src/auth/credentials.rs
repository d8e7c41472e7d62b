//! API key pairs and where they come from.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use crate::error::ClientError;

/// Environment variable read by [`EnvCredentials::from_env`] for the public key.
pub const API_KEY_VAR: &str = "EXCHANGE_API_KEY";
/// Environment variable read by [`EnvCredentials::from_env`] for the secret.
pub const API_SECRET_VAR: &str = "EXCHANGE_API_SECRET";

/// A public key and its signing secret.
///
/// The secret stays wrapped in a [`SecretString`] and never shows up in
/// `Debug` output or logs.
#[derive(Clone)]
pub struct Credentials {
    /// Public key, sent as `pKey` on login and `X-API-Key` over REST.
    pub api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// The raw secret, for HMAC keys only.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Source of the key pair used by authenticated sessions and signed REST calls.
pub trait CredentialsProvider: Send + Sync {
    fn get_credentials(&self) -> &Credentials;
}

impl<T: CredentialsProvider + ?Sized> CredentialsProvider for Arc<T> {
    fn get_credentials(&self) -> &Credentials {
        (**self).get_credentials()
    }
}

impl CredentialsProvider for Credentials {
    fn get_credentials(&self) -> &Credentials {
        self
    }
}

/// A key pair fixed at construction.
#[derive(Debug, Clone)]
pub struct StaticCredentials(Credentials);

impl StaticCredentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self(Credentials::new(api_key, api_secret))
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.0
    }
}

/// A key pair read once from the environment.
#[derive(Debug, Clone)]
pub struct EnvCredentials(Credentials);

impl EnvCredentials {
    /// Read `EXCHANGE_API_KEY` and `EXCHANGE_API_SECRET`.
    ///
    /// Fails with [`ClientError::MissingCredentials`] when either is unset or empty.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::try_from_env().ok_or(ClientError::MissingCredentials)
    }

    /// Like [`from_env`](Self::from_env), returning `None` instead of an error.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars(API_KEY_VAR, API_SECRET_VAR)
    }

    /// Read the key pair from custom variable names.
    pub fn try_from_env_vars(key_var: &str, secret_var: &str) -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Some(Self(Credentials::new(read(key_var)?, read(secret_var)?)))
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.0
    }
}
