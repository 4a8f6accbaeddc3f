//! Secret resolution seam.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::{ParleyError, Result};

/// Capability to resolve named secrets (bearer credentials and the like).
#[async_trait]
pub trait SecretProvider: Send + Sync {
    async fn get_secret(&self, name: &str) -> Result<String>;
}

/// Environment-backed secrets. Loads `.env` once on construction.
#[derive(Debug, Default)]
pub struct EnvSecretProvider;

impl EnvSecretProvider {
    pub fn new() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        Self
    }
}

#[async_trait]
impl SecretProvider for EnvSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String> {
        std::env::var(name)
            .map_err(|_| ParleyError::Configuration(format!("secret {name} is not set")))
    }
}

/// Fixed in-memory secrets, mainly for tests.
#[derive(Debug, Default)]
pub struct StaticSecretProvider {
    secrets: HashMap<String, String>,
}

impl StaticSecretProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_secret(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.secrets.insert(name.into(), value.into());
        self
    }
}

#[async_trait]
impl SecretProvider for StaticSecretProvider {
    async fn get_secret(&self, name: &str) -> Result<String> {
        self.secrets
            .get(name)
            .cloned()
            .ok_or_else(|| ParleyError::Configuration(format!("secret {name} is not set")))
    }
}
