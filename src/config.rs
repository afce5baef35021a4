use std::env;

use anyhow::Context;
use thiserror::Error;

/// Default listen port when neither the flag nor ENV["PORT"] is given.
pub const DEFAULT_PORT: u16 = 4110;

#[derive(Debug, Error)]
#[error("missing required environment variable {0}")]
pub struct MissingVar(pub &'static str);

/// Object storage access options, read from the environment once at startup.
///
/// All four values are required; resolution fails before any network call
/// when the configuration is incomplete.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
}

impl StorageConfig {
    pub fn from_env() -> Result<Self, MissingVar> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MissingVar> {
        let require = |name: &'static str| lookup(name).ok_or(MissingVar(name));
        Ok(Self {
            region: require("AWS_REGION")?,
            bucket: require("S3_BUCKET_NAME")?,
            access_key: require("AWS_ACCESS_KEY_ID")?,
            secret_key: require("AWS_SECRET_ACCESS_KEY")?,
        })
    }
}

/// HTTP Basic credentials. Enabled only when both variables are present;
/// with either one missing, the server accepts every request.
#[derive(Debug, Clone)]
pub struct BasicAuthConfig {
    pub username: String,
    pub password: String,
}

impl BasicAuthConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        Some(Self {
            username: lookup("BASIC_AUTH_USERNAME")?,
            password: lookup("BASIC_AUTH_PASSWORD")?,
        })
    }
}

/// Read-only server configuration assembled once at startup.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub identity: Option<String>,
    pub debug: bool,
    pub basic_auth: Option<BasicAuthConfig>,
}

/// Listen port: explicit flag wins, then ENV["PORT"], then the default.
pub fn port_from(flag: Option<u16>) -> anyhow::Result<u16> {
    if let Some(port) = flag {
        return Ok(port);
    }
    match env::var("PORT") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("PORT must be a valid port number, got {raw:?}")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}
