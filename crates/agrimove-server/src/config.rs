use std::fmt;
use std::net::SocketAddr;

use agrimove_auth::{TokenManager, DEFAULT_ITERATIONS, DEFAULT_TTL_MINUTES};
use serde::Deserialize;
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub users: Vec<SeedUser>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
}

#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_secret")]
    pub token_secret: Option<String>,

    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: i64,

    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("token_ttl_minutes", &self.token_ttl_minutes)
            .field("pbkdf2_iterations", &self.pbkdf2_iterations)
            .finish()
    }
}

impl AuthConfig {
    /// The HMAC signing secret. Debug builds fall back to a random
    /// per-process secret; release builds refuse to start without one.
    pub fn signing_secret(&self) -> anyhow::Result<Vec<u8>> {
        match self.token_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => Ok(secret.as_bytes().to_vec()),
            _ if cfg!(debug_assertions) => {
                warn!("no token secret configured, using a random one; tokens will not survive a restart");
                Ok(TokenManager::generate_secret()?)
            }
            _ => anyhow::bail!(
                "auth.token_secret or AGRIMOVE_TOKEN_SECRET must be set in release builds"
            ),
        }
    }
}

/// A user created at startup. The password is hashed before it is stored.
#[derive(Clone, Deserialize)]
pub struct SeedUser {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("full_name", &self.full_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

fn default_bind_address() -> SocketAddr {
    std::env::var("AGRIMOVE_BIND_ADDRESS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], 8000)))
}

fn default_token_secret() -> Option<String> {
    std::env::var("AGRIMOVE_TOKEN_SECRET").ok()
}

fn default_token_ttl() -> i64 {
    DEFAULT_TTL_MINUTES
}

fn default_pbkdf2_iterations() -> u32 {
    DEFAULT_ITERATIONS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_secret: default_token_secret(),
            token_ttl_minutes: default_token_ttl(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path =
            std::env::var("AGRIMOVE_CONFIG").unwrap_or_else(|_| "config/default.toml".to_string());

        if std::path::Path::new(&config_path).exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&content)
        } else {
            Ok(Config::default())
        }
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        if config.auth.token_ttl_minutes <= 0 {
            anyhow::bail!("auth.token_ttl_minutes must be positive");
        }
        Ok(config)
    }
}
