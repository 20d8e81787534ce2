//! Configuration types and builders.

use crate::error::{ConfigError, McpError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// Default Marvel API base URL.
pub const DEFAULT_API_BASE: &str = "https://gateway.marvel.com/v1/public";

/// Marvel catalog API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarvelConfig {
    pub api_base: String,
    pub public_key: String,
    #[serde(skip_serializing)]
    pub private_key: String,
    pub request_timeout: Duration,
    pub cache_ttl: Duration,
}

impl Default for MarvelConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            public_key: String::new(),
            private_key: String::new(),
            request_timeout: Duration::from_secs(30),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

/// Builder for MarvelConfig with fluent API.
#[derive(Default)]
pub struct MarvelConfigBuilder {
    config: MarvelConfig,
}

impl MarvelConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.config.api_base = api_base.into();
        self
    }

    pub fn public_key(mut self, key: impl Into<String>) -> Self {
        self.config.public_key = key.into();
        self
    }

    pub fn private_key(mut self, key: impl Into<String>) -> Self {
        self.config.private_key = key.into();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache_ttl = ttl;
        self
    }

    /// Build from environment variables.
    ///
    /// `MARVEL_PUBLIC_KEY` and `MARVEL_PRIVATE_KEY` are required;
    /// `MARVEL_API_BASE` overrides the default gateway URL.
    pub fn from_env(mut self) -> Result<Self> {
        self.config.public_key = env::var("MARVEL_PUBLIC_KEY")
            .map_err(|_| ConfigError::EnvNotFound("MARVEL_PUBLIC_KEY".into()))?;
        self.config.private_key = env::var("MARVEL_PRIVATE_KEY")
            .map_err(|_| ConfigError::EnvNotFound("MARVEL_PRIVATE_KEY".into()))?;

        if let Ok(base) = env::var("MARVEL_API_BASE") {
            self.config.api_base = base;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<MarvelConfig> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<()> {
        if self.config.public_key.is_empty() {
            return Err(ConfigError::MissingField("public_key".into()).into());
        }
        if self.config.private_key.is_empty() {
            return Err(ConfigError::MissingField("private_key".into()).into());
        }
        if self.config.api_base.is_empty() {
            return Err(ConfigError::MissingField("api_base".into()).into());
        }
        if !self.config.api_base.starts_with("http") {
            return Err(McpError::Config(ConfigError::InvalidValue {
                field: "api_base".into(),
                message: format!("Not an HTTP URL: {}", self.config.api_base).into(),
            }));
        }
        Ok(())
    }
}

/// Streamable HTTP transport configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub bind: SocketAddr,
    /// Sessions with no activity for this long are torn down.
    pub idle_timeout: Duration,
    /// How often the idle sweeper runs.
    pub sweep_interval: Duration,
    /// Buffered messages per push stream before notify backpressure.
    pub push_channel_capacity: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            idle_timeout: Duration::from_secs(300),
            sweep_interval: Duration::from_secs(60),
            push_channel_capacity: 64,
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub marvel: MarvelConfig,
    pub http: HttpConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: "marvel-mcp".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            marvel: MarvelConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig.
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn marvel(mut self, marvel: MarvelConfig) -> Self {
        self.config.marvel = marvel;
        self
    }

    pub fn http(mut self, http: HttpConfig) -> Self {
        self.config.http = http;
        self
    }

    pub fn build(self) -> ServerConfig {
        self.config
    }
}
