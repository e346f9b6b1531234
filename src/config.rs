use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

use crate::utils::get_env_with_prefix;

/// Main configuration for a stallboard deployment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub tenant: TenantConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum request body size in bytes (default: 1MB)
    #[serde(default = "default_max_body_size")]
    pub max_body_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json")]
    pub json: bool,
}

/// The single tenant this deployment serves.
///
/// The tenant identifier was a hardcoded literal in earlier revisions; it is
/// configuration now and must be injected at startup.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TenantConfig {
    /// Document id of the tenant record in the backing store.
    pub id: String,
    /// Display name shown on the domain-management screens.
    #[serde(default = "default_tenant_name")]
    pub name: String,
    /// Domains seeded into the allow-list when the backing store starts empty.
    /// The allow-list must never be observed empty, so at least one entry is
    /// required.
    #[serde(default = "default_initial_domains")]
    pub initial_domains: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Timeout applied to identity-provider and allow-list calls made while
    /// resolving an authorization decision. Expiry fails closed.
    #[serde(default = "default_call_timeout_seconds")]
    pub call_timeout_seconds: u64,
    /// Base URL of the server-side admin-verification endpoint. Left unset in
    /// the default configuration; when set, logins additionally POST the id
    /// token to `{verify_url}/admin/verify`.
    #[serde(default)]
    pub verify_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            tenant: TenantConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_size: default_max_body_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json(),
        }
    }
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            id: "default".to_string(),
            name: default_tenant_name(),
            initial_domains: default_initial_domains(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            call_timeout_seconds: default_call_timeout_seconds(),
            verify_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json() -> bool {
    false
}

fn default_max_body_size() -> usize {
    1024 * 1024
}

fn default_tenant_name() -> String {
    "Campus".to_string()
}

fn default_initial_domains() -> Vec<String> {
    vec!["tint.edu.in".to_string()]
}

fn default_call_timeout_seconds() -> u64 {
    10
}

impl ServerConfig {
    pub fn addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

impl AuthConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }
}

/// Builder for Config with environment variable support
#[must_use = "builder does nothing until you call build()"]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.config.server.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn with_json_logging(mut self, enabled: bool) -> Self {
        self.config.logging.json = enabled;
        self
    }

    pub fn with_tenant(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.config.tenant.id = id.into();
        self.config.tenant.name = name.into();
        self
    }

    pub fn with_initial_domains(mut self, domains: Vec<String>) -> Self {
        self.config.tenant.initial_domains = domains;
        self
    }

    pub fn with_call_timeout(mut self, seconds: u64) -> Self {
        self.config.auth.call_timeout_seconds = seconds;
        self
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.config.auth.verify_url = Some(url.into());
        self
    }

    /// Load configuration from environment variables with STALLBOARD_ prefix
    pub fn from_env(mut self) -> Self {
        if let Some(host) = get_env_with_prefix("HOST") {
            self.config.server.host = host;
        }
        if let Some(port) = get_env_with_prefix("PORT") {
            if let Ok(p) = port.parse() {
                self.config.server.port = p;
            }
        }
        if let Some(max_body_size) = get_env_with_prefix("MAX_BODY_SIZE") {
            if let Ok(size) = max_body_size.parse() {
                self.config.server.max_body_size = size;
            }
        }
        if let Some(level) = get_env_with_prefix("LOG_LEVEL") {
            self.config.logging.level = level;
        }
        if let Some(json) = get_env_with_prefix("LOG_JSON") {
            self.config.logging.json = json.parse().unwrap_or(false);
        }
        if let Some(id) = get_env_with_prefix("TENANT_ID") {
            self.config.tenant.id = id;
        }
        if let Some(name) = get_env_with_prefix("TENANT_NAME") {
            self.config.tenant.name = name;
        }
        if let Some(domains) = get_env_with_prefix("ALLOWED_DOMAINS") {
            let parsed: Vec<String> = domains
                .split(',')
                .map(|d| d.trim().to_lowercase())
                .filter(|d| !d.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.config.tenant.initial_domains = parsed;
            }
        }
        if let Some(timeout) = get_env_with_prefix("AUTH_CALL_TIMEOUT") {
            if let Ok(secs) = timeout.parse() {
                self.config.auth.call_timeout_seconds = secs;
            }
        }
        if let Some(url) = get_env_with_prefix("API_BASE_URL") {
            self.config.auth.verify_url = Some(url);
        }

        self
    }

    /// Build the configuration, validating all settings
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration is invalid:
    /// - Invalid server address (host:port)
    /// - Invalid log level
    /// - Empty tenant id
    /// - Empty initial allow-list
    /// - Zero auth call timeout
    pub fn build(self) -> crate::error::Result<Config> {
        self.config.server.addr().map_err(|e| {
            crate::error::StallboardError::bad_request(format!(
                "Invalid server address {}:{} - {}",
                self.config.server.host, self.config.server.port, e
            ))
        })?;

        if self.config.server.port == 0 {
            return Err(crate::error::StallboardError::bad_request(
                "Server port must be greater than 0",
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&self.config.logging.level.to_lowercase().as_str()) {
            return Err(crate::error::StallboardError::bad_request(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.config.logging.level,
                valid_log_levels.join(", ")
            )));
        }

        if self.config.tenant.id.trim().is_empty() {
            return Err(crate::error::StallboardError::bad_request(
                "Tenant id must not be empty",
            ));
        }

        if self.config.tenant.initial_domains.is_empty() {
            return Err(crate::error::StallboardError::bad_request(
                "At least one allowed domain must be configured",
            ));
        }

        if self.config.auth.call_timeout_seconds == 0 {
            return Err(crate::error::StallboardError::bad_request(
                "Auth call timeout must be greater than 0",
            ));
        }

        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_build() {
        let config = ConfigBuilder::new().build().unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.tenant.initial_domains, vec!["tint.edu.in"]);
        assert!(config.auth.verify_url.is_none());
    }

    #[test]
    fn test_rejects_empty_tenant_id() {
        let err = ConfigBuilder::new().with_tenant("", "X").build();
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_empty_initial_domains() {
        let err = ConfigBuilder::new().with_initial_domains(vec![]).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let err = ConfigBuilder::new().with_call_timeout(0).build();
        assert!(err.is_err());
    }

    #[test]
    fn test_rejects_bad_log_level() {
        let err = ConfigBuilder::new().with_log_level("verbose").build();
        assert!(err.is_err());
    }
}
