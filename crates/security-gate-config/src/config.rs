// crates/security-gate-config/src/config.rs
// ============================================================================
// Module: Security Gate Configuration
// Description: Configuration loading and validation for the security gate.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Missing or invalid configuration fails closed: the server refuses to start
//! without at least one bearer token, and object-store endpoints must opt in
//! to plaintext HTTP explicitly.
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
pub const DEFAULT_CONFIG_NAME: &str = "security-gate.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "SECURITY_GATE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum number of server auth tokens.
pub(crate) const MAX_AUTH_TOKENS: usize = 64;
/// Maximum length of a server auth token.
pub(crate) const MAX_AUTH_TOKEN_LENGTH: usize = 256;
/// Default HTTP bind address.
pub const DEFAULT_BIND: &str = "127.0.0.1:8000";
/// Default maximum request body size in bytes.
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
/// Maximum allowed request body size in bytes.
pub(crate) const MAX_MAX_BODY_BYTES: usize = 1024 * 1024 * 1024;
/// Default audit log path.
pub const DEFAULT_AUDIT_PATH: &str = "data/audit.log";
/// Default per-fetch timeout in milliseconds.
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000;
/// Minimum per-fetch timeout in milliseconds.
pub(crate) const MIN_FETCH_TIMEOUT_MS: u64 = 100;
/// Maximum per-fetch timeout in milliseconds.
pub(crate) const MAX_FETCH_TIMEOUT_MS: u64 = 60_000;
/// Default maximum fetched object size in bytes.
pub const DEFAULT_MAX_OBJECT_BYTES: usize = 256 * 1024 * 1024;
/// Maximum allowed fetched object size in bytes.
pub(crate) const MAX_MAX_OBJECT_BYTES: usize = 1024 * 1024 * 1024;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Security gate configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecurityGateConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Audit log configuration.
    #[serde(default)]
    pub audit: AuditConfig,
    /// Object-store configuration for reference-mode fetches.
    #[serde(default)]
    pub object_store: ObjectStoreConfig,
}

impl SecurityGateConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.audit.validate()?;
        self.object_store.validate()
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the server binds.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Bearer authentication configuration.
    #[serde(default)]
    pub auth: ServerAuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
            auth: ServerAuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the bind address is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid bind address: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be greater than zero".to_string(),
            ));
        }
        if self.max_body_bytes > MAX_MAX_BODY_BYTES {
            return Err(ConfigError::Invalid(format!(
                "max_body_bytes must be at most {MAX_MAX_BODY_BYTES}"
            )));
        }
        self.auth.validate()
    }
}

/// Bearer authentication configuration for the HTTP surface.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServerAuthConfig {
    /// Accepted bearer tokens.
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

impl ServerAuthConfig {
    /// Validates auth configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bearer_tokens.is_empty() {
            return Err(ConfigError::Invalid(
                "server.auth.bearer_tokens must contain at least one token".to_string(),
            ));
        }
        if self.bearer_tokens.len() > MAX_AUTH_TOKENS {
            return Err(ConfigError::Invalid("too many auth tokens".to_string()));
        }
        for token in &self.bearer_tokens {
            if token.trim().is_empty() {
                return Err(ConfigError::Invalid("auth token must be non-empty".to_string()));
            }
            if token.len() > MAX_AUTH_TOKEN_LENGTH {
                return Err(ConfigError::Invalid("auth token too long".to_string()));
            }
            if token.trim() != token {
                return Err(ConfigError::Invalid(
                    "auth token must not contain whitespace".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Audit log configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AuditConfig {
    /// Path of the JSON-lines audit log.
    #[serde(default = "default_audit_path")]
    pub path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            path: default_audit_path(),
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("audit.path", &self.path)
    }
}

/// Supported object-store providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStoreProvider {
    /// Amazon S3 compatible object storage.
    #[default]
    S3,
}

/// Object-store configuration for artifact fetches.
#[derive(Debug, Clone, Deserialize)]
pub struct ObjectStoreConfig {
    /// Provider selection for the object store.
    #[serde(default)]
    pub provider: ObjectStoreProvider,
    /// Optional region (defaults to environment).
    #[serde(default)]
    pub region: Option<String>,
    /// Optional object-store endpoint (S3-compatible).
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Force path-style addressing (S3-compatible).
    #[serde(default)]
    pub force_path_style: bool,
    /// Allow non-TLS endpoints (explicit opt-in).
    #[serde(default)]
    pub allow_http: bool,
    /// Per-fetch timeout in milliseconds.
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    /// Maximum fetched object size in bytes.
    #[serde(default = "default_max_object_bytes")]
    pub max_object_bytes: usize,
}

impl Default for ObjectStoreConfig {
    fn default() -> Self {
        Self {
            provider: ObjectStoreProvider::S3,
            region: None,
            endpoint: None,
            force_path_style: false,
            allow_http: false,
            fetch_timeout_ms: default_fetch_timeout_ms(),
            max_object_bytes: default_max_object_bytes(),
        }
    }
}

impl ObjectStoreConfig {
    /// Validates object-store configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when object-store settings are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(region) = &self.region
            && region.trim().is_empty()
        {
            return Err(ConfigError::Invalid(
                "object_store.region must be non-empty when set".to_string(),
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            let trimmed = endpoint.trim();
            if !(trimmed.starts_with("https://") || trimmed.starts_with("http://")) {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint must include http:// or https://".to_string(),
                ));
            }
            if trimmed.starts_with("http://") && !self.allow_http {
                return Err(ConfigError::Invalid(
                    "object_store.endpoint uses http:// without allow_http".to_string(),
                ));
            }
        }
        validate_timeout_range(
            "object_store.fetch_timeout_ms",
            self.fetch_timeout_ms,
            MIN_FETCH_TIMEOUT_MS,
            MAX_FETCH_TIMEOUT_MS,
        )?;
        if self.max_object_bytes == 0 || self.max_object_bytes > MAX_MAX_OBJECT_BYTES {
            return Err(ConfigError::Invalid(format!(
                "object_store.max_object_bytes must be between 1 and {MAX_MAX_OBJECT_BYTES}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O errors while reading config.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing errors.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a timeout value against bounds.
fn validate_timeout_range(
    field: &str,
    value_ms: u64,
    min_ms: u64,
    max_ms: u64,
) -> Result<(), ConfigError> {
    if value_ms < min_ms || value_ms > max_ms {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between {min_ms} and {max_ms} milliseconds",
        )));
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
const fn default_max_body_bytes() -> usize {
    DEFAULT_MAX_BODY_BYTES
}

/// Default audit log path.
fn default_audit_path() -> String {
    DEFAULT_AUDIT_PATH.to_string()
}

/// Default per-fetch timeout.
const fn default_fetch_timeout_ms() -> u64 {
    DEFAULT_FETCH_TIMEOUT_MS
}

/// Default maximum fetched object size.
const fn default_max_object_bytes() -> usize {
    DEFAULT_MAX_OBJECT_BYTES
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test fixtures use explicit asserts and unwraps for clarity."
    )]

    use super::*;

    fn assert_invalid(result: Result<(), ConfigError>, needle: &str) {
        match result {
            Err(ConfigError::Invalid(message)) => {
                assert!(message.contains(needle), "unexpected message: {message}");
            }
            other => panic!("expected invalid config containing {needle}, got {other:?}"),
        }
    }

    fn auth(tokens: &[&str]) -> ServerAuthConfig {
        ServerAuthConfig {
            bearer_tokens: tokens.iter().map(|token| (*token).to_string()).collect(),
        }
    }

    // ============================================================================
    // SECTION: ServerAuthConfig::validate() Tests
    // ============================================================================

    #[test]
    fn auth_config_rejects_empty_token_list() {
        assert_invalid(auth(&[]).validate(), "at least one token");
    }

    #[test]
    fn auth_config_accepts_single_token() {
        assert!(auth(&["token-a"]).validate().is_ok());
    }

    #[test]
    fn auth_config_rejects_blank_token() {
        assert_invalid(auth(&["   "]).validate(), "must be non-empty");
    }

    #[test]
    fn auth_config_rejects_padded_token() {
        assert_invalid(auth(&[" token "]).validate(), "must not contain whitespace");
    }

    #[test]
    fn auth_config_rejects_long_token() {
        let long = "a".repeat(MAX_AUTH_TOKEN_LENGTH + 1);
        assert_invalid(auth(&[long.as_str()]).validate(), "too long");
    }

    #[test]
    fn auth_config_accepts_token_at_max_length() {
        let max = "a".repeat(MAX_AUTH_TOKEN_LENGTH);
        assert!(auth(&[max.as_str()]).validate().is_ok());
    }

    #[test]
    fn auth_config_rejects_too_many_tokens() {
        let tokens: Vec<String> = (0 ..= MAX_AUTH_TOKENS).map(|idx| format!("t{idx}")).collect();
        let config = ServerAuthConfig {
            bearer_tokens: tokens,
        };
        assert_invalid(config.validate(), "too many auth tokens");
    }

    // ============================================================================
    // SECTION: ServerConfig::validate() Tests
    // ============================================================================

    #[test]
    fn server_config_rejects_unparseable_bind() {
        let config = ServerConfig {
            bind: "localhost".to_string(),
            auth: auth(&["token"]),
            ..ServerConfig::default()
        };
        assert_invalid(config.validate(), "invalid bind address");
    }

    #[test]
    fn server_config_rejects_zero_body_limit() {
        let config = ServerConfig {
            max_body_bytes: 0,
            auth: auth(&["token"]),
            ..ServerConfig::default()
        };
        assert_invalid(config.validate(), "greater than zero");
    }

    #[test]
    fn server_config_rejects_oversized_body_limit() {
        let config = ServerConfig {
            max_body_bytes: MAX_MAX_BODY_BYTES + 1,
            auth: auth(&["token"]),
            ..ServerConfig::default()
        };
        assert_invalid(config.validate(), "max_body_bytes must be at most");
    }

    #[test]
    fn server_config_default_bind_parses() {
        let addr = ServerConfig::default().bind_addr().unwrap();
        assert_eq!(addr.port(), 8000);
        assert!(addr.ip().is_loopback());
    }

    // ============================================================================
    // SECTION: ObjectStoreConfig::validate() Tests
    // ============================================================================

    #[test]
    fn object_store_default_is_valid() {
        assert!(ObjectStoreConfig::default().validate().is_ok());
    }

    #[test]
    fn object_store_rejects_endpoint_without_scheme() {
        let config = ObjectStoreConfig {
            endpoint: Some("minio.local:9000".to_string()),
            ..ObjectStoreConfig::default()
        };
        assert_invalid(config.validate(), "must include http:// or https://");
    }

    #[test]
    fn object_store_rejects_http_without_opt_in() {
        let config = ObjectStoreConfig {
            endpoint: Some("http://minio.local:9000".to_string()),
            ..ObjectStoreConfig::default()
        };
        assert_invalid(config.validate(), "without allow_http");
    }

    #[test]
    fn object_store_accepts_http_with_opt_in() {
        let config = ObjectStoreConfig {
            endpoint: Some("http://minio.local:9000".to_string()),
            allow_http: true,
            ..ObjectStoreConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn object_store_rejects_blank_region() {
        let config = ObjectStoreConfig {
            region: Some(" ".to_string()),
            ..ObjectStoreConfig::default()
        };
        assert_invalid(config.validate(), "object_store.region");
    }

    #[test]
    fn object_store_rejects_zero_object_limit() {
        let config = ObjectStoreConfig {
            max_object_bytes: 0,
            ..ObjectStoreConfig::default()
        };
        assert_invalid(config.validate(), "max_object_bytes");
    }

    // ============================================================================
    // SECTION: validate_timeout_range() Tests
    // ============================================================================

    #[test]
    fn validate_timeout_range_accepts_bounds() {
        let min = validate_timeout_range(
            "fetch",
            MIN_FETCH_TIMEOUT_MS,
            MIN_FETCH_TIMEOUT_MS,
            MAX_FETCH_TIMEOUT_MS,
        );
        let max = validate_timeout_range(
            "fetch",
            MAX_FETCH_TIMEOUT_MS,
            MIN_FETCH_TIMEOUT_MS,
            MAX_FETCH_TIMEOUT_MS,
        );
        assert!(min.is_ok(), "minimum value should pass");
        assert!(max.is_ok(), "maximum value should pass");
    }

    #[test]
    fn validate_timeout_range_rejects_out_of_bounds() {
        assert_invalid(
            validate_timeout_range(
                "fetch",
                MIN_FETCH_TIMEOUT_MS - 1,
                MIN_FETCH_TIMEOUT_MS,
                MAX_FETCH_TIMEOUT_MS,
            ),
            "fetch must be between 100 and 60000 milliseconds",
        );
        assert_invalid(
            validate_timeout_range(
                "fetch",
                MAX_FETCH_TIMEOUT_MS + 1,
                MIN_FETCH_TIMEOUT_MS,
                MAX_FETCH_TIMEOUT_MS,
            ),
            "fetch must be between",
        );
    }

    // ============================================================================
    // SECTION: Path Helper Tests
    // ============================================================================

    #[test]
    fn validate_path_string_rejects_whitespace_only() {
        assert_invalid(validate_path_string("audit.path", "   "), "audit.path must be non-empty");
    }

    #[test]
    fn validate_path_string_rejects_component_too_long() {
        let long = format!("data/{}", "a".repeat(MAX_PATH_COMPONENT_LENGTH + 1));
        assert_invalid(validate_path_string("audit.path", &long), "path component too long");
    }

    #[test]
    fn validate_path_rejects_total_length() {
        let long = "a/".repeat(MAX_TOTAL_PATH_LENGTH / 2 + 1);
        assert_invalid(validate_path(Path::new(&long)), "exceeds max length");
    }

    #[test]
    fn resolve_path_prefers_explicit_path() {
        let resolved = resolve_path(Some(Path::new("custom.toml"))).unwrap();
        assert_eq!(resolved, PathBuf::from("custom.toml"));
    }
}
