/// Server Configuration
///
/// Configuration comes from two places:
/// - Environment variables, read once at startup into [`ServerConfig`]
/// - An optional YAML file (`kmcp.yaml` by default) holding per-tool settings
///   under a `tools` section, read into [`FileConfig`]
///
/// Environment Variables:
/// - SERVER_NAME: Name of the server (default: "math-mcp-server")
/// - SERVER_VERSION: Version string (default: the crate version)
/// - MCP_TRANSPORT_MODE: "http", "stdio", or "both" (default: "http")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 8080)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, capped at 16)
/// - MCP_CONFIG_FILE: Path of the YAML tool configuration (default: "kmcp.yaml")

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_NAME: &str = "math-mcp-server";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_CONFIG_FILE: &str = "kmcp.yaml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid transport mode '{0}'. Must be 'stdio', 'http', or 'both'")]
    InvalidTransport(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Which transports the process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// HTTP only: REST endpoints plus JSON-RPC on `/mcp`
    Http,
    /// STDIO only: line-delimited JSON-RPC for MCP Inspector and local use
    Stdio,
    /// STDIO in a background task alongside the HTTP server
    Both,
}

impl FromStr for TransportMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "stdio" => Ok(Self::Stdio),
            "both" => Ok(Self::Both),
            _ => Err(ConfigError::InvalidTransport(s.to_string())),
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Http => "http",
            Self::Stdio => "stdio",
            Self::Both => "both",
        })
    }
}

/// Process-level settings resolved from the environment.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub name: String,
    pub version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub config_file: PathBuf,
}

impl ServerConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    ///
    /// Unparsable `PORT` or `WORKER_THREADS` values fall back to their
    /// defaults with a warning; an unknown transport mode is an error.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let transport = match lookup("MCP_TRANSPORT_MODE") {
            Some(mode) => mode.parse()?,
            None => TransportMode::Http,
        };

        let port = match lookup("PORT") {
            Some(raw) => raw.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!(value = %raw, default = DEFAULT_PORT, "invalid PORT, using default");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let workers = lookup("WORKER_THREADS")
            .and_then(|raw| match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => Some(n),
                _ => {
                    warn!(value = %raw, "invalid WORKER_THREADS, using CPU count");
                    None
                }
            })
            .unwrap_or_else(default_workers);

        Ok(Self {
            name: lookup("SERVER_NAME").unwrap_or_else(|| DEFAULT_NAME.to_string()),
            version: lookup("SERVER_VERSION")
                .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
            transport,
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            workers,
            config_file: lookup("MCP_CONFIG_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE)),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// CPU count capped at 16 to avoid excessive context switching.
fn default_workers() -> usize {
    num_cpus::get().clamp(1, 16)
}

/// Per-tool settings loaded from the YAML configuration file.
///
/// Expected layout:
/// ```yaml
/// tools:
///   factorial:
///     max_input: 100
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileConfig {
    values: HashMap<String, Value>,
}

impl FileConfig {
    /// Load the file at `path`, degrading to an empty configuration.
    ///
    /// A missing file is normal and logged at debug level; an unreadable or
    /// malformed file is logged as a warning. Neither stops the server.
    pub fn load(path: &Path) -> Self {
        match Self::try_load(path) {
            Ok(config) => config,
            Err(ConfigError::Read { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!(path = %path.display(), "no tool configuration file");
                Self::default()
            }
            Err(e) => {
                warn!(error = %e, "ignoring tool configuration");
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        let values: Option<HashMap<String, Value>> = serde_yaml::from_str(raw)?;
        Ok(Self {
            values: values.unwrap_or_default(),
        })
    }

    /// Settings for a single tool, or an empty map if it has none.
    pub fn tool_config(&self, tool_name: &str) -> HashMap<String, Value> {
        // Navigate the configuration hierarchy: config -> tools -> tool_name
        self.values
            .get("tools")
            .and_then(|tools| tools.get(tool_name))
            .and_then(|v| v.as_object())
            .map(|tool| tool.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default()
    }
}
