//! Client Configuration
//!
//! Server URL and bearer token carried by the HTTP transport, plus the
//! small piece of local state that survives a reload: the active-board
//! selection.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Default server URL
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";

/// Transport configuration
#[derive(Debug, Clone)]
pub struct Config {
    server_url: String,
    token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        let server_url =
            std::env::var("LANEBOARD_API_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
        Self {
            server_url,
            token: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a configuration for an explicit server URL
    pub fn with_server_url(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            token: None,
        }
    }

    /// Set the bearer token
    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Get the bearer token
    pub fn get_token(&self) -> Option<&String> {
        self.token.as_ref()
    }

    /// Clear the token (sign-out)
    pub fn clear_token(&mut self) {
        self.token = None;
    }

    /// Get the full URL for an API endpoint
    pub fn api_url(&self, path: &str) -> String {
        format!("{}/{}", self.server_url.trim_end_matches('/'), path)
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedSelection {
    active_board_id: Option<Uuid>,
}

/// Persists the active-board selection across reloads.
///
/// Only the selection is persisted; the board and task caches themselves
/// are rehydrated from the network on load. Load tolerates a missing or
/// corrupt file by returning no selection.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    /// Store under the platform config directory
    pub fn new() -> Self {
        let mut path = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        path.push("laneboard");
        path.push("selection.json");
        Self { path }
    }

    /// Store at an explicit path (tests)
    pub fn at_path(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// The last persisted selection, if any
    pub fn load(&self) -> Option<Uuid> {
        let raw = std::fs::read_to_string(&self.path).ok()?;
        let persisted: PersistedSelection = serde_json::from_str(&raw).ok()?;
        persisted.active_board_id
    }

    /// Persist the selection; failures are logged and swallowed since a
    /// lost selection only costs the auto-select on next load
    pub fn store(&self, active_board_id: Option<Uuid>) {
        let persisted = PersistedSelection { active_board_id };
        let write = || -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string(&persisted)
                .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
            std::fs::write(&self.path, raw)
        };
        if let Err(e) = write() {
            tracing::warn!("Failed to persist board selection: {}", e);
        }
    }
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new()
    }
}
