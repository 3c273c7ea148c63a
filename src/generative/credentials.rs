//! Server-side model credential.

use super::provider::ModelError;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Timeout for api_key_command execution.
const API_KEY_COMMAND_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of the server's own API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiKeySource {
    /// No server key; callers must supply their own.
    None,
    /// Static API key.
    Static(String),
    /// Shell command that outputs the API key (for rotating tokens).
    Command(String),
}

impl ApiKeySource {
    /// Static key first, then the key command, then [`API_KEY_ENV_VAR`].
    pub fn from_config(api_key: Option<String>, api_key_command: Option<String>) -> Self {
        Self::resolve(api_key, api_key_command, std::env::var(API_KEY_ENV_VAR).ok())
    }

    fn resolve(
        api_key: Option<String>,
        api_key_command: Option<String>,
        env_key: Option<String>,
    ) -> Self {
        let non_empty = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        if let Some(key) = non_empty(api_key) {
            ApiKeySource::Static(key)
        } else if let Some(cmd) = non_empty(api_key_command) {
            ApiKeySource::Command(cmd)
        } else if let Some(key) = non_empty(env_key) {
            ApiKeySource::Static(key)
        } else {
            ApiKeySource::None
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, ApiKeySource::None)
    }

    /// Get the current API key, executing the command if necessary.
    pub async fn get_key(&self) -> Result<Option<String>, ModelError> {
        match self {
            ApiKeySource::None => Ok(None),
            ApiKeySource::Static(key) => Ok(Some(key.clone())),
            ApiKeySource::Command(cmd) => {
                debug!(command = %cmd, "Fetching API key via command");

                let result = tokio::time::timeout(
                    API_KEY_COMMAND_TIMEOUT,
                    Command::new("sh").arg("-c").arg(cmd).output(),
                )
                .await;

                let output = match result {
                    Ok(Ok(output)) => output,
                    Ok(Err(e)) => {
                        warn!(command = %cmd, error = %e, "api_key_command failed to execute");
                        return Err(ModelError::Connection(format!(
                            "Failed to execute api_key_command: {}",
                            e
                        )));
                    }
                    Err(_) => {
                        warn!(command = %cmd, "api_key_command timed out");
                        return Err(ModelError::Timeout);
                    }
                };

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    warn!(command = %cmd, stderr = %stderr, "api_key_command failed");
                    return Err(ModelError::Connection(format!(
                        "api_key_command failed with status {}: {}",
                        output.status, stderr
                    )));
                }

                let key = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if key.is_empty() {
                    warn!(command = %cmd, "api_key_command returned empty key");
                    return Err(ModelError::Connection(
                        "api_key_command returned empty key".to_string(),
                    ));
                }

                Ok(Some(key))
            }
        }
    }
}
