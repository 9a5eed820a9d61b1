//! Configuration loading and the shared action timeout
//!
//! Layers, lowest precedence first: the YAML properties file, `TEST_AGENT__*`
//! environment variables, then CLI overrides.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use test_agent_common::config::AgentConfig;
use test_agent_common::error::{AgentError, AgentResult};
use tracing::info;

/// Default properties file name, resolved against the base directory
pub const DEFAULT_CONFIG_FILE: &str = "agent-properties.yaml";

/// Process-wide action timeout bounding every rendezvous wait
///
/// Cloned handles share the same value, and readers see updates at the
/// moment of their next wait.
#[derive(Debug, Clone)]
pub struct ActionTimeout {
    millis: Arc<AtomicU64>,
}

impl ActionTimeout {
    /// Create a handle with the given initial timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            millis: Arc::new(AtomicU64::new(timeout.as_millis() as u64)),
        }
    }

    /// Current timeout
    pub fn get(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::Relaxed))
    }

    /// Replace the timeout for every holder of this handle
    pub fn set(&self, timeout: Duration) {
        self.millis
            .store(timeout.as_millis() as u64, Ordering::Relaxed);
    }
}

impl Default for ActionTimeout {
    fn default() -> Self {
        Self::new(Duration::from_millis(AgentConfig::default().actions.timeout_ms))
    }
}

impl From<&AgentConfig> for ActionTimeout {
    fn from(config: &AgentConfig) -> Self {
        Self::new(Duration::from_millis(config.actions.timeout_ms))
    }
}

/// Values given on the command line; `None` keeps the loaded value
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// RPC bind address
    pub host: Option<String>,
    /// RPC port
    pub port: Option<u16>,
    /// Log level filter
    pub log_level: Option<String>,
    /// Action timeout in milliseconds
    pub action_timeout_ms: Option<u64>,
}

/// Load the effective configuration
///
/// A missing properties file is not an error; defaults apply instead.
pub fn load_config(
    base_dir: &Path,
    config_file: &str,
    overrides: &ConfigOverrides,
) -> AgentResult<AgentConfig> {
    let mut config = AgentConfig::load(&base_dir.join(config_file))?;

    if let Some(host) = &overrides.host {
        config.agent.host = host.clone();
    }
    if let Some(port) = overrides.port {
        config.agent.port = port;
    }
    if let Some(level) = &overrides.log_level {
        config.logging.level = level.clone();
    }
    if let Some(timeout_ms) = overrides.action_timeout_ms {
        config.actions.timeout_ms = timeout_ms;
    }
    config.set_defaults();

    Ok(config)
}

/// Render the configuration as YAML
pub fn to_yaml(config: &AgentConfig) -> AgentResult<String> {
    serde_yaml::to_string(config).map_err(|e| AgentError::Config(e.to_string()))
}

/// Log the effective configuration once logging is up
pub fn log_config(config: &AgentConfig) {
    match to_yaml(config) {
        Ok(yaml) => info!("using configuration:\n{}", yaml),
        Err(err) => tracing::warn!("could not render configuration - {}", err),
    }
}

/// RPC bind address (`host:port`)
pub fn bind_addr(config: &AgentConfig) -> String {
    format!("{}:{}", config.agent.host, config.agent.port)
}
