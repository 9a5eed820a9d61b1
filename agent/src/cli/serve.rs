//! serve サブコマンド
//!
//! エージェントを起動します。未指定の項目は設定ファイルと環境変数の値を使います。

use crate::config::{ConfigOverrides, DEFAULT_CONFIG_FILE};
use clap::Args;
use std::path::PathBuf;

/// serve サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// RPC listen port
    #[arg(short, long, env = "TEST_AGENT_PORT")]
    pub port: Option<u16>,

    /// RPC bind address
    #[arg(short = 'H', long, env = "TEST_AGENT_HOST")]
    pub host: Option<String>,

    /// Directory holding the configuration file
    #[arg(long, default_value = ".", env = "TEST_AGENT_BASE_DIR")]
    pub base_dir: PathBuf,

    /// Configuration file name, resolved against --base-dir
    #[arg(long, default_value = DEFAULT_CONFIG_FILE, env = "TEST_AGENT_CONFIG_FILE")]
    pub config_file: String,

    /// Log level filter (overridden by RUST_LOG)
    #[arg(long, env = "TEST_AGENT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Action timeout in milliseconds
    #[arg(long, env = "TEST_AGENT_ACTION_TIMEOUT_MS")]
    pub action_timeout_ms: Option<u64>,
}

impl ServeArgs {
    /// 設定ファイルの値を上書きする項目
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            log_level: self.log_level.clone(),
            action_timeout_ms: self.action_timeout_ms,
        }
    }
}
