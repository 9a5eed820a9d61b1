//! 設定管理
//!
//! AgentConfig（YAMLファイル + 環境変数）

use crate::error::AgentResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 環境変数のプレフィックス（例: `TEST_AGENT__ACTIONS__TIMEOUT_MS=500`）
pub const ENV_PREFIX: &str = "TEST_AGENT";

/// エージェント設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentConfig {
    /// RPCサーバー設定
    #[serde(default)]
    pub agent: AgentSection,

    /// プロファイル名 (デフォルト: "dev")
    #[serde(default = "default_profile")]
    pub profile: String,

    /// アクション設定
    #[serde(default)]
    pub actions: ActionsSection,

    /// ログ設定
    #[serde(default)]
    pub logging: LoggingSection,
}

/// RPCサーバー設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentSection {
    /// ホストアドレス (デフォルト: "127.0.0.1")
    #[serde(default = "default_host")]
    pub host: String,

    /// ポート番号 (デフォルト: 9091)
    #[serde(default = "default_port")]
    pub port: u16,
}

/// アクション設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionsSection {
    /// 送受信アクションの待機上限（ミリ秒）(デフォルト: 10000)
    #[serde(default = "default_action_timeout_ms")]
    pub timeout_ms: u64,
}

/// ログ設定
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingSection {
    /// ログレベル (デフォルト: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// ログファイルの出力先ディレクトリ（未設定ならファイル出力なし）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

fn default_profile() -> String {
    "dev".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9091
}

fn default_action_timeout_ms() -> u64 {
    10_000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent: AgentSection::default(),
            profile: default_profile(),
            actions: ActionsSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for ActionsSection {
    fn default() -> Self {
        Self {
            timeout_ms: default_action_timeout_ms(),
        }
    }
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

impl AgentConfig {
    /// YAMLファイルと環境変数から設定を読み込む
    ///
    /// ファイルが存在しない場合はデフォルト値を使用する。
    /// 環境変数はファイルの値を上書きする。
    pub fn load(path: &Path) -> AgentResult<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::File::new(&path.to_string_lossy(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut loaded: AgentConfig = settings.try_deserialize()?;
        loaded.set_defaults();
        Ok(loaded)
    }

    /// 空の値をデフォルト値で置き換える
    pub fn set_defaults(&mut self) {
        if self.profile.trim().is_empty() {
            self.profile = default_profile();
        }
        if self.logging.level.trim().is_empty() {
            self.logging.level = default_log_level();
        }
        if self.actions.timeout_ms == 0 {
            self.actions.timeout_ms = default_action_timeout_ms();
        }
        if self.agent.port == 0 {
            self.agent.port = default_port();
        }
    }
}
