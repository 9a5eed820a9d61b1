//! ロギング初期化ユーティリティ
//!
//! 標準出力、任意のファイル出力、ログストリーム購読者への配信を
//! 1つの `tracing_subscriber::registry()` にまとめる。

use crate::log_broadcast::LogBroadcast;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::{self, Write as _};
use std::path::Path;
use test_agent_common::config::LoggingSection;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as fmt_layer, EnvFilter, Layer};

/// ログファイル名のプレフィックス
pub const LOG_FILE_PREFIX: &str = "test-agent.log";

/// グローバルなtracing subscriberを初期化する
///
/// `RUST_LOG` が設定されていればそれを優先し、なければ設定のログレベルを使う。
/// ファイル出力を有効にした場合、返されたガードはプロセス終了まで保持すること。
pub fn init(
    config: &LoggingSection,
    broadcast: LogBroadcast,
) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let (file_layer, guard) = match config.dir.as_deref() {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(Path::new(dir), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt_layer::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer::layer())
        .with(file_layer)
        .with(LogBroadcastLayer::new(broadcast))
        .try_init()?;

    Ok(guard)
}

/// すべてのイベントを1行に整形してログブロードキャストへ流すレイヤー
pub struct LogBroadcastLayer {
    broadcast: LogBroadcast,
}

impl LogBroadcastLayer {
    /// 新しいレイヤーを作成
    pub fn new(broadcast: LogBroadcast) -> Self {
        Self { broadcast }
    }
}

impl<S> Layer<S> for LogBroadcastLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if self.broadcast.subscriber_count() == 0 {
            return;
        }

        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let line = format_line(
            Utc::now(),
            metadata.level(),
            metadata.target(),
            &visitor.message,
            &visitor.fields,
        );
        self.broadcast.publish(&line);
    }
}

/// `<rfc3339> <LEVEL> <target>: <message> k=v...`
pub fn format_line(
    timestamp: DateTime<Utc>,
    level: &Level,
    target: &str,
    message: &str,
    fields: &[(String, String)],
) -> String {
    let mut line = format!(
        "{} {} {}: {}",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        level,
        target,
        message
    );
    for (name, value) in fields {
        let _ = write!(line, " {}={}", name, value);
    }
    line
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: Vec<(String, String)>,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push((field.name().to_string(), value.to_string()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.fields
                .push((field.name().to_string(), format!("{:?}", value)));
        }
    }
}
