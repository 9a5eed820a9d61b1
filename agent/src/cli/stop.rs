//! stop サブコマンド
//!
//! 起動中のエージェントにシャットダウンを要求します。

use clap::Args;
use std::time::Duration;

/// stop サブコマンドの引数
#[derive(Args, Debug, Clone)]
pub struct StopArgs {
    /// Port of the agent to stop
    #[arg(short, long, env = "TEST_AGENT_PORT")]
    pub port: u16,

    /// Host of the agent to stop
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
}

/// stop コマンドを実行
pub async fn execute(args: &StopArgs) -> Result<(), anyhow::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let url = format!("http://{}:{}/api/agent/shutdown", args.host, args.port);

    match client.post(&url).send().await {
        Ok(response) => {
            response.error_for_status()?;
            println!("Shutdown requested for agent on {}:{}", args.host, args.port);
        }
        Err(err) if err.is_connect() => {
            println!("No agent running on {}:{}", args.host, args.port);
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}
