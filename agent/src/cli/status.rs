//! status subcommand
//!
//! Asks a running agent for its version.

use clap::Args;
use std::time::Duration;
use test_agent_common::protocol::StatusResponse;

/// Arguments for the status subcommand
#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    /// Port of the running agent
    #[arg(short, long, env = "TEST_AGENT_PORT")]
    pub port: u16,

    /// Host of the running agent
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    pub host: String,
}

/// Execute the status command
pub async fn execute(args: &StatusArgs) -> Result<(), anyhow::Error> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()?;
    let url = format!("http://{}:{}/api/agent/status", args.host, args.port);

    let status: StatusResponse = match client.get(&url).send().await {
        Ok(response) => response.error_for_status()?.json().await?,
        Err(err) if err.is_connect() => {
            println!("No agent running on {}:{}", args.host, args.port);
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    println!(
        "test-agent {} running on {}:{}",
        status.version, args.host, args.port
    );
    Ok(())
}
