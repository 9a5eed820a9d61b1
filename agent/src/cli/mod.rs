//! CLI module for test-agent
//!
//! Provides the `serve`, `status` and `stop` subcommands.

pub mod serve;
pub mod status;
pub mod stop;

use clap::{Parser, Subcommand};

/// Test agent - remotely controlled HTTP client/server and process simulator
#[derive(Parser, Debug)]
#[command(name = "test-agent")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = r#"ENVIRONMENT VARIABLES:
    TEST_AGENT_HOST                 RPC bind address (default: 127.0.0.1)
    TEST_AGENT_PORT                 RPC port (default: 9091)
    TEST_AGENT_LOG_LEVEL            Log level (default: info)
    TEST_AGENT_ACTION_TIMEOUT_MS    Action timeout in milliseconds (default: 10000)
    TEST_AGENT__<SECTION>__<KEY>    Any configuration file key, e.g. TEST_AGENT__LOGGING__DIR
"#)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Serve options used when no subcommand is given
    #[command(flatten)]
    pub serve: serve::ServeArgs,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the agent (default)
    Serve(serve::ServeArgs),
    /// Stop a running agent
    Stop(stop::StopArgs),
    /// Show the version of a running agent
    Status(status::StatusArgs),
}
