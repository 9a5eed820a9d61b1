//! Test Agent Entry Point

use clap::Parser;
use test_agent::cli::{serve::ServeArgs, Cli, Commands};
use test_agent::config::{bind_addr, load_config, log_config, ActionTimeout};
use test_agent::log_broadcast::LogBroadcast;
use test_agent::{logging, server, AppState, VERSION};
use tracing::info;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Stop(args)) => {
            if let Err(e) = test_agent::cli::stop::execute(&args).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Status(args)) => {
            if let Err(e) = test_agent::cli::status::execute(&args).await {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Serve(args)) => serve(args).await,
        // No subcommand - default to serve
        None => serve(cli.serve).await,
    }
}

async fn serve(args: ServeArgs) {
    if let Err(e) = run_server(args).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run_server(args: ServeArgs) -> anyhow::Result<()> {
    let config = load_config(&args.base_dir, &args.config_file, &args.overrides())?;

    // ログ配信はロギングより先に作り、レイヤーと状態の両方に渡す
    let broadcast = LogBroadcast::new();
    let _guard = logging::init(&config.logging, broadcast.clone())?;
    log_config(&config);

    info!(version = VERSION, profile = %config.profile, "Starting test agent");
    let state = AppState::new(ActionTimeout::from(&config), broadcast);
    server::run(state, &bind_addr(&config)).await
}
