use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use desk_config::DeskConfig;
use desk_core::Notify;
use desk_notify::Notifier;
use desk_server::{App, ExceptionPipeline, HandlerMode, HttpServer, Router, config_warnings};
use serde_json::json;

#[derive(Debug, Parser)]
#[command(name = "taskdesk", version, about = "Task-tracking API server")]
struct Cli {
    /// Debug-level logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Errors only.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the API until interrupted.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
struct ServeArgs {
    /// Listen address, overrides `server.bind`.
    #[arg(long)]
    bind: Option<String>,

    /// Include diagnostics in error responses.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("taskdesk error: {error:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose)?;

    match cli.command {
        Commands::Serve(args) => serve(args).await,
    }
}

async fn serve(args: ServeArgs) -> anyhow::Result<()> {
    let mut config = DeskConfig::load_with_dotenv().context("failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    config.general.debug |= args.debug;
    config_warnings::warn_unconfigured(&config);

    let notifier = Notifier::from_config(&config)
        .context("failed to configure error tracker")?
        .map(|notifier| Arc::new(notifier) as Arc<dyn Notify>);
    let pipeline = ExceptionPipeline::new(config.general.debug)
        .with_mode(HandlerMode::DebugNative)
        .with_notifier(notifier);

    let app_name = config.general.app_name.clone();
    let router = Router::new().route("GET", "/health", move |_| {
        Ok(json!({"status": "ok", "app": app_name}).into())
    });

    let server = HttpServer::bind(config.server.socket_addr()?, Arc::new(App::new(router, pipeline)))?;
    tracing::info!(
        addr = %server.local_addr()?,
        env = %config.general.env,
        debug = config.general.debug,
        "taskdesk: listening"
    );

    let shutdown = server.shutdown_handle();
    let serving = tokio::task::spawn_blocking(move || server.run());

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    shutdown.shutdown();
    serving.await.context("server task failed")?;
    Ok(())
}

fn init_tracing(quiet: bool, verbose: bool) -> anyhow::Result<()> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("TASKDESK_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| anyhow::anyhow!("failed to initialize tracing subscriber: {error}"))?;

    Ok(())
}
