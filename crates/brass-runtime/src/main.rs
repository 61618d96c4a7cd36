use std::path::PathBuf;

use anyhow::Context;
use brass_manager::{DuplicatePolicy, ManagerError};
use brass_runtime::console::{self, EchoSettings};
use brass_runtime::{LoggingBuilder, Startup, logging};
use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "brass", about = "Declarative plugin host", version)]
struct Cli {
    /// Path to the manager configuration (YAML or JSON)
    #[arg(short, long)]
    manager: PathBuf,

    /// Path to the public configuration (YAML or JSON)
    #[arg(short, long)]
    global: Option<PathBuf>,

    /// Skip plugins already bound by an earlier configuration source
    #[arg(long)]
    first_wins: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut startup = Startup::new(&cli.manager);
    if let Some(global) = &cli.global {
        startup = startup.global(global);
    }
    if cli.first_wins {
        startup = startup.policy(DuplicatePolicy::FirstWins);
    }

    let settings = match startup.prepare() {
        Ok(settings) => settings,
        Err(e) => {
            LoggingBuilder::new().init();
            error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };
    logging::init_from_config(&settings.config.logging);

    let manager = startup.manager();
    let (replier, replies) = console::reply_channel();
    manager.register_handler("ping", console::ping_handler(replier.clone()));
    {
        let public = settings.public.clone();
        manager.on_before_bind(move |registry| {
            let echo: EchoSettings = public
                .section_or_default(&["plugins", "echo"])
                .map_err(|e| ManagerError::hook(e.to_string()))?;
            registry.register_handler("echo", console::echo_handler(replier.clone(), echo));
            Ok(())
        });
    }

    let dispatcher = settings.config.dispatcher();
    let report = startup
        .initialize(&manager, &dispatcher)
        .inspect_err(|e| error!(error = %e, "Startup failed"))?;
    info!(
        plugins = dispatcher.engine_names().len(),
        bindings = report.binding_count(),
        "Brass started, reading events from stdin"
    );

    let input = BufReader::new(tokio::io::stdin());
    let dispatched = console::run_console(&dispatcher, replies, input, tokio::io::stdout())
        .await
        .context("console I/O failed")?;
    info!(events = dispatched, "Input closed, shutting down");

    Ok(())
}
