use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::EnvFilter;

use slotline::api::ApiServerBuilder;
use slotline::{AssistantFactory, AssistantKind, BroadcastNotifier, Config, Notifier, WebhookNotifier};

/// Slotline - slot-filling conversations for voice assistants
#[derive(Parser)]
#[command(name = "slotline", version, about)]
struct Cli {
    /// Port to listen on (overrides SLOTLINE_PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the API server (default)
    Serve,
    /// Feed a JSON-lines tool call script into one conversation
    Replay {
        /// Assistant to drive (barista or wellness)
        assistant: AssistantKind,
        /// Script with one `{"tool": ..., "arguments": {...}}` per line
        file: PathBuf,
    },
    /// Print an assistant's instructions
    Instructions {
        /// Assistant (barista or wellness)
        assistant: AssistantKind,
    },
    /// Print the wellness check-in history
    History,
    /// Print the last completed coffee order
    LastOrder,
}

/// One step of a replay script
#[derive(Debug, Deserialize)]
struct ReplayStep {
    tool: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,slotline=info",
        1 => "info,slotline=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load()?;
    if let Some(port) = cli.port {
        config.api_server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    let config = Arc::new(config);
    let events = Arc::new(BroadcastNotifier::new());
    let factory = AssistantFactory::new(config.clone(), notifier(&config, &events)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, factory, events).await,
        Command::Replay { assistant, file } => replay(&factory, &events, assistant, &file).await,
        Command::Instructions { assistant } => {
            println!("{}", factory.create(assistant).await.instructions());
            Ok(())
        }
        Command::History => {
            let entries = factory.checkins().load_all().await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
            Ok(())
        }
        Command::LastOrder => {
            match factory.orders().load().await? {
                Some(order) => println!("{}", serde_json::to_string_pretty(&order)?),
                None => println!("no order saved yet"),
            }
            Ok(())
        }
    }
}

/// Webhook delivery when configured, otherwise fan-out to WebSocket observers
fn notifier(config: &Config, events: &Arc<BroadcastNotifier>) -> anyhow::Result<Arc<dyn Notifier>> {
    if let Some(url) = &config.notify.webhook_url {
        tracing::info!(url = %url, "delivering notifications by webhook");
        return Ok(Arc::new(WebhookNotifier::new(url, config.notify.timeout)?));
    }
    Ok(events.clone())
}

async fn serve(
    config: &Config,
    factory: AssistantFactory,
    events: Arc<BroadcastNotifier>,
) -> anyhow::Result<()> {
    tracing::info!(
        port = config.api_server.port,
        data_dir = %config.data_dir.display(),
        barista_gate = %config.barista.gate,
        wellness_gate = %config.wellness.gate,
        "starting slotline"
    );

    let server = ApiServerBuilder::new(factory, events, config.api_server.port).build();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

async fn replay(
    factory: &AssistantFactory,
    events: &BroadcastNotifier,
    kind: AssistantKind,
    file: &Path,
) -> anyhow::Result<()> {
    let script = tokio::fs::read_to_string(file).await?;
    let mut rx = events.subscribe();
    let mut assistant = factory.create(kind).await;

    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let step: ReplayStep = serde_json::from_str(line)
            .map_err(|e| anyhow::anyhow!("{}:{}: {e}", file.display(), index + 1))?;
        let arguments = if step.arguments.is_null() {
            String::new()
        } else {
            step.arguments.to_string()
        };

        match assistant.execute(&step.tool, &arguments).await {
            Ok(result) => println!("{} -> {result}", step.tool),
            Err(e) => println!("{} !! {e}", step.tool),
        }

        loop {
            match rx.try_recv() {
                Ok(message) => println!("  [{}] {}", message.topic, serde_json::to_string(&message.payload)?),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "replay missed notifications");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    if assistant.has_pending_announcement() {
        tracing::warn!("a saved record was never announced");
    }

    Ok(())
}
