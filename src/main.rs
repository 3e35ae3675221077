//! # Dotmate CLI
//!
//! Scheduled content for Dot. e-ink displays.
//!
//! ## Usage
//!
//! ```bash
//! # Run every configured schedule until Ctrl-C
//! dotmate --config config.yaml daemon
//!
//! # Push a text card right now
//! dotmate push office text --message "Standup in 5" --title "Reminder"
//!
//! # Push using the params of the device's first `work_image` schedule
//! dotmate push office work_image
//!
//! # Arbitrary params (integers are coerced when the contract says so)
//! dotmate push office umami_stats --param umami_host=https://umami.example.com \
//!     --param umami_website_id=abc --param umami_api_key=KEY --param umami_time_range=7d
//!
//! # Show renderer types and their parameters
//! dotmate types
//!
//! # Start the preview server
//! dotmate serve --listen 127.0.0.1:8080
//! ```

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dotmate::{
    DotmateError,
    config::{self, Config},
    registry::{ParamType, Params, RendererRegistry},
    renderers::{self, RenderContext},
    schedule::ScheduleEngine,
    server::{self, AppState, ServerConfig},
    transport::DotClient,
};

/// Dotmate - cron-scheduled content for Dot. e-ink displays
#[derive(Parser, Debug)]
#[command(name = "dotmate")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = config::DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run all configured schedules until interrupted (default)
    Daemon,

    /// Render and deliver one payload now
    Push {
        /// Device name or identifier
        device: String,

        /// Renderer type (see `dotmate types`)
        kind: String,

        #[arg(long)]
        message: Option<String>,

        #[arg(long)]
        title: Option<String>,

        /// Work start, HH:MM
        #[arg(long)]
        clock_in: Option<String>,

        /// Work end, HH:MM
        #[arg(long)]
        clock_out: Option<String>,

        #[arg(long)]
        image_path: Option<String>,

        #[arg(long)]
        main_title: Option<String>,

        #[arg(long)]
        sub_title: Option<String>,

        /// Link opened when the display is tapped
        #[arg(long)]
        link: Option<String>,

        /// Border color index (0 white, otherwise black)
        #[arg(long)]
        border: Option<u8>,

        /// DIFFUSION, ORDERED or NONE
        #[arg(long)]
        dither_type: Option<String>,

        /// Error-diffusion kernel, e.g. FLOYD_STEINBERG
        #[arg(long)]
        dither_kernel: Option<String>,

        /// Extra parameter, repeatable
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },

    /// List renderer types and their parameter contracts
    Types,

    /// Start the preview / administration HTTP server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), DotmateError> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Commands::Daemon) {
        Commands::Types => {
            print_types(&renderers::default_registry());
            Ok(())
        }
        Commands::Daemon => {
            let config = Config::load(&cli.config)?;
            let (engine, _) = build_engine(&config)?;

            let count = engine.load(&config.devices)?;
            for entry in engine.entries() {
                info!(
                    device = %entry.device_name,
                    kind = %entry.kind,
                    cron = entry.cron.as_deref().unwrap_or("-"),
                    next_fire = ?entry.next_fire,
                    "Scheduled"
                );
            }
            info!(count, "Schedules loaded");

            let (tx, rx) = watch::channel(false);
            tokio::spawn(async move {
                shutdown_signal().await;
                info!("Shutdown requested; draining");
                let _ = tx.send(true);
            });

            engine.run(rx).await;
            Ok(())
        }
        Commands::Push {
            device,
            kind,
            message,
            title,
            clock_in,
            clock_out,
            image_path,
            main_title,
            sub_title,
            link,
            border,
            dither_type,
            dither_kernel,
            params,
        } => {
            let config = Config::load(&cli.config)?;
            let target = config
                .device(&device)
                .ok_or_else(|| DotmateError::Config(format!("Unknown device '{}'", device)))?;
            let (engine, registry) = build_engine(&config)?;
            let entry = registry.resolve(&kind)?;

            let mut given = Params::new();
            let flags = [
                ("message", message),
                ("title", title),
                ("clock_in", clock_in),
                ("clock_out", clock_out),
                ("image_path", image_path),
                ("main_title", main_title),
                ("sub_title", sub_title),
                ("link", link),
                ("dither_type", dither_type),
                ("dither_kernel", dither_kernel),
            ];
            for (key, value) in flags {
                if let Some(value) = value {
                    given.insert(key.to_string(), Value::String(value));
                }
            }
            if let Some(border) = border {
                given.insert("border".to_string(), Value::from(border));
            }
            for pair in &params {
                let (key, raw) = pair.split_once('=').ok_or_else(|| {
                    DotmateError::invalid_params(&kind, format!("expected KEY=VALUE, got '{}'", pair))
                })?;
                let value = match entry.contract.field(key).map(|f| f.param_type) {
                    Some(ParamType::Integer) => raw
                        .parse::<i64>()
                        .map(Value::from)
                        .map_err(|_| DotmateError::invalid_params(&kind, format!("'{}' must be an integer", key)))?,
                    _ => Value::String(raw.to_string()),
                };
                given.insert(key.to_string(), value);
            }

            if given.is_empty()
                && let Some(defaults) = target.params_for(&kind)
            {
                given = defaults.clone();
            }

            let payload = engine.fire_now(&target.device_id, &kind, given).await?;
            println!("Pushed {} ({}) to {}", kind, payload.shape(), target.name);
            Ok(())
        }
        Commands::Serve { listen } => {
            let config = Config::load(&cli.config)?;
            let (engine, registry) = build_engine(&config)?;
            let state = Arc::new(AppState::load(registry, engine, config.devices)?);
            info!(count = state.engine.entries().len(), "Schedules loaded");
            server::serve(ServerConfig { listen_addr: listen }, state, shutdown_signal()).await
        }
    }
}

fn build_engine(
    config: &Config,
) -> Result<(Arc<ScheduleEngine>, Arc<RendererRegistry>), DotmateError> {
    let registry = Arc::new(renderers::default_registry());
    let transport = Arc::new(DotClient::from_config(config)?);
    let context = RenderContext::from_config(config)?;
    let engine = Arc::new(ScheduleEngine::new(registry.clone(), transport, context));
    Ok((engine, registry))
}

fn print_types(registry: &RendererRegistry) {
    for info in registry.list_types() {
        println!("{}", info.kind);
        for spec in &info.params.fields {
            let mut line = format!(
                "  {:<14} {:<8}{}",
                spec.name,
                format!("{:?}", spec.param_type).to_lowercase(),
                if spec.required { " required" } else { "" }
            );
            if !spec.allowed.is_empty() {
                line.push_str(&format!(" [{}]", spec.allowed.join("|")));
            }
            if let Some(description) = spec.description {
                line.push_str(&format!("  {}", description));
            }
            println!("{}", line.trim_end());
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
