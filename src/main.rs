use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use hotkey_commands::config::HotkeyConfig;
use hotkey_commands::keyspec::{self, KeySpec};
use hotkey_commands::platform::x11::{X11Platform, spawn_event_thread};
use hotkey_commands::registry::{HotkeyEvent, HotkeyRegistry};

#[derive(Parser)]
#[command(name = "hotkeyd", about = "Global hotkey daemon")]
struct Cli {
    /// Log filter used when RUST_LOG is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse key specs and print what they resolve to
    Parse {
        #[arg(required = true)]
        specs: Vec<String>,
    },
    /// Register the configured hotkeys and log events until Ctrl-C
    Run {
        /// Config file (defaults to <config dir>/hotkeyd/config.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Parse { specs } => parse_specs(&specs),
        Command::Run { config } => {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    tracing::error!(error = %e, "failed to build runtime");
                    return ExitCode::FAILURE;
                }
            };
            match runtime.block_on(run(config)) {
                Ok(()) => ExitCode::SUCCESS,
                Err(e) => {
                    tracing::error!(error = %e, "hotkeyd failed");
                    ExitCode::FAILURE
                }
            }
        }
    }
}

fn parse_specs(specs: &[String]) -> ExitCode {
    for spec in specs {
        match KeySpec::parse(spec) {
            Ok(parsed) => println!(
                "{}\tmodifiers=0x{:04X}\tvk=0x{:02X}",
                keyspec::canonical_spec(spec),
                parsed.modifiers().bits(),
                parsed.key().code(),
            ),
            Err(e) => {
                eprintln!("{spec}: {e}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let path = config_path.unwrap_or_else(HotkeyConfig::default_path);
    let config = HotkeyConfig::load_or_default(&path)?;

    let platform = X11Platform::connect()?;
    let root = platform.root_window();
    let conn = Arc::clone(platform.conn());

    let mut registry = HotkeyRegistry::new(platform, root, config.root_options())?;
    let mut events = registry.subscribe();
    config.apply(&mut registry)?;
    registry.start()?;
    tracing::info!(window = %root, hotkeys = registry.len(), "hotkeyd running");

    let stop = Arc::new(AtomicBool::new(false));
    let (mut x11_events, thread) = spawn_event_thread(conn, Arc::clone(&stop))?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            Some(event) = x11_events.recv() => {
                if let Some(fired) = registry.platform().translate(&event) {
                    registry.on_hotkey(fired);
                }
            }
            Some(event) = events.recv() => log_event(&event),
            _ = &mut shutdown => {
                tracing::info!("interrupted, shutting down");
                break;
            }
        }
    }

    registry.dispose();
    while let Ok(event) = events.try_recv() {
        log_event(&event);
    }

    stop.store(true, Ordering::Relaxed);
    if thread.join().is_err() {
        tracing::warn!("X11 event thread panicked");
    }
    Ok(())
}

fn log_event(event: &HotkeyEvent) {
    match event {
        HotkeyEvent::Registered { success, spec, id } => {
            tracing::info!(id, spec = %spec, success, "registered")
        }
        HotkeyEvent::Unregistered { spec, id } => tracing::info!(id, spec = %spec, "unregistered"),
        HotkeyEvent::Fired { window, id, spec } => {
            tracing::info!(id, spec = %spec, window = %window, "fired")
        }
    }
}
