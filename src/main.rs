use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use toolshell::{ServerOptions, ToolServer};

/// Interactive command shell for tool servers
#[derive(Parser, Debug)]
#[command(name = "toolshell", version, about)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short, long, env = "TOOLSHELL_CONFIG")]
    config: Option<PathBuf>,

    /// Prompt shown before each line
    #[arg(long)]
    prompt: Option<String>,

    /// Seconds each command may run before its context is cancelled
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Log filter, e.g. "info" or "cli_interface=debug"
    #[arg(long)]
    log_level: Option<String>,
}

impl From<Args> for ServerOptions {
    fn from(args: Args) -> Self {
        Self {
            config_path: args.config,
            prompt: args.prompt,
            timeout_secs: args.timeout_secs,
            log_level: args.log_level,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut server = ToolServer::bootstrap(args.into())?;

    // The line editor reports Ctrl-C itself; this catches it while a command
    // runs or while piped input is being read
    let interrupts = server.interrupt_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if let Some(signal) = interrupts.interrupt() {
                info!(signal = ?signal, "Terminating");
                std::process::exit(signal.exit_code());
            }
        }
    });

    let exit = server.enter_shell().await?;

    if let Some(signal) = exit.terminal_signal() {
        info!(signal = ?signal, "Terminating");
        std::process::exit(signal.exit_code());
    }

    Ok(())
}
