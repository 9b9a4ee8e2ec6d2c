//! Tool server bootstrap
//!
//! Wires configuration, logging, the command invoker and the interactive shell
//! together. Embedders register their own commands on a [`ToolServer`] before
//! entering the shell.

use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use cli_interface::{
    ActivityFlag, ConsolePresenter, LineReader, Presenter, Shell, ShellExit, StreamReader,
    TerminalReader, TerminalSignal,
};
use common::{handler_fn, CommandEntry};
use invoker::{build_invoker, CommandInvoker};
use logging::Logger;
use shell_config::{ConfigManager, ShellConfig};

pub use cli_interface;
pub use common;

/// Name of the built-in version command
pub const VERSION_COMMAND: &str = "version";

/// Command-line overrides applied on top of the loaded configuration
#[derive(Debug, Clone, Default)]
pub struct ServerOptions {
    /// Configuration file; must exist when given
    pub config_path: Option<PathBuf>,

    /// Prompt override
    pub prompt: Option<String>,

    /// Dispatch timeout override, in seconds
    pub timeout_secs: Option<u64>,

    /// Log level override
    pub log_level: Option<String>,
}

/// Decides what an operator interrupt means at the moment it arrives
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    activity: ActivityFlag,
    stop: CancellationToken,
}

impl InterruptHandle {
    /// Handles one interrupt.
    ///
    /// While a command runs, the stop token fires and the shell returns before
    /// its next read. Otherwise the shell is waiting for input and the process
    /// should terminate with the returned signal.
    pub fn interrupt(&self) -> Option<TerminalSignal> {
        if self.activity.is_busy() {
            info!("Interrupted while a command runs, stopping after it returns");
            self.stop.cancel();
            None
        } else {
            Some(TerminalSignal::Interrupt)
        }
    }
}

/// Interactive tool server
pub struct ToolServer {
    /// Configuration manager
    config_manager: ConfigManager,

    /// Command invoker shared with the shell
    invoker: Arc<dyn CommandInvoker>,

    /// Interactive shell
    shell: Shell,

    /// Fired to stop the shell loop between lines
    stop: CancellationToken,
}

impl ToolServer {
    /// Loads configuration, initializes logging and builds a server that
    /// prints to the terminal. Must be called from within a tokio runtime.
    pub fn bootstrap(options: ServerOptions) -> Result<Self> {
        let config_manager = Self::load_config(&options)?;
        Logger::init(&config_manager.config().logging)?;

        info!(
            version = env!("CARGO_PKG_VERSION"),
            config = ?config_manager.source(),
            "Initializing tool server"
        );

        let presenter = Arc::new(ConsolePresenter::new(config_manager.config().show_results));
        Ok(Self::new(config_manager, presenter))
    }

    /// Loads the configuration and applies the command-line overrides
    pub fn load_config(options: &ServerOptions) -> Result<ConfigManager> {
        let mut manager = ConfigManager::load(options.config_path.as_deref())
            .context("failed to load configuration")?;

        manager
            .update(|config| {
                if let Some(prompt) = &options.prompt {
                    config.prompt = prompt.clone();
                }
                if let Some(secs) = options.timeout_secs {
                    config.dispatch_timeout_secs = secs;
                }
                if let Some(level) = &options.log_level {
                    config.logging.level = level.clone();
                }
            })
            .context("invalid command-line option")?;

        Ok(manager)
    }

    /// Builds a server around an already loaded configuration.
    /// Must be called from within a tokio runtime.
    pub fn new(config_manager: ConfigManager, presenter: Arc<dyn Presenter>) -> Self {
        let config = config_manager.config();
        let invoker = build_invoker(&config.invoker);

        let mut shell = Shell::new(config, invoker.clone(), presenter);
        shell.register(version_command());

        Self {
            config_manager,
            invoker,
            shell,
            stop: CancellationToken::new(),
        }
    }

    /// Registers a command
    pub fn register(&mut self, entry: CommandEntry) -> &mut Self {
        self.shell.register(entry);
        self
    }

    /// Gets the effective configuration
    pub fn config(&self) -> &ShellConfig {
        self.config_manager.config()
    }

    /// Gets the shell
    pub fn shell(&self) -> &Shell {
        &self.shell
    }

    /// Gets the invoker commands run through
    pub fn invoker(&self) -> Arc<dyn CommandInvoker> {
        self.invoker.clone()
    }

    /// Token that stops the shell loop before its next read
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Handle for process-level interrupts (Ctrl-C outside the line editor)
    pub fn interrupt_handle(&self) -> InterruptHandle {
        InterruptHandle {
            activity: self.shell.activity(),
            stop: self.stop.clone(),
        }
    }

    /// Runs the shell over `reader` until it is stopped or asked to terminate
    pub async fn run(&mut self, reader: &mut dyn LineReader) -> ShellExit {
        let exit = self.shell.run(reader, &self.stop).await;
        info!(exit = ?exit, "Tool server shell finished");
        exit
    }

    /// Runs the shell on the process's stdin.
    ///
    /// A terminal gets line editing, completion and history; anything else
    /// (a pipe, a file) is read line by line.
    pub async fn enter_shell(&mut self) -> Result<ShellExit> {
        if std::io::stdin().is_terminal() {
            let config = self.config_manager.config();
            let mut reader = TerminalReader::new(
                self.shell.registry().completions().clone(),
                config.history_size,
                config.history_file.clone(),
            )
            .context("failed to set up the terminal")?;

            Ok(self.run(&mut reader).await)
        } else {
            warn!("stdin is not a terminal, reading commands line by line");
            let mut reader = StreamReader::new(std::io::stdin().lock());
            Ok(self.run(&mut reader).await)
        }
    }
}

/// The `version` entry
fn version_command() -> CommandEntry {
    CommandEntry::new(
        VERSION_COMMAND,
        "print toolshell version",
        handler_fn(|_ctx, _args| async {
            println!("toolshell {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }),
    )
}
