//! Built-in commands registered by every shell

use std::sync::Arc;

use async_trait::async_trait;

use common::{CommandEntry, CommandHandler, InvocationContext};

use crate::formatters::Presenter;
use crate::registry::HelpIndex;

/// Name the loop intercepts before resolution
pub const EXIT_COMMAND: &str = "exit";

/// Name of the help listing command
pub const HELP_COMMAND: &str = "help";

/// Handler for `exit`.
///
/// The loop never dispatches `exit`: a leading `exit` token, or any input
/// that resolves to this entry, becomes a terminal signal instead. The entry
/// exists so the name shows up in help and completion.
struct ExitHandler;

#[async_trait]
impl CommandHandler for ExitHandler {
    async fn run(&self, _ctx: &InvocationContext, _args: &[String]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Prints every registered command with its description
struct HelpHandler {
    help: HelpIndex,
    presenter: Arc<dyn Presenter>,
}

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn run(&self, _ctx: &InvocationContext, args: &[String]) -> anyhow::Result<()> {
        let entries = self.help.entries();

        let selected: Vec<(String, String)> = if args.is_empty() {
            entries
        } else {
            let prefix = args.join(" ");
            entries
                .into_iter()
                .filter(|(name, _)| name.starts_with(&prefix))
                .collect()
        };

        anyhow::ensure!(!selected.is_empty(), "no command matches '{}'", args.join(" "));

        self.presenter.help(&selected);
        Ok(())
    }
}

/// The `exit` entry
pub fn exit_command() -> CommandEntry {
    CommandEntry::new(EXIT_COMMAND, "exit shell", ExitHandler)
}

/// The `help` entry; `help show` narrows the listing to names starting with "show"
pub fn help_command(help: HelpIndex, presenter: Arc<dyn Presenter>) -> CommandEntry {
    CommandEntry::new(
        HELP_COMMAND,
        "list available commands",
        HelpHandler { help, presenter },
    )
}
