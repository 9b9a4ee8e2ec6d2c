//! Output rendering
//!
//! The loop hands help listings, outcomes and diagnostics to a [`Presenter`].
//! Rendering itself is plain string formatting so it can be tested without a
//! terminal.

use console::{style, Term};
use parking_lot::Mutex;
use tracing::warn;

use common::InvocationOutcome;

/// Receives everything the shell shows to the operator
pub trait Presenter: Send + Sync {
    /// Shows the result of a dispatched command
    fn outcome(&self, command: &str, outcome: &InvocationOutcome);

    /// Shows a one-line diagnostic for a recoverable failure
    fn diagnostic(&self, message: &str);

    /// Shows the help listing
    fn help(&self, entries: &[(String, String)]);

    /// Shows the farewell banner
    fn farewell(&self, banner: &str);
}

/// Renders `name - description` lines, name padded to 20 columns
pub fn render_help(entries: &[(String, String)]) -> String {
    entries
        .iter()
        .map(|(name, description)| format!("    {:<20} - {}", name, description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Renders the "Execution Results" block for one outcome
pub fn render_outcome(command: &str, outcome: &InvocationOutcome) -> String {
    let mut lines = vec![
        "Execution Results:".to_string(),
        format!("    {:<20} : {}", "command", command),
        format!(
            "    {:<20} : {}",
            "status",
            if outcome.succeeded { "success" } else { "failed" }
        ),
    ];

    if let Some(reason) = outcome.reason() {
        lines.push(format!("    {:<20} : {}", "reason", reason));
    }

    lines.join("\n")
}

/// Renders the single diagnostic line for a failed command
pub fn render_failure(command: &str, outcome: &InvocationOutcome) -> String {
    format!(
        "{}: {}",
        command,
        outcome.reason().unwrap_or("command failed")
    )
}

/// Presenter writing to the process's stdout
pub struct ConsolePresenter {
    term: Term,
    show_results: bool,
}

impl ConsolePresenter {
    /// Creates a presenter; `show_results` also prints successful outcomes
    pub fn new(show_results: bool) -> Self {
        Self {
            term: Term::stdout(),
            show_results,
        }
    }

    fn write(&self, text: &str) {
        if let Err(e) = self.term.write_line(text) {
            warn!("Failed to write to terminal: {}", e);
        }
    }
}

impl Presenter for ConsolePresenter {
    fn outcome(&self, command: &str, outcome: &InvocationOutcome) {
        if outcome.succeeded {
            if self.show_results {
                self.write(&render_outcome(command, outcome));
            }
        } else {
            self.diagnostic(&render_failure(command, outcome));
        }
    }

    fn diagnostic(&self, message: &str) {
        self.write(&format!("{} {}", style("Error:").red().bold(), message));
    }

    fn help(&self, entries: &[(String, String)]) {
        self.write(&render_help(entries));
    }

    fn farewell(&self, banner: &str) {
        self.write(banner);
    }
}

/// Presenter that keeps everything it is given, for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryPresenter {
    outcomes: Mutex<Vec<(String, InvocationOutcome)>>,
    diagnostics: Mutex<Vec<String>>,
    output: Mutex<Vec<String>>,
}

impl MemoryPresenter {
    /// Creates an empty presenter
    pub fn new() -> Self {
        Self::default()
    }

    /// Outcomes seen so far, with their command names
    pub fn outcomes(&self) -> Vec<(String, InvocationOutcome)> {
        self.outcomes.lock().clone()
    }

    /// Diagnostics seen so far
    pub fn diagnostics(&self) -> Vec<String> {
        self.diagnostics.lock().clone()
    }

    /// Help listings and banners, rendered
    pub fn output(&self) -> Vec<String> {
        self.output.lock().clone()
    }
}

impl Presenter for MemoryPresenter {
    fn outcome(&self, command: &str, outcome: &InvocationOutcome) {
        self.outcomes
            .lock()
            .push((command.to_string(), outcome.clone()));
    }

    fn diagnostic(&self, message: &str) {
        self.diagnostics.lock().push(message.to_string());
    }

    fn help(&self, entries: &[(String, String)]) {
        self.output.lock().push(render_help(entries));
    }

    fn farewell(&self, banner: &str) {
        self.output.lock().push(banner.to_string());
    }
}
