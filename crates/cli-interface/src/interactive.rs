//! Interactive loop
//!
//! Reads a line, splits it into tokens, resolves the command and hands it to
//! the invoker under a fresh deadline, one line at a time. `exit`, Ctrl-C and
//! end of input end the loop with a [`TerminalSignal`]; the stop token ends it
//! with [`ShellExit::Stopped`]. Neither path exits the process from here.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use common::error::{Error, Result};
use common::utils::format_duration;
use common::{CommandEntry, InputLine, Invocation, InvocationContext, InvocationOutcome};
use invoker::CommandInvoker;
use shell_config::ShellConfig;

use crate::commands::{exit_command, help_command, EXIT_COMMAND};
use crate::formatters::Presenter;
use crate::input::{LineReader, ReadEvent};
use crate::registry::Registry;
use crate::resolver::Resolution;
use crate::state::{ActivityFlag, ShellExit, ShellState, TerminalSignal};

/// What one dispatch did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    /// Name of the resolved command
    pub command: String,

    /// Tokens passed to the handler
    pub arguments: Vec<String>,

    /// Handler outcome
    pub outcome: InvocationOutcome,

    /// Whether the handler returned after its deadline
    pub overran: bool,
}

/// Result of processing one input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// The line held no tokens
    Empty,

    /// The line asked the process to terminate
    Terminate(TerminalSignal),

    /// No registered command matched
    NotFound,

    /// A command ran
    Dispatched(DispatchReport),
}

/// Registry, resolver and invoker wired to a presenter
pub struct Shell {
    /// Registered commands
    registry: Registry,

    /// Execution strategy
    invoker: Arc<dyn CommandInvoker>,

    /// Operator-facing output
    presenter: Arc<dyn Presenter>,

    /// Prompt text
    prompt: String,

    /// Farewell banner
    farewell: String,

    /// Deadline for each dispatch
    dispatch_timeout: Duration,

    /// Loop state
    state: ShellState,

    /// Set while a command executes
    activity: ActivityFlag,
}

impl Shell {
    /// Creates a shell with the built-in `exit` and `help` commands registered
    pub fn new(
        config: &ShellConfig,
        invoker: Arc<dyn CommandInvoker>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        Self::with_registry(Registry::new(), config, invoker, presenter)
    }

    /// Like [`Shell::new`] but starting from an existing registry
    pub fn with_registry(
        mut registry: Registry,
        config: &ShellConfig,
        invoker: Arc<dyn CommandInvoker>,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        registry.register(exit_command());
        registry.register(help_command(registry.help().clone(), presenter.clone()));

        Self {
            registry,
            invoker,
            presenter,
            prompt: config.prompt.clone(),
            farewell: config.farewell.clone(),
            dispatch_timeout: config.dispatch_timeout(),
            state: ShellState::Stopped,
            activity: ActivityFlag::default(),
        }
    }

    /// Registers a command. Only possible while the loop is not running.
    pub fn register(&mut self, entry: CommandEntry) -> &mut Self {
        self.registry.register(entry);
        self
    }

    /// Gets the registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Gets the loop state
    pub fn state(&self) -> ShellState {
        self.state
    }

    /// Handle telling whether a command is executing
    pub fn activity(&self) -> ActivityFlag {
        self.activity.clone()
    }

    /// Gets the per-dispatch deadline
    pub fn dispatch_timeout(&self) -> Duration {
        self.dispatch_timeout
    }

    /// Runs the loop until `stop` fires or a terminal signal arrives.
    ///
    /// `stop` is checked once per iteration, before each read; it never
    /// interrupts a read or a running command.
    pub async fn run(&mut self, reader: &mut dyn LineReader, stop: &CancellationToken) -> ShellExit {
        self.state = ShellState::Running;
        info!(commands = self.registry.len(), "interactive shell started");

        let exit = loop {
            if stop.is_cancelled() {
                break ShellExit::Stopped;
            }

            let line = match reader.read_line(&self.prompt) {
                Ok(ReadEvent::Line(line)) => line,
                Ok(ReadEvent::Interrupted) => {
                    break ShellExit::Terminate(TerminalSignal::Interrupt)
                }
                Ok(ReadEvent::EndOfInput) => {
                    break ShellExit::Terminate(TerminalSignal::EndOfInput)
                }
                Err(e) => {
                    warn!(error = %e, "read input failed");
                    self.presenter.diagnostic(&format!("read input failed: {}", e));
                    continue;
                }
            };

            if !line.trim().is_empty() {
                reader.add_history(&line);
            }

            match self.process_line(&line).await {
                LineOutcome::Terminate(signal) => break ShellExit::Terminate(signal),
                LineOutcome::Empty | LineOutcome::NotFound | LineOutcome::Dispatched(_) => {}
            }
        };

        if let Err(e) = reader.save_history() {
            warn!(error = %e, "failed to save history");
        }

        self.state = ShellState::Stopped;
        info!(exit = ?exit, "interactive shell stopped");

        exit
    }

    /// Processes one line of input: the part of an iteration after the read
    pub async fn process_line(&self, line: &str) -> LineOutcome {
        let input = InputLine::parse(line);

        if input.is_empty() {
            return LineOutcome::Empty;
        }

        if input.first() == Some(EXIT_COMMAND) {
            return self.farewell();
        }

        let resolution = match self.registry.resolve(input.tokens()) {
            Ok(resolution) => resolution,
            Err(e) => {
                debug!(line, "no command matched");
                self.presenter.diagnostic(&e.to_string());
                return LineOutcome::NotFound;
            }
        };

        // tokens like `ex it` also resolve to the exit entry
        if resolution.entry.name() == EXIT_COMMAND {
            return self.farewell();
        }

        let report = self.execute(resolution, input).await;
        self.presenter.outcome(&report.command, &report.outcome);
        LineOutcome::Dispatched(report)
    }

    fn farewell(&self) -> LineOutcome {
        self.presenter.farewell(&self.farewell);
        LineOutcome::Terminate(TerminalSignal::Exit)
    }

    /// Resolves `input` and runs it under a fresh deadline.
    ///
    /// Returns only once the handler has returned, even if that is long after
    /// the deadline.
    pub async fn dispatch(&self, input: InputLine) -> Result<DispatchReport> {
        let resolution = self.registry.resolve(input.tokens())?;
        Ok(self.execute(resolution, input).await)
    }

    async fn execute(&self, resolution: Resolution, input: InputLine) -> DispatchReport {
        let invocation = Invocation::new(resolution.entry, input, resolution.consumed);

        let _busy = self.activity.enter();
        let (ctx, _cancel) = InvocationContext::with_timeout(self.dispatch_timeout);
        let outcome = self.invoker.invoke(&ctx, &invocation).await;

        let overran = ctx.deadline_exceeded();
        if overran {
            let err = Error::Timeout(format!(
                "{} ran past {}",
                invocation.entry().name(),
                format_duration(self.dispatch_timeout)
            ));
            warn!(error = %err, "command returned after its deadline");
        }

        DispatchReport {
            command: invocation.entry().name().to_string(),
            arguments: invocation.arguments().to_vec(),
            outcome,
            overran,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatters::MemoryPresenter;
    use crate::input::ScriptedReader;
    use crate::testing::recording_entry;
    use common::handler_fn;
    use invoker::LocalInvoker;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    struct CountingInvoker {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CommandInvoker for CountingInvoker {
        async fn invoke(&self, _ctx: &InvocationContext, _invocation: &Invocation) -> InvocationOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            InvocationOutcome::success()
        }

        fn name(&self) -> &'static str {
            "counting"
        }
    }

    fn shell_with(presenter: Arc<MemoryPresenter>) -> Shell {
        Shell::new(&ShellConfig::default(), Arc::new(LocalInvoker::new()), presenter)
    }

    #[tokio::test]
    async fn test_scenario() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter.clone());
        let (show, show_seen) = recording_entry("show version", "print version");
        let (list, list_seen) = recording_entry("list", "list items");
        shell.register(show).register(list);

        let mut reader = ScriptedReader::from_lines(["show version", "list extra args", "unknown"]);
        let exit = shell.run(&mut reader, &CancellationToken::new()).await;

        // script runs dry after "unknown", so the loop kept going until then
        assert_eq!(exit, ShellExit::Terminate(TerminalSignal::EndOfInput));
        assert_eq!(reader.reads(), 4);

        assert_eq!(show_seen.lock().clone(), vec![Vec::<String>::new()]);
        assert_eq!(
            list_seen.lock().clone(),
            vec![vec!["extra".to_string(), "args".to_string()]]
        );

        let outcomes = presenter.outcomes();
        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].0, "show version");
        assert!(outcomes[0].1.succeeded);
        assert_eq!(outcomes[1].0, "list");

        assert_eq!(presenter.diagnostics(), vec!["command not found".to_string()]);
        assert_eq!(shell.state(), ShellState::Stopped);
    }

    #[tokio::test]
    async fn test_exit_is_intercepted_before_resolution() {
        let presenter = Arc::new(MemoryPresenter::new());
        let invoker = Arc::new(CountingInvoker {
            calls: AtomicUsize::new(0),
        });
        let mut shell = Shell::new(&ShellConfig::default(), invoker.clone(), presenter.clone());

        let mut reader = ScriptedReader::from_lines(["exit now", "list"]);
        let exit = shell.run(&mut reader, &CancellationToken::new()).await;

        assert_eq!(exit, ShellExit::Terminate(TerminalSignal::Exit));
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
        assert!(!reader.is_exhausted());
        assert_eq!(presenter.output(), vec![ShellConfig::default().farewell]);
    }

    #[tokio::test]
    async fn test_empty_lines_are_skipped() {
        let presenter = Arc::new(MemoryPresenter::new());
        let invoker = Arc::new(CountingInvoker {
            calls: AtomicUsize::new(0),
        });
        let shell = Shell::new(&ShellConfig::default(), invoker.clone(), presenter.clone());

        assert_eq!(shell.process_line("").await, LineOutcome::Empty);
        assert_eq!(shell.process_line("   \t ").await, LineOutcome::Empty);
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
        assert!(presenter.diagnostics().is_empty());
    }

    #[tokio::test]
    async fn test_unresolved_never_reaches_invoker() {
        let presenter = Arc::new(MemoryPresenter::new());
        let invoker = Arc::new(CountingInvoker {
            calls: AtomicUsize::new(0),
        });
        let shell = Shell::new(&ShellConfig::default(), invoker.clone(), presenter.clone());

        let err = shell.dispatch(InputLine::default()).await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(shell.process_line("bogus").await, LineOutcome::NotFound);
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_interrupt_terminates() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter.clone());

        let mut reader = ScriptedReader::new()
            .event(ReadEvent::Interrupted)
            .line("help");
        let exit = shell.run(&mut reader, &CancellationToken::new()).await;

        assert_eq!(exit, ShellExit::Terminate(TerminalSignal::Interrupt));
        assert_eq!(reader.reads(), 1);
        // no farewell banner on interrupt
        assert!(presenter.output().is_empty());
    }

    #[tokio::test]
    async fn test_read_failure_reported_and_loop_continues() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter.clone());
        let (list, seen) = recording_entry("list", "list items");
        shell.register(list);

        let mut reader = ScriptedReader::new().failure("resource busy").line("list").line("exit");
        let exit = shell.run(&mut reader, &CancellationToken::new()).await;

        assert_eq!(exit, ShellExit::Terminate(TerminalSignal::Exit));
        assert_eq!(seen.lock().len(), 1);
        assert_eq!(
            presenter.diagnostics(),
            vec!["read input failed: Input error: resource busy".to_string()]
        );
        assert_eq!(reader.history(), ["list".to_string(), "exit".to_string()]);
    }

    #[tokio::test]
    async fn test_stop_signal_checked_before_read() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter);

        let stop = CancellationToken::new();
        stop.cancel();

        let mut reader = ScriptedReader::from_lines(["list"]);
        let exit = shell.run(&mut reader, &stop).await;

        assert_eq!(exit, ShellExit::Stopped);
        assert_eq!(reader.reads(), 0);
        assert_eq!(shell.state(), ShellState::Stopped);
    }

    #[tokio::test]
    async fn test_stop_takes_effect_between_lines() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter);

        let stop = CancellationToken::new();
        let trigger = stop.clone();
        shell.register(CommandEntry::new(
            "shutdown",
            "fires the stop signal",
            handler_fn(move |_ctx, _args| {
                let trigger = trigger.clone();
                async move {
                    trigger.cancel();
                    Ok(())
                }
            }),
        ));
        let (list, seen) = recording_entry("list", "list items");
        shell.register(list);

        let mut reader = ScriptedReader::from_lines(["shutdown", "list"]);
        let exit = shell.run(&mut reader, &stop).await;

        assert_eq!(exit, ShellExit::Stopped);
        assert_eq!(reader.reads(), 1);
        assert!(seen.lock().is_empty());
    }

    #[tokio::test]
    async fn test_failed_handler_reported_as_outcome() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter.clone());
        shell.register(CommandEntry::new(
            "fail",
            "always fails",
            handler_fn(|_ctx, _args| async { Err(anyhow::anyhow!("X")) }),
        ));

        match shell.process_line("fail").await {
            LineOutcome::Dispatched(report) => {
                assert_eq!(report.outcome, InvocationOutcome::failure("X"));
                assert!(!report.overran);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(presenter.outcomes()[0].1.reason(), Some("X"));
    }

    // the deadline timer needs a worker thread while the handler blocks this one
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_non_cooperative_handler_blocks_until_it_returns() {
        let presenter = Arc::new(MemoryPresenter::new());
        let config = ShellConfig {
            dispatch_timeout_secs: 1,
            ..ShellConfig::default()
        };
        let mut shell = Shell::new(&config, Arc::new(LocalInvoker::new()), presenter.clone());

        let saw_cancel = Arc::new(AtomicBool::new(false));
        let flag = saw_cancel.clone();
        shell.register(CommandEntry::new(
            "stubborn",
            "ignores cancellation",
            handler_fn(move |ctx, _args| {
                let flag = flag.clone();
                async move {
                    // blocks the thread instead of yielding, like non-async work would
                    std::thread::sleep(Duration::from_millis(1300));
                    flag.store(ctx.is_cancelled(), Ordering::SeqCst);
                    Ok(())
                }
            }),
        ));

        let started = std::time::Instant::now();
        let report = match shell.process_line("stubborn").await {
            LineOutcome::Dispatched(report) => report,
            other => panic!("unexpected {:?}", other),
        };

        assert!(started.elapsed() >= Duration::from_millis(1300));
        assert!(report.outcome.succeeded);
        assert!(report.overran);
        assert!(saw_cancel.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cooperative_handler_sees_deadline() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter);

        shell.register(CommandEntry::new(
            "deadline",
            "reports remaining time",
            handler_fn(|ctx, _args| async move {
                let remaining = ctx.remaining().unwrap_or_default();
                anyhow::ensure!(
                    remaining > Duration::from_secs(29) && remaining <= Duration::from_secs(30),
                    "unexpected remaining time {:?}",
                    remaining
                );
                Ok(())
            }),
        ));

        match shell.process_line("deadline").await {
            LineOutcome::Dispatched(report) => assert!(report.outcome.succeeded),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exit_reached_through_resolution_terminates() {
        let presenter = Arc::new(MemoryPresenter::new());
        let invoker = Arc::new(CountingInvoker {
            calls: AtomicUsize::new(0),
        });
        let mut shell = Shell::new(&ShellConfig::default(), invoker.clone(), presenter.clone());

        assert_eq!(
            shell.process_line("ex it").await,
            LineOutcome::Terminate(TerminalSignal::Exit)
        );
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
        assert_eq!(presenter.output(), vec![ShellConfig::default().farewell]);

        let mut reader = ScriptedReader::from_lines(["e x i t", "help"]);
        let exit = shell.run(&mut reader, &CancellationToken::new()).await;
        assert_eq!(exit, ShellExit::Terminate(TerminalSignal::Exit));
        assert_eq!(reader.reads(), 1);
    }

    #[tokio::test]
    async fn test_huge_timeout_dispatches_without_deadline() {
        let presenter = Arc::new(MemoryPresenter::new());
        let config = ShellConfig {
            dispatch_timeout_secs: u64::MAX,
            ..ShellConfig::default()
        };
        let mut shell = Shell::new(&config, Arc::new(LocalInvoker::new()), presenter);
        shell.register(CommandEntry::new(
            "deadline",
            "reports its deadline",
            handler_fn(|ctx, _args| async move {
                anyhow::ensure!(ctx.deadline().is_none(), "unexpected deadline");
                Ok(())
            }),
        ));

        match shell.process_line("deadline").await {
            LineOutcome::Dispatched(report) => {
                assert!(report.outcome.succeeded);
                assert!(!report.overran);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_activity_flag_set_only_while_command_runs() {
        let presenter = Arc::new(MemoryPresenter::new());
        let mut shell = shell_with(presenter);
        let activity = shell.activity();

        let observed = activity.clone();
        shell.register(CommandEntry::new(
            "busy",
            "checks the activity flag",
            handler_fn(move |_ctx, _args| {
                let observed = observed.clone();
                async move {
                    anyhow::ensure!(observed.is_busy(), "shell not marked busy");
                    Ok(())
                }
            }),
        ));

        assert!(!activity.is_busy());
        match shell.process_line("busy").await {
            LineOutcome::Dispatched(report) => assert!(report.outcome.succeeded),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!activity.is_busy());
    }

    #[test]
    fn test_builtins_registered() {
        let shell = shell_with(Arc::new(MemoryPresenter::new()));
        assert!(shell.registry().lookup_name("exit").is_some());
        assert!(shell.registry().lookup_name("help").is_some());
        assert_eq!(shell.dispatch_timeout(), Duration::from_secs(30));
        assert_eq!(shell.state(), ShellState::Stopped);
    }
}
