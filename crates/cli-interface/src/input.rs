//! Line input
//!
//! The loop reads through the [`LineReader`] trait. [`TerminalReader`] wraps
//! rustyline with prefix completion over registered command names and
//! history; [`StreamReader`] reads plain lines from any buffered source (piped
//! stdin, files); [`ScriptedReader`] replays a fixed list of events.

use std::collections::VecDeque;
use std::io::BufRead;
use std::path::PathBuf;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing::{debug, warn};

use common::error::{Error, Result};

use crate::registry::CompletionSet;

/// What a single read produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// A line of text, without its line terminator
    Line(String),

    /// The operator pressed Ctrl-C
    Interrupted,

    /// The input is exhausted (Ctrl-D, closed stdin)
    EndOfInput,
}

/// Source of operator input lines
pub trait LineReader {
    /// Blocks until one line (or an interrupt / end of input) is available
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent>;

    /// Records an accepted line in history
    fn add_history(&mut self, _line: &str) {}

    /// Persists history, if the reader keeps any
    fn save_history(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Rustyline helper completing command names
pub struct CommandCompleter {
    completions: CompletionSet,
}

impl CommandCompleter {
    /// Creates a completer backed by `completions`
    pub fn new(completions: CompletionSet) -> Self {
        Self { completions }
    }

    /// Candidates for the text before the cursor, and where they start
    pub fn candidates(&self, head: &str) -> (usize, Vec<String>) {
        let trimmed = head.trim_start();
        let start = head.len() - trimmed.len();
        (start, self.completions.complete(trimmed))
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let (start, names) = self.candidates(&line[..pos]);
        let pairs = names
            .into_iter()
            .map(|name| Pair {
                display: name.clone(),
                replacement: name,
            })
            .collect();
        Ok((start, pairs))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}

impl Validator for CommandCompleter {}

impl Helper for CommandCompleter {}

/// Interactive terminal reader backed by rustyline
pub struct TerminalReader {
    editor: Editor<CommandCompleter, DefaultHistory>,
    history_file: Option<PathBuf>,
}

impl TerminalReader {
    /// Creates the line editor.
    ///
    /// Failing here means the terminal cannot be driven at all, which is
    /// fatal for an interactive session.
    pub fn new(
        completions: CompletionSet,
        history_size: usize,
        history_file: Option<PathBuf>,
    ) -> Result<Self> {
        let config = rustyline::Config::builder()
            .max_history_size(history_size)
            .map_err(|e| Error::Input(format!("invalid history size: {}", e)))?
            .auto_add_history(false)
            .build();

        let mut editor: Editor<CommandCompleter, DefaultHistory> = Editor::with_config(config)
            .map_err(|e| Error::Input(format!("failed to create line editor: {}", e)))?;
        editor.set_helper(Some(CommandCompleter::new(completions)));

        if let Some(path) = &history_file {
            if path.exists() {
                if let Err(e) = editor.load_history(path) {
                    warn!("Failed to load history from {}: {}", path.display(), e);
                }
            }
        }

        Ok(Self {
            editor,
            history_file,
        })
    }
}

impl LineReader for TerminalReader {
    // Blocks the calling thread. The shell is driven from the runtime's
    // `block_on` thread, so spawned tasks keep running on the workers.
    fn read_line(&mut self, prompt: &str) -> Result<ReadEvent> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadEvent::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadEvent::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadEvent::EndOfInput),
            Err(e) => Err(Error::Input(e.to_string())),
        }
    }

    fn add_history(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            debug!("Failed to add history entry: {}", e);
        }
    }

    fn save_history(&mut self) -> Result<()> {
        if let Some(path) = &self.history_file {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            self.editor
                .save_history(path)
                .map_err(|e| Error::Input(format!("failed to save history: {}", e)))?;
        }
        Ok(())
    }
}

/// Reads plain lines from a buffered source
pub struct StreamReader<R> {
    source: R,
}

impl<R: BufRead> StreamReader<R> {
    /// Creates a reader over `source`
    pub fn new(source: R) -> Self {
        Self { source }
    }
}

impl<R: BufRead> LineReader for StreamReader<R> {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadEvent> {
        let mut line = String::new();
        if self.source.read_line(&mut line)? == 0 {
            return Ok(ReadEvent::EndOfInput);
        }

        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        Ok(ReadEvent::Line(line))
    }
}

/// Replays a fixed sequence of read results, then reports end of input
#[derive(Default)]
pub struct ScriptedReader {
    script: VecDeque<Result<ReadEvent>>,
    prompts: usize,
    history: Vec<String>,
}

impl ScriptedReader {
    /// Creates an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a script of plain lines
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut reader = Self::new();
        for line in lines {
            reader = reader.line(line);
        }
        reader
    }

    /// Appends a line
    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.script.push_back(Ok(ReadEvent::Line(line.into())));
        self
    }

    /// Appends an arbitrary event
    pub fn event(mut self, event: ReadEvent) -> Self {
        self.script.push_back(Ok(event));
        self
    }

    /// Appends a read failure
    pub fn failure(mut self, message: impl Into<String>) -> Self {
        self.script.push_back(Err(Error::Input(message.into())));
        self
    }

    /// Number of reads performed so far
    pub fn reads(&self) -> usize {
        self.prompts
    }

    /// Entries that were added to history
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Returns true once every scripted event was consumed
    pub fn is_exhausted(&self) -> bool {
        self.script.is_empty()
    }
}

impl LineReader for ScriptedReader {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadEvent> {
        self.prompts += 1;
        self.script.pop_front().unwrap_or(Ok(ReadEvent::EndOfInput))
    }

    fn add_history(&mut self, line: &str) {
        self.history.push(line.to_string());
    }
}
