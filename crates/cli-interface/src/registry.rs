//! Command registry
//!
//! Commands live in a flat map keyed by the FNV-1a hash of their
//! whitespace-stripped name. Next to it the registry keeps the help index
//! (name to description) and the completion set fed to the line editor. All
//! three are updated together by [`Registry::register`].
//!
//! Registration takes `&mut self`, so it cannot overlap with a running loop
//! that borrows the registry.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{info, warn};

use common::error::Result;
use common::utils::command_key;
use common::CommandEntry;

use crate::resolver::{self, Resolution};

/// Shared view of registered names and their descriptions, ordered by name
#[derive(Debug, Clone, Default)]
pub struct HelpIndex {
    entries: Arc<RwLock<BTreeMap<String, String>>>,
}

impl HelpIndex {
    /// Creates an empty index
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, name: &str, description: &str) {
        self.entries
            .write()
            .insert(name.to_string(), description.to_string());
    }

    fn remove(&self, name: &str) {
        self.entries.write().remove(name);
    }

    /// Gets the description registered for `name`
    pub fn description(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    /// Snapshot of all `(name, description)` pairs, sorted by name
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .read()
            .iter()
            .map(|(name, description)| (name.clone(), description.clone()))
            .collect()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Completion items shared with the line editor
#[derive(Debug, Clone, Default)]
pub struct CompletionSet {
    items: Arc<RwLock<Vec<String>>>,
}

impl CompletionSet {
    /// Creates an empty set
    pub fn new() -> Self {
        Self::default()
    }

    fn add(&self, item: &str) {
        let mut items = self.items.write();
        if !items.iter().any(|existing| existing == item) {
            items.push(item.to_string());
        }
    }

    fn remove(&self, item: &str) {
        self.items.write().retain(|existing| existing != item);
    }

    /// Items in registration order
    pub fn items(&self) -> Vec<String> {
        self.items.read().clone()
    }

    /// Items that start with `prefix`, in registration order
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        self.items
            .read()
            .iter()
            .filter(|item| item.starts_with(prefix))
            .cloned()
            .collect()
    }
}

/// Flat registry of commands
#[derive(Debug, Default)]
pub struct Registry {
    /// Hashed normalized name -> entry
    commands: HashMap<u32, Arc<CommandEntry>>,

    /// Help index
    help: HelpIndex,

    /// Completion items
    completions: CompletionSet,
}

impl Registry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that feeds an existing completion set
    pub fn with_completions(completions: CompletionSet) -> Self {
        Self {
            completions,
            ..Self::default()
        }
    }

    /// Registers `entry` and returns its key.
    ///
    /// Argument parsing is switched to raw for every entry. An entry whose
    /// key is already taken replaces the previous one without error; the
    /// displaced name also leaves the help index and completion set.
    pub fn register(&mut self, entry: CommandEntry) -> u32 {
        let entry = entry.with_raw_arguments(true);
        let key = command_key(entry.name());
        let name = entry.name().to_string();
        let description = entry.description().to_string();

        if let Some(previous) = self.commands.insert(key, Arc::new(entry)) {
            if previous.name() != name {
                warn!(
                    key,
                    replaced = previous.name(),
                    cmd = %name,
                    "command key collision, previous command is no longer reachable"
                );
                self.help.remove(previous.name());
                self.completions.remove(previous.name());
            }
        }

        self.help.insert(&name, &description);
        self.completions.add(&name);

        info!(cmd = %name, key, "register command");

        key
    }

    /// Looks up an entry by key
    pub fn lookup(&self, key: u32) -> Option<Arc<CommandEntry>> {
        self.commands.get(&key).cloned()
    }

    /// Looks up an entry by (unnormalized) name
    pub fn lookup_name(&self, name: &str) -> Option<Arc<CommandEntry>> {
        self.lookup(command_key(name))
    }

    /// Resolves input tokens to a registered command
    pub fn resolve(&self, tokens: &[String]) -> Result<Resolution> {
        resolver::resolve(self, tokens)
    }

    /// Gets the help index
    pub fn help(&self) -> &HelpIndex {
        &self.help
    }

    /// Gets the completion set
    pub fn completions(&self) -> &CompletionSet {
        &self.completions
    }

    /// Number of reachable commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns true if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
