//! Command trait, registry, and name resolution.
//!
//! A line of input resolves to exactly one command: the registered command
//! whose name equals the trimmed line, or the registry's fallback. The
//! registry is shared between the host and every running session, so all
//! access goes through an internal `RwLock` and resolved commands are handed
//! out as `Arc`s. No lock is held while a command executes.

use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, PoisonError, RwLock};

use prompt_types::config::PromptConfig;
use prompt_types::error::Result;

/// What the dispatch loop does after a command returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Read the next line.
    Continue,
    /// End the session.
    Terminate,
}

/// Per-invocation state handed to a command.
pub struct Context<'a> {
    /// The input line with surrounding whitespace removed.
    pub input: &'a str,
    /// Session output stream.
    pub out: &'a mut dyn Write,
    /// The registry the command was resolved from.
    pub registry: &'a CommandRegistry,
    /// Configuration of the running session.
    pub config: &'a PromptConfig,
}

/// A single executable command.
pub trait Command: Send + Sync {
    /// The command name (what the user types).
    fn name(&self) -> &str;

    /// One-line description for `help`.
    fn description(&self) -> &str;

    /// Command category, informational only.
    fn category(&self) -> &str {
        "general"
    }

    /// Run the command.
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome>;
}

/// A command backed by a closure, built by [`CommandRegistry::register_fn`].
struct FnCommand<F> {
    name: String,
    description: String,
    action: F,
}

impl<F> Command for FnCommand<F>
where
    F: Fn(&mut Context<'_>) -> Result<Outcome> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }
    fn description(&self) -> &str {
        &self.description
    }
    fn category(&self) -> &str {
        "host"
    }
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        (self.action)(ctx)
    }
}

/// Default fallback: reports the input was not understood.
struct UnknownCmd;
impl Command for UnknownCmd {
    fn name(&self) -> &str {
        "<unknown>"
    }
    fn description(&self) -> &str {
        "Report an unrecognized command"
    }
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        writeln!(ctx.out, "unknown command: {}", ctx.input)?;
        writeln!(ctx.out, "Type 'help' to see available commands.")?;
        Ok(Outcome::Continue)
    }
}

#[derive(Default)]
struct Table {
    /// Names in first-registration order.
    order: Vec<String>,
    commands: HashMap<String, Arc<dyn Command>>,
}

/// Registry of available commands.
pub struct CommandRegistry {
    table: RwLock<Table>,
    fallback: RwLock<Arc<dyn Command>>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::default()),
            fallback: RwLock::new(Arc::new(UnknownCmd)),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    ///
    /// A replaced command keeps the listing position of the first
    /// registration under that name.
    pub fn register(&self, cmd: Box<dyn Command>) {
        let name = cmd.name().to_string();
        let cmd: Arc<dyn Command> = Arc::from(cmd);
        let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
        if table.commands.insert(name.clone(), cmd).is_some() {
            log::debug!("command '{name}' redefined");
        } else {
            table.order.push(name);
        }
    }

    /// Register a closure as a command.
    pub fn register_fn<F>(&self, name: &str, description: &str, action: F)
    where
        F: Fn(&mut Context<'_>) -> Result<Outcome> + Send + Sync + 'static,
    {
        self.register(Box::new(FnCommand {
            name: name.to_string(),
            description: description.to_string(),
            action,
        }));
    }

    /// Replace the command used when resolution finds no match.
    pub fn set_fallback(&self, cmd: Box<dyn Command>) {
        *self.fallback.write().unwrap_or_else(PoisonError::into_inner) = Arc::from(cmd);
    }

    /// The command used when resolution finds no match.
    pub fn fallback(&self) -> Arc<dyn Command> {
        let fallback = self.fallback.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*fallback)
    }

    /// Exact, case-sensitive lookup.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Command>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.commands.get(name).map(Arc::clone)
    }

    /// Whether a command is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.commands.contains_key(name)
    }

    /// Resolve a raw input line to a command.
    ///
    /// The whole trimmed line is the lookup key. Never fails: unmatched input
    /// resolves to the fallback.
    pub fn resolve(&self, line: &str) -> Arc<dyn Command> {
        self.get(line.trim()).unwrap_or_else(|| self.fallback())
    }

    /// All registered commands, in first-registration order.
    pub fn list(&self) -> Vec<Arc<dyn Command>> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table
            .order
            .iter()
            .filter_map(|name| table.commands.get(name).map(Arc::clone))
            .collect()
    }

    /// Registered names, in first-registration order.
    pub fn names(&self) -> Vec<String> {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.order.clone()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
