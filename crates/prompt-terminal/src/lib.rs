//! Embeddable interactive command prompt.
//!
//! The prompt is a registry-based dispatch system. Commands implement the
//! `Command` trait (or are plain closures) and are registered by name. A
//! session reads lines on its own thread, resolves each trimmed line to a
//! command, runs it, and reports completion through a one-shot handle.

// Re-exports from prompt-types (errors and configuration).
pub use prompt_types::config;
pub use prompt_types::error;

mod commands;
mod interpreter;
mod session;
pub mod stats;

/// Register the builtin commands (help, runtime, gc, quit) into a registry.
pub use commands::register_builtins;
/// A single executable command trait.
pub use interpreter::Command;
/// Registry of available commands with fallback resolution.
pub use interpreter::CommandRegistry;
/// Per-invocation state passed to every command.
pub use interpreter::Context;
/// Whether the session continues after a command.
pub use interpreter::Outcome;
/// Why a session stopped.
pub use session::ExitReason;
/// A prompt bound to a shared registry.
pub use session::Prompt;
/// One-shot completion handle for a running session.
pub use session::SessionHandle;
/// Allocation-counting global allocator for the `runtime` command.
pub use stats::CountingAlloc;
