//! Built-in commands for the prompt.

use std::io::Write;

use prompt_types::error::Result;

use crate::interpreter::{Command, CommandRegistry, Context, Outcome};
use crate::stats::RuntimeSnapshot;

/// Register the builtin command set into a registry.
///
/// Hosts call this before adding their own commands; a host command with a
/// builtin's name replaces the builtin.
pub fn register_builtins(reg: &CommandRegistry) {
    reg.register(Box::new(HelpCmd));
    reg.register(Box::new(RuntimeCmd));
    reg.register(Box::new(GcCmd));
    reg.register(Box::new(QuitCmd));
}

// ---------------------------------------------------------------------------
// help
// ---------------------------------------------------------------------------

struct HelpCmd;
impl Command for HelpCmd {
    fn name(&self) -> &str {
        "help"
    }
    fn description(&self) -> &str {
        "well, I guess you already know."
    }
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        let width = ctx.config.name_width;
        for cmd in ctx.registry.list() {
            writeln!(ctx.out, "{:>width$} - {}", cmd.name(), cmd.description())?;
        }
        Ok(Outcome::Continue)
    }
}

// ---------------------------------------------------------------------------
// runtime
// ---------------------------------------------------------------------------

struct RuntimeCmd;
impl Command for RuntimeCmd {
    fn name(&self) -> &str {
        "runtime"
    }
    fn description(&self) -> &str {
        "display runtime information."
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        RuntimeSnapshot::capture().write_report(ctx.out)?;
        Ok(Outcome::Continue)
    }
}

// ---------------------------------------------------------------------------
// gc
// ---------------------------------------------------------------------------

struct GcCmd;
impl Command for GcCmd {
    fn name(&self) -> &str {
        "gc"
    }
    fn description(&self) -> &str {
        "call garbage collector."
    }
    fn category(&self) -> &str {
        "system"
    }
    fn execute(&self, ctx: &mut Context<'_>) -> Result<Outcome> {
        // Memory is released when its owner drops; there is no pass to run.
        writeln!(ctx.out, "GC called: no collector in this runtime, nothing to do.")?;
        Ok(Outcome::Continue)
    }
}

// ---------------------------------------------------------------------------
// quit
// ---------------------------------------------------------------------------

struct QuitCmd;
impl Command for QuitCmd {
    fn name(&self) -> &str {
        "quit"
    }
    fn description(&self) -> &str {
        "close prompt."
    }
    fn execute(&self, _ctx: &mut Context<'_>) -> Result<Outcome> {
        Ok(Outcome::Terminate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prompt_types::config::PromptConfig;

    fn setup() -> CommandRegistry {
        let reg = CommandRegistry::new();
        register_builtins(&reg);
        reg
    }

    fn exec(reg: &CommandRegistry, config: &PromptConfig, line: &str) -> (Outcome, String) {
        let mut out = Vec::new();
        let cmd = reg.resolve(line);
        let outcome = {
            let mut ctx = Context {
                input: line.trim(),
                out: &mut out,
                registry: reg,
                config,
            };
            cmd.execute(&mut ctx).unwrap()
        };
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn builtins_registered_in_order() {
        let reg = setup();
        assert_eq!(reg.names(), vec!["help", "runtime", "gc", "quit"]);
    }

    #[test]
    fn help_lists_every_command() {
        let reg = setup();
        reg.register_fn("deploy", "ship it", |_| Ok(Outcome::Continue));
        let (outcome, out) = exec(&reg, &PromptConfig::default(), "help");
        assert_eq!(outcome, Outcome::Continue);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], format!("{:>20} - well, I guess you already know.", "help"));
        assert!(lines[3].ends_with("quit - close prompt."));
        assert!(lines[4].ends_with("deploy - ship it"));
    }

    #[test]
    fn help_uses_configured_width() {
        let reg = setup();
        let config = PromptConfig {
            name_width: 4,
            ..PromptConfig::default()
        };
        let (_, out) = exec(&reg, &config, "help");
        assert!(out.lines().any(|l| l == "  gc - call garbage collector."));
    }

    #[test]
    fn runtime_reports_cpus() {
        let reg = setup();
        let (outcome, out) = exec(&reg, &PromptConfig::default(), "runtime");
        assert_eq!(outcome, Outcome::Continue);
        assert!(out.contains("Logical CPUs:"));
    }

    #[test]
    fn gc_reports_noop() {
        let reg = setup();
        let (outcome, out) = exec(&reg, &PromptConfig::default(), "gc");
        assert_eq!(outcome, Outcome::Continue);
        assert!(out.starts_with("GC called"));
    }

    #[test]
    fn quit_terminates_silently() {
        let reg = setup();
        let (outcome, out) = exec(&reg, &PromptConfig::default(), "quit");
        assert_eq!(outcome, Outcome::Terminate);
        assert!(out.is_empty());
    }

    #[test]
    fn host_can_shadow_builtin() {
        let reg = setup();
        reg.register_fn("quit", "stay forever", |_| Ok(Outcome::Continue));
        let (outcome, _) = exec(&reg, &PromptConfig::default(), "quit");
        assert_eq!(outcome, Outcome::Continue);
        assert_eq!(reg.names(), vec!["help", "runtime", "gc", "quit"]);
    }
}
