//! Demo host for the embeddable prompt.
//!
//! Starts a prompt on stdin/stdout with the builtin commands plus a few host
//! commands, keeps a background worker running while the session is open,
//! and exits once the session reports completion.
//!
//! Usage: `prompt-app [config.toml]` (or set `PROMPT_CONFIG`).

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use anyhow::{Context as _, Result};

use prompt_terminal::config::PromptConfig;
use prompt_terminal::{CommandRegistry, CountingAlloc, Outcome, Prompt, register_builtins};

#[global_allocator]
static GLOBAL: CountingAlloc = CountingAlloc;

/// Resolve the config from the first CLI arg, then `PROMPT_CONFIG`, then
/// built-in defaults.
fn resolve_config() -> Result<PromptConfig> {
    let path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("PROMPT_CONFIG").ok())
        .map(PathBuf::from);
    match path {
        Some(path) => PromptConfig::load(&path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(PromptConfig::default()),
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = resolve_config()?;
    let registry = Arc::new(CommandRegistry::new());
    if config.builtins {
        register_builtins(&registry);
    }

    let started = Instant::now();
    registry.register_fn("uptime", "show how long the prompt has been open.", move |ctx| {
        writeln!(ctx.out, "up {:.1?}", started.elapsed())?;
        Ok(Outcome::Continue)
    });

    // Background host work that runs concurrently with the session.
    let ticks = Arc::new(AtomicU64::new(0));
    let running = Arc::new(AtomicBool::new(true));
    let worker = {
        let ticks = Arc::clone(&ticks);
        let running = Arc::clone(&running);
        std::thread::Builder::new()
            .name("host-worker".to_string())
            .spawn(move || {
                while running.load(Ordering::Acquire) {
                    ticks.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(Duration::from_millis(100));
                }
            })?
    };
    {
        let ticks = Arc::clone(&ticks);
        registry.register_fn("ticks", "show the host worker's tick count.", move |ctx| {
            writeln!(ctx.out, "{} ticks", ticks.load(Ordering::Relaxed))?;
            Ok(Outcome::Continue)
        });
    }

    let prompt = Prompt::with_config(Arc::clone(&registry), config);
    let session = prompt.start()?;
    log::info!("Prompt started with {} commands", registry.len());

    let reason = session.wait()?;
    log::info!("Prompt finished ({reason})");

    running.store(false, Ordering::Release);
    if worker.join().is_err() {
        log::warn!("host worker panicked");
    }
    println!();
    println!("Session ended: {reason}. Host worker ran {} ticks.", ticks.load(Ordering::Relaxed));
    Ok(())
}
