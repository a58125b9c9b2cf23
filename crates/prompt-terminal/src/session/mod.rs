//! Dispatch loop and host synchronization.
//!
//! A [`Prompt`] binds a shared [`CommandRegistry`] to a configuration.
//! [`Prompt::start`] runs the read-resolve-execute loop on its own thread and
//! returns a [`SessionHandle`]. The loop sends exactly one [`ExitReason`] on
//! the handle's channel when it stops, whichever way it stops.

use std::fmt;
use std::io::{self, BufRead, BufReader, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError};
use std::thread::{self, JoinHandle};

use prompt_types::config::PromptConfig;
use prompt_types::error::{PromptError, Result};

use crate::interpreter::{CommandRegistry, Context, Outcome};

/// Why a session stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// A command returned [`Outcome::Terminate`].
    Quit,
    /// The input stream ended.
    Eof,
    /// Reading the input stream failed.
    ReadError,
    /// [`SessionHandle::cancel`] was observed between commands.
    Cancelled,
    /// A command panicked while panic recovery was disabled.
    Aborted,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Quit => "quit",
            Self::Eof => "end of input",
            Self::ReadError => "read error",
            Self::Cancelled => "cancelled",
            Self::Aborted => "aborted by panicking command",
        };
        f.write_str(s)
    }
}

/// An interactive prompt bound to a registry.
#[derive(Clone)]
pub struct Prompt {
    registry: Arc<CommandRegistry>,
    config: PromptConfig,
}

impl Prompt {
    /// Create a prompt with default configuration.
    pub fn new(registry: Arc<CommandRegistry>) -> Self {
        Self::with_config(registry, PromptConfig::default())
    }

    /// Create a prompt with the given configuration.
    pub fn with_config(registry: Arc<CommandRegistry>, config: PromptConfig) -> Self {
        Self { registry, config }
    }

    /// The shared registry. Commands registered here are visible to running
    /// sessions on their next line.
    pub fn registry(&self) -> &Arc<CommandRegistry> {
        &self.registry
    }

    /// Configuration the prompt's sessions run with.
    pub fn config(&self) -> &PromptConfig {
        &self.config
    }

    /// Start a session on stdin/stdout.
    pub fn start(&self) -> Result<SessionHandle> {
        self.start_with(BufReader::new(io::stdin()), io::stdout())
    }

    /// Start a session on arbitrary streams.
    ///
    /// Returns as soon as the loop thread is spawned.
    pub fn start_with<R, W>(&self, input: R, output: W) -> Result<SessionHandle>
    where
        R: BufRead + Send + 'static,
        W: Write + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let session = self.clone();

        let thread = thread::Builder::new()
            .name("prompt-session".to_string())
            .spawn(move || session.run_and_notify(input, output, &flag, &tx))?;

        Ok(SessionHandle {
            rx,
            thread: Some(thread),
            cancel,
            reason: None,
            delivered: false,
        })
    }

    fn run_and_notify<R: BufRead, W: Write>(
        &self,
        input: R,
        output: W,
        cancel: &AtomicBool,
        tx: &SyncSender<ExitReason>,
    ) {
        let reason = panic::catch_unwind(AssertUnwindSafe(|| {
            self.run_until(input, output, cancel)
        }))
        .unwrap_or_else(|_| {
            log::error!("prompt session aborted by a panicking command");
            ExitReason::Aborted
        });
        // Capacity 1 and a single send: never blocks. A dropped handle is fine.
        if tx.send(reason).is_err() {
            log::debug!("session handle dropped before completion ({reason})");
        }
    }

    /// Run the loop on the calling thread until it stops.
    pub fn run<R: BufRead, W: Write>(&self, input: R, output: W) -> ExitReason {
        self.run_until(input, output, &AtomicBool::new(false))
    }

    fn run_until<R: BufRead, W: Write>(
        &self,
        mut input: R,
        mut output: W,
        cancel: &AtomicBool,
    ) -> ExitReason {
        log::debug!("prompt session started");
        if let Some(banner) = &self.config.banner {
            if let Err(e) = writeln!(output, "{banner}") {
                log::warn!("writing banner: {e}");
            }
        }

        // Lines are bytes; invalid UTF-8 is replaced, never a read failure.
        let mut buf = Vec::new();
        let reason = loop {
            if cancel.load(Ordering::Acquire) {
                break ExitReason::Cancelled;
            }

            // Output failures are not a stop condition; only input ends a session.
            if let Err(e) = write_prompt(&mut output, &self.config.prompt) {
                log::warn!("writing prompt: {e}");
            }

            buf.clear();
            match input.read_until(b'\n', &mut buf) {
                Ok(0) => break ExitReason::Eof,
                Ok(_) => {},
                Err(e) => {
                    eprintln!("reading standard input: {e}");
                    log::error!("reading standard input: {e}");
                    break ExitReason::ReadError;
                },
            }

            let line = String::from_utf8_lossy(&buf);
            if self.dispatch(&line, &mut output) == Outcome::Terminate {
                break ExitReason::Quit;
            }
        };
        let _ = output.flush();
        log::debug!("prompt session finished: {reason}");
        reason
    }

    /// Resolve and execute one line. Command failures are reported on `out`
    /// and never end the session.
    fn dispatch(&self, line: &str, out: &mut dyn Write) -> Outcome {
        let command = self.registry.resolve(line);
        let mut ctx = Context {
            input: line.trim(),
            out,
            registry: &self.registry,
            config: &self.config,
        };

        let result = if self.config.catch_panics {
            match panic::catch_unwind(AssertUnwindSafe(|| command.execute(&mut ctx))) {
                Ok(result) => result,
                Err(payload) => {
                    let msg = panic_message(payload.as_ref());
                    log::error!("command '{}' panicked: {msg}", command.name());
                    let _ = writeln!(ctx.out, "error: command '{}' panicked: {msg}", command.name());
                    return Outcome::Continue;
                },
            }
        } else {
            command.execute(&mut ctx)
        };

        match result {
            Ok(outcome) => outcome,
            Err(e) => {
                log::warn!("command '{}' failed: {e}", command.name());
                let _ = writeln!(ctx.out, "error: {e}");
                Outcome::Continue
            },
        }
    }
}

fn write_prompt<W: Write>(out: &mut W, prompt: &str) -> io::Result<()> {
    out.write_all(prompt.as_bytes())?;
    out.flush()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// One-shot completion handle for a running session.
pub struct SessionHandle {
    rx: Receiver<ExitReason>,
    thread: Option<JoinHandle<()>>,
    cancel: Arc<AtomicBool>,
    /// Reason observed by `try_wait`, kept for `wait`.
    reason: Option<ExitReason>,
    delivered: bool,
}

impl SessionHandle {
    /// Ask the loop to stop before its next prompt.
    ///
    /// A read that is already blocked is not interrupted; close the input to
    /// unblock it.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether the loop thread has exited.
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Poll for completion without blocking.
    ///
    /// Returns `Some` at most once over the handle's lifetime.
    pub fn try_wait(&mut self) -> Option<ExitReason> {
        if self.delivered {
            return None;
        }
        match self.rx.try_recv() {
            Ok(reason) => {
                self.delivered = true;
                self.reason = Some(reason);
                Some(reason)
            },
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Block until the session has fully stopped.
    pub fn wait(mut self) -> Result<ExitReason> {
        let reason = match self.reason.take() {
            Some(reason) => reason,
            None => self.rx.recv().map_err(|_| {
                PromptError::Session("session ended without reporting completion".to_string())
            })?,
        };
        if let Some(thread) = self.thread.take() {
            thread
                .join()
                .map_err(|_| PromptError::Session("session thread panicked".to_string()))?;
        }
        Ok(reason)
    }
}
