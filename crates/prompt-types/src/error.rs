//! Error types for the prompt.

use std::io;

/// Errors produced by the prompt framework.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    #[error("command error: {0}")]
    Command(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, PromptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_error_display() {
        let e = PromptError::Command("bad input".into());
        assert_eq!(format!("{e}"), "command error: bad input");
    }

    #[test]
    fn config_error_display() {
        let e = PromptError::Config("missing key".into());
        assert_eq!(format!("{e}"), "config error: missing key");
    }

    #[test]
    fn session_error_display() {
        let e = PromptError::Session("loop thread panicked".into());
        assert_eq!(format!("{e}"), "session error: loop thread panicked");
    }

    #[test]
    fn io_error_from_conversion() {
        let io_err = io::Error::new(io::ErrorKind::BrokenPipe, "closed");
        let e: PromptError = io_err.into();
        let msg = format!("{e}");
        assert!(msg.contains("I/O error"));
        assert!(msg.contains("closed"));
    }

    #[test]
    fn toml_error_from_conversion() {
        let toml_err = toml::from_str::<toml::Value>("prompt = [[[").unwrap_err();
        let e: PromptError = toml_err.into();
        assert!(format!("{e}").contains("TOML parse error"));
    }

    #[test]
    fn error_is_debug() {
        let e = PromptError::Session("x".into());
        assert!(format!("{e:?}").contains("Session"));
    }
}
