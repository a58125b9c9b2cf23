//! Session configuration loaded from TOML.

use std::path::Path;

use serde::Deserialize;

use crate::error::{PromptError, Result};

/// Configuration for an interactive prompt session.
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PromptConfig {
    /// Marker written before every read.
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Text written once when a session starts.
    #[serde(default)]
    pub banner: Option<String>,
    /// Recover from panicking commands instead of ending the session.
    #[serde(default = "yes")]
    pub catch_panics: bool,
    /// Width of the right-aligned name column in `help`.
    #[serde(default = "default_name_width")]
    pub name_width: usize,
    /// Whether the host should register the builtin command set.
    #[serde(default = "yes")]
    pub builtins: bool,
}

fn default_prompt() -> String {
    "> ".to_string()
}
fn default_name_width() -> usize {
    20
}
fn yes() -> bool {
    true
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            banner: None,
            catch_panics: true,
            name_width: default_name_width(),
            builtins: true,
        }
    }
}

impl PromptConfig {
    /// Parse a configuration from a TOML string.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        if config.name_width > 80 {
            return Err(PromptError::Config(format!(
                "name_width {} exceeds 80 columns",
                config.name_width
            )));
        }
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&text)?;
        log::debug!("Loaded prompt config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = PromptConfig::from_toml("").unwrap();
        assert_eq!(cfg, PromptConfig::default());
        assert_eq!(cfg.prompt, "> ");
        assert_eq!(cfg.name_width, 20);
        assert!(cfg.catch_panics);
        assert!(cfg.builtins);
        assert!(cfg.banner.is_none());
    }

    #[test]
    fn fields_override_defaults() {
        let toml = r#"
            prompt = "$ "
            banner = "welcome"
            catch_panics = false
            name_width = 12
            builtins = false
        "#;
        let cfg = PromptConfig::from_toml(toml).unwrap();
        assert_eq!(cfg.prompt, "$ ");
        assert_eq!(cfg.banner.as_deref(), Some("welcome"));
        assert!(!cfg.catch_panics);
        assert_eq!(cfg.name_width, 12);
        assert!(!cfg.builtins);
    }

    #[test]
    fn oversized_name_width_rejected() {
        let err = PromptConfig::from_toml("name_width = 200").unwrap_err();
        assert!(matches!(err, PromptError::Config(_)));
    }

    #[test]
    fn wrong_type_is_parse_error() {
        let err = PromptConfig::from_toml("catch_panics = \"sometimes\"").unwrap_err();
        assert!(matches!(err, PromptError::TomlParse(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "prompt = \"prompt> \"").unwrap();
        let cfg = PromptConfig::load(file.path()).unwrap();
        assert_eq!(cfg.prompt, "prompt> ");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PromptConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, PromptError::Io(_)));
    }
}
