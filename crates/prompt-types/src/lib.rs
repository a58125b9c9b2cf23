//! Foundation types for the embeddable command prompt.
//!
//! Shared by every crate in the workspace: the error enum with its
//! `Result` alias, and the TOML-backed session configuration.

pub mod config;
pub mod error;
