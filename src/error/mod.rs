//! Error types and handling for netter-setup
//!
//! Uses `thiserror` for error definitions and `miette` for pretty diagnostics.
//!
//! This module is organized into sub-modules by error domain:
//! - [`install`]: Package-manager and command execution errors
//! - [`fs`]: File system errors
//! - [`config`]: Configuration errors
//!
//! Recoverable conditions (probe negatives, query failures, a missing patch
//! anchor) are not errors at all; they are reported and replaced by fallbacks.

pub mod config;
pub mod fs;
pub mod install;
mod macros;

use macros::impl_error_constructors;

use miette::Diagnostic;
use thiserror::Error;

/// Main error type for provisioning operations
#[derive(Error, Diagnostic, Debug)]
pub enum ProvisionError {
    // Command execution errors
    #[error("Failed to run '{command}': {reason}")]
    #[diagnostic(
        code(netter_setup::exec::spawn_failed),
        help("Check that the program is installed and reachable through PATH")
    )]
    CommandFailed { command: String, reason: String },

    #[error("Installing {tool} failed: '{command}' exited with {status}")]
    #[diagnostic(
        code(netter_setup::install::failed),
        help("Run the command manually to see the package manager's output")
    )]
    InstallFailed {
        tool: String,
        command: String,
        status: String,
    },

    #[error("Fallback installation of {tool} failed: {reason}")]
    #[diagnostic(
        code(netter_setup::install::fallback_failed),
        help("Install Qt 6 manually (https://www.qt.io/download) and re-run setup")
    )]
    FallbackFailed { tool: String, reason: String },

    #[error("Could not determine the home directory")]
    #[diagnostic(code(netter_setup::install::no_home))]
    HomeDirUnavailable,

    #[error("Prompt failed: {reason}")]
    #[diagnostic(code(netter_setup::install::prompt_failed))]
    PromptFailed { reason: String },

    // Configuration errors
    #[error("Failed to read configuration file: {path}")]
    #[diagnostic(code(netter_setup::config::read_failed))]
    ConfigReadFailed { path: String, reason: String },

    #[error("Failed to parse configuration file: {path}: {reason}")]
    #[diagnostic(
        code(netter_setup::config::parse_failed),
        help("Every key in netter-setup.yaml is optional; remove unknown or mistyped keys")
    )]
    ConfigParseFailed { path: String, reason: String },

    #[error("Failed to serialize output: {reason}")]
    #[diagnostic(code(netter_setup::config::serialize_failed))]
    SerializationFailed { reason: String },

    // File system errors
    #[error("File not found: {path}")]
    #[diagnostic(code(netter_setup::fs::not_found))]
    FileNotFound { path: String },

    #[error("Failed to read file: {path}")]
    #[diagnostic(code(netter_setup::fs::read_failed))]
    FileReadFailed { path: String, reason: String },

    #[error("Failed to write file: {path}")]
    #[diagnostic(code(netter_setup::fs::write_failed))]
    FileWriteFailed { path: String, reason: String },

    #[error("IO error: {message}")]
    #[diagnostic(code(netter_setup::fs::io_error))]
    IoError { message: String },
}

impl From<std::io::Error> for ProvisionError {
    fn from(err: std::io::Error) -> Self {
        ProvisionError::IoError {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ProvisionError {
    fn from(err: serde_json::Error) -> Self {
        ProvisionError::SerializationFailed {
            reason: err.to_string(),
        }
    }
}

impl From<inquire::InquireError> for ProvisionError {
    fn from(err: inquire::InquireError) -> Self {
        ProvisionError::PromptFailed {
            reason: err.to_string(),
        }
    }
}

/// Result type alias using miette for error handling
pub type Result<T> = miette::Result<T, ProvisionError>;
