//! Command helper utilities

use std::path::PathBuf;

use crate::config::SetupConfig;
use crate::error::{self, Result};
use crate::script::ScriptPlatform;
use crate::toolchain::ToolchainLocator;

/// Resolve the project directory from the optional argument
///
/// Defaults to the current directory. The path is canonicalized without
/// Windows verbatim prefixes so it can be embedded in scripts.
pub fn project_dir(project: Option<PathBuf>) -> Result<PathBuf> {
    let dir = match project {
        Some(path) => path,
        None => std::env::current_dir()?,
    };
    dunce::canonicalize(&dir).map_err(|_| error::fs::not_found(dir.display().to_string()))
}

/// Project directory and its configuration
pub fn load(project: Option<PathBuf>) -> Result<(PathBuf, SetupConfig)> {
    let dir = project_dir(project)?;
    let config = SetupConfig::load(&dir)?;
    Ok((dir, config))
}

/// MSVC activation script for the generated Windows launcher
pub fn activation_script(platform: ScriptPlatform, config: &SetupConfig) -> Option<PathBuf> {
    match platform {
        ScriptPlatform::Windows => ToolchainLocator::new(&config.toolchain)
            .locate()
            .map(|install| install.activation_script),
        ScriptPlatform::Unix => None,
    }
}
