//! Project configuration
//!
//! `netter-setup.yaml` in the project directory is optional. Every key has a
//! default, so a missing file and an empty file behave the same.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{self, Result};

/// Configuration filename
pub const CONFIG_FILE: &str = "netter-setup.yaml";

/// Top-level provisioning configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    /// Application name; also the CMake executable name
    pub project_name: String,

    /// Build descriptor, relative to the project directory
    pub descriptor: PathBuf,

    /// CMake build directory, relative to the project directory
    pub build_dir: PathBuf,

    pub qt: QtConfig,

    pub toolchain: ToolchainConfig,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            project_name: "Netter".to_string(),
            descriptor: PathBuf::from("CMakeLists.txt"),
            build_dir: PathBuf::from("build"),
            qt: QtConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

/// Qt resolution and install settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QtConfig {
    /// Supported release line
    pub major: u64,

    /// Version used whenever the index query fails
    pub fallback_version: String,

    /// Install root passed to `aqt -O`; `~/Qt` when unset
    pub install_dir: Option<PathBuf>,

    /// Isolated installer environment; `~/.venv-qt-installer` when unset
    pub venv_dir: Option<PathBuf>,

    /// Candidate modules, kept when the index lists them
    pub modules: Vec<String>,

    /// Modules used when none of the candidates are listed
    pub fallback_modules: Vec<String>,

    /// Architecture priority on Windows, newest ABI first
    pub windows_architectures: Vec<String>,

    /// Architecture priority elsewhere
    pub unix_architectures: Vec<String>,
}

impl Default for QtConfig {
    fn default() -> Self {
        Self {
            major: 6,
            fallback_version: "6.5.3".to_string(),
            install_dir: None,
            venv_dir: None,
            modules: strings(&["qtbase", "qt5compat"]),
            fallback_modules: strings(&["qtbase", "qt5compat"]),
            windows_architectures: strings(&[
                "win64_msvc2022_64",
                "win64_msvc2019_64",
                "win64_msvc2017_64",
                "win64_msvc2015_64",
                "win64_mingw",
            ]),
            unix_architectures: strings(&["linux_gcc_64", "gcc_64"]),
        }
    }
}

/// Where to look for the Visual Studio toolchain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolchainConfig {
    pub roots: Vec<PathBuf>,
    /// Release years, preferred first
    pub versions: Vec<String>,
    /// Editions, preferred first
    pub editions: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            roots: vec![
                PathBuf::from(r"C:\Program Files\Microsoft Visual Studio"),
                PathBuf::from(r"C:\Program Files (x86)\Microsoft Visual Studio"),
            ],
            versions: strings(&["2022", "2019", "2017"]),
            editions: strings(&["Community", "Professional", "Enterprise", "BuildTools"]),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl SetupConfig {
    /// Parse configuration from YAML; `origin` names the source in errors
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| error::config::parse_failed(origin, e.to_string()))
    }

    /// Load `netter-setup.yaml` from a project directory
    ///
    /// Returns the default config if the file does not exist.
    pub fn load(project_dir: &Path) -> Result<Self> {
        let path = project_dir.join(CONFIG_FILE);

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .map_err(|e| error::config::read_failed(path.display().to_string(), e.to_string()))?;

        Self::from_yaml(&content, &path.display().to_string())
    }

    /// Qt install root, `~/Qt` by default
    pub fn qt_install_dir(&self) -> Result<PathBuf> {
        match &self.qt.install_dir {
            Some(dir) => Ok(dir.clone()),
            None => home_dir().map(|home| home.join("Qt")),
        }
    }

    /// Isolated installer environment, `~/.venv-qt-installer` by default
    pub fn venv_dir(&self) -> Result<PathBuf> {
        match &self.qt.venv_dir {
            Some(dir) => Ok(dir.clone()),
            None => home_dir().map(|home| home.join(".venv-qt-installer")),
        }
    }
}

/// The user's home directory
pub fn home_dir() -> Result<PathBuf> {
    dirs::home_dir().ok_or(crate::error::ProvisionError::HomeDirUnavailable)
}
