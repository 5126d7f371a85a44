//! Qt version, architecture and module resolution
//!
//! Every stage asks the `aqt` index and falls back to a fixed default when
//! the query fails or yields nothing usable. Resolution never fails; the
//! stages that fell back are recorded in [`ResolutionResult::fallbacks`].
//!
//! ```text
//! aqt list-qt linux desktop                        -> version
//! aqt list-qt linux desktop --arch 6.8.1           -> architecture
//! aqt list-qt linux desktop --modules 6.8.1 gcc_64 -> modules
//! ```

pub mod architecture;
pub mod version;

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::config::{CONFIG_FILE, QtConfig};
use crate::error::{self, Result};
use crate::exec::{CommandOutput, CommandRunner, Invocation};
use crate::ui;

pub use architecture::ArchitectureModuleResolver;
pub use version::VersionResolver;

/// A `MAJOR.MINOR.PATCH` version, ordered numerically field by field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VersionSpec {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl VersionSpec {
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl FromStr for VersionSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.trim().split('.');
        let mut next = |label: &str| -> std::result::Result<u64, String> {
            parts
                .next()
                .ok_or_else(|| format!("missing {label} in '{s}'"))?
                .parse()
                .map_err(|_| format!("invalid {label} in '{s}'"))
        };
        let version = Self::new(next("major")?, next("minor")?, next("patch")?);
        if parts.next().is_some() {
            return Err(format!("too many components in '{s}'"));
        }
        Ok(version)
    }
}

impl fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for VersionSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Why a stage used its default
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackReason {
    /// The query could not be run
    QueryUnavailable,
    /// The query exited non-zero
    QueryFailed,
    /// The query ran but nothing recognizable came back
    ParseEmpty,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::QueryUnavailable => "query could not be run",
            Self::QueryFailed => "query failed",
            Self::ParseEmpty => "nothing recognizable in query output",
        })
    }
}

/// A resolved value and, if it is a default, the reason
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub fallback: Option<FallbackReason>,
}

impl<T> Resolved<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            fallback: None,
        }
    }

    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            fallback: Some(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}

/// Resolution stage, for fallback bookkeeping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Stage {
    Version,
    Architecture,
    Modules,
}

/// Version, architecture and modules to install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionResult {
    pub version: VersionSpec,
    pub architecture: String,
    pub modules: BTreeSet<String>,
    pub fallbacks: BTreeSet<Stage>,
}

impl ResolutionResult {
    /// Modules as `aqt --modules` arguments
    pub fn module_args(&self) -> Vec<String> {
        self.modules.iter().cloned().collect()
    }
}

/// Host name as `aqt` spells it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqtHost {
    Windows,
    Linux,
}

impl AqtHost {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Windows => "windows",
            Self::Linux => "linux",
        }
    }
}

/// The `aqt` executable used for index queries and installs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AqtIndex {
    program: String,
    host: AqtHost,
}

impl AqtIndex {
    /// `aqt` from the search path
    pub fn on_path(host: AqtHost) -> Self {
        Self {
            program: "aqt".to_string(),
            host,
        }
    }

    /// `aqt` inside an isolated installer environment
    pub fn at(program: PathBuf, host: AqtHost) -> Self {
        Self {
            program: program.display().to_string(),
            host,
        }
    }

    pub fn host(&self) -> AqtHost {
        self.host
    }

    fn list(&self) -> Invocation {
        Invocation::new(&self.program).args(["list-qt", self.host.as_str(), "desktop"])
    }

    pub fn list_versions(&self) -> Invocation {
        self.list()
    }

    pub fn list_architectures(&self, version: VersionSpec) -> Invocation {
        self.list().arg("--arch").arg(version.to_string())
    }

    pub fn list_modules(&self, version: VersionSpec, architecture: &str) -> Invocation {
        self.list()
            .arg("--modules")
            .arg(version.to_string())
            .arg(architecture)
    }

    /// `aqt install-qt <host> desktop <version> <arch> -O <dir> --modules ...`
    pub fn install(&self, resolution: &ResolutionResult, output_dir: &std::path::Path) -> Invocation {
        Invocation::new(&self.program)
            .args(["install-qt", self.host.as_str(), "desktop"])
            .arg(resolution.version.to_string())
            .arg(&resolution.architecture)
            .arg("-O")
            .arg(output_dir.display().to_string())
            .arg("--modules")
            .args(resolution.module_args())
            .inherit()
    }
}

/// Run an index query, mapping every failure to a fallback reason
pub(crate) fn query(
    runner: &dyn CommandRunner,
    invocation: &Invocation,
) -> std::result::Result<CommandOutput, FallbackReason> {
    let pb = ui::spinner(&format!("Querying {invocation}"));
    let result = runner.run(invocation);
    pb.finish_and_clear();

    match result {
        Ok(output) if output.success => Ok(output),
        Ok(output) => {
            tracing::debug!(command = %invocation, stderr = %output.stderr.trim(), "query failed");
            Err(FallbackReason::QueryFailed)
        }
        Err(e) => {
            tracing::debug!(command = %invocation, "query could not be run: {e}");
            Err(FallbackReason::QueryUnavailable)
        }
    }
}

/// Resolve version, then architecture, then modules through `index`
pub fn resolve_all(
    runner: &dyn CommandRunner,
    index: &AqtIndex,
    qt: &QtConfig,
) -> Result<ResolutionResult> {
    let default_version: VersionSpec = qt.fallback_version.parse().map_err(|e: String| {
        error::config::parse_failed(CONFIG_FILE, format!("qt.fallback_version: {e}"))
    })?;

    let mut fallbacks = BTreeSet::new();

    let version = VersionResolver::new(runner, index, qt.major, default_version).resolve_latest();
    if version.is_fallback() {
        fallbacks.insert(Stage::Version);
    }

    let arch_resolver = ArchitectureModuleResolver::new(runner, index, qt);
    let architecture = arch_resolver.resolve_architecture(version.value);
    if architecture.is_fallback() {
        fallbacks.insert(Stage::Architecture);
    }

    let modules = arch_resolver.resolve_modules(version.value, &architecture.value);
    if modules.is_fallback() {
        fallbacks.insert(Stage::Modules);
    }

    Ok(ResolutionResult {
        version: version.value,
        architecture: architecture.value,
        modules: modules.value,
        fallbacks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::ScriptedRunner;

    #[test]
    fn test_version_ordering_is_numeric() {
        let v6_9: VersionSpec = "6.9.0".parse().unwrap();
        let v6_10: VersionSpec = "6.10.0".parse().unwrap();
        assert!(v6_10 > v6_9);
        assert!("6.2.1".parse::<VersionSpec>().unwrap() < v6_9);
    }

    #[test]
    fn test_version_parse_errors() {
        assert!("6.5".parse::<VersionSpec>().is_err());
        assert!("6.5.x".parse::<VersionSpec>().is_err());
        assert!("6.5.3.1".parse::<VersionSpec>().is_err());
        assert_eq!(
            " 6.5.3 ".parse::<VersionSpec>().unwrap(),
            VersionSpec::new(6, 5, 3)
        );
    }

    #[test]
    fn test_install_invocation() {
        let resolution = ResolutionResult {
            version: VersionSpec::new(6, 8, 1),
            architecture: "gcc_64".to_string(),
            modules: ["qt5compat".to_string(), "qtbase".to_string()].into(),
            fallbacks: BTreeSet::new(),
        };
        let inv = AqtIndex::on_path(AqtHost::Linux)
            .install(&resolution, std::path::Path::new("/home/u/Qt"));
        assert_eq!(
            inv.to_string(),
            "aqt install-qt linux desktop 6.8.1 gcc_64 -O /home/u/Qt --modules qt5compat qtbase"
        );
    }

    #[test]
    fn test_resolve_all_with_dead_index_uses_every_default() {
        let runner = ScriptedRunner::new();
        let index = AqtIndex::on_path(AqtHost::Windows);
        let result = resolve_all(&runner, &index, &QtConfig::default()).unwrap();

        assert_eq!(result.version, VersionSpec::new(6, 5, 3));
        assert_eq!(result.architecture, "win64_msvc2019_64");
        assert_eq!(
            result.modules,
            ["qt5compat".to_string(), "qtbase".to_string()].into()
        );
        assert_eq!(
            result.fallbacks,
            [Stage::Version, Stage::Architecture, Stage::Modules].into()
        );
    }

    #[test]
    fn test_resolve_all_live() {
        let runner = ScriptedRunner::new()
            .reply(
                "aqt list-qt linux desktop",
                CommandOutput::ok("6.2.0 6.2.1\n6.9.0 6.9.1\n6.10.0\n"),
            )
            .reply(
                "aqt list-qt linux desktop --arch 6.10.0",
                CommandOutput::ok("linux_gcc_64 wasm_singlethread\n"),
            )
            .reply(
                "aqt list-qt linux desktop --modules 6.10.0 linux_gcc_64",
                CommandOutput::ok("qt3d qt5compat qtcharts\n"),
            );
        let index = AqtIndex::on_path(AqtHost::Linux);
        let result = resolve_all(&runner, &index, &QtConfig::default()).unwrap();

        assert_eq!(result.version.to_string(), "6.10.0");
        assert_eq!(result.architecture, "linux_gcc_64");
        assert_eq!(result.modules, ["qt5compat".to_string()].into());
        assert!(result.fallbacks.is_empty());
    }

    #[test]
    fn test_resolution_serializes_version_as_string() {
        let result = ResolutionResult {
            version: VersionSpec::new(6, 5, 3),
            architecture: "gcc_64".to_string(),
            modules: ["qtbase".to_string()].into(),
            fallbacks: [Stage::Version].into(),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["version"], "6.5.3");
        assert_eq!(json["fallbacks"][0], "version");
    }

    #[test]
    fn test_bad_fallback_version_is_config_error() {
        let qt = QtConfig {
            fallback_version: "six".to_string(),
            ..QtConfig::default()
        };
        let runner = ScriptedRunner::new();
        let err = resolve_all(&runner, &AqtIndex::on_path(AqtHost::Linux), &qt).unwrap_err();
        assert!(err.to_string().contains(CONFIG_FILE));
    }
}
