//! Command and toolchain presence checks

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::environment::Environment;
use crate::exec::{CommandRunner, Invocation};
use crate::resolve::VersionSpec;

/// A tool the build pipeline needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Tool {
    Compiler,
    BuildGenerator,
    BuildRunner,
    GuiRuntime,
}

impl Tool {
    /// Install order: the compiler first, the GUI runtime last
    pub const ALL: [Tool; 4] = [
        Tool::Compiler,
        Tool::BuildGenerator,
        Tool::BuildRunner,
        Tool::GuiRuntime,
    ];
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Compiler => "C++ compiler",
            Tool::BuildGenerator => "CMake",
            Tool::BuildRunner => "Ninja",
            Tool::GuiRuntime => "Qt",
        };
        f.write_str(name)
    }
}

/// Presence of one tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainStatus {
    pub tool: Tool,
    pub present: bool,
    pub resolved_path: Option<PathBuf>,
    /// Extra detail, e.g. the installed Qt version
    pub detail: Option<String>,
}

impl ToolchainStatus {
    pub fn absent(tool: Tool) -> Self {
        Self {
            tool,
            present: false,
            resolved_path: None,
            detail: None,
        }
    }

    pub fn found(tool: Tool, path: PathBuf) -> Self {
        Self {
            tool,
            present: true,
            resolved_path: Some(path),
            detail: None,
        }
    }
}

/// `name` with the platform's executable suffix (`cl` -> `cl.exe`)
pub fn executable_file_name(name: &str) -> String {
    format!("{name}{}", std::env::consts::EXE_SUFFIX)
}

/// Resolve `name` against the search path of `env`
pub fn find_in(name: &str, env: &Environment) -> Option<PathBuf> {
    let cwd = std::env::current_dir().unwrap_or_default();
    let found = which::which_in(name, env.var("PATH"), cwd).ok();
    tracing::debug!(command = name, found = ?found, "probe");
    found
}

/// Whether `name` is reachable through `env`'s search path
pub fn probe(name: &str, env: &Environment) -> bool {
    find_in(name, env).is_some()
}

/// Status of an ordinary tool: a plain search-path lookup
pub fn probe_tool(tool: Tool, executable: &str, env: &Environment) -> ToolchainStatus {
    match find_in(executable, env) {
        Some(path) => ToolchainStatus::found(tool, path),
        None => ToolchainStatus::absent(tool),
    }
}

/// Qt version reported by `qmake6 -v` or `qmake -v`, if it is on the
/// supported release line
pub fn installed_qt(runner: &dyn CommandRunner, major: u64) -> Option<VersionSpec> {
    for qmake in ["qmake6", "qmake"] {
        let Ok(output) = runner.run(&Invocation::new(qmake).arg("-v")) else {
            continue;
        };
        if !output.success {
            continue;
        }
        if let Some(version) = parse_qmake_version(&output.stdout) {
            if version.major == major {
                return Some(version);
            }
        }
    }
    None
}

/// Extract `X.Y.Z` from the `Using Qt version X.Y.Z in ...` line
fn parse_qmake_version(output: &str) -> Option<VersionSpec> {
    output
        .lines()
        .find_map(|line| line.split_once("Qt version").map(|(_, rest)| rest))
        .and_then(|rest| rest.split_whitespace().next())
        .and_then(|token| token.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvironmentSnapshot;
    use crate::exec::CommandOutput;
    use crate::exec::testing::ScriptedRunner;
    use tempfile::TempDir;

    fn env_with_path(dir: &std::path::Path) -> Environment {
        Environment::from_snapshot(
            [("PATH".to_string(), dir.display().to_string())]
                .into_iter()
                .collect::<EnvironmentSnapshot>(),
        )
    }

    #[cfg(unix)]
    fn make_executable(path: &std::path::Path) {
        use std::os::unix::fs::PermissionsExt;
        std::fs::write(path, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_probe_finds_executable_on_search_path() {
        let temp = TempDir::new().unwrap();
        make_executable(&temp.path().join("ninja"));

        let env = env_with_path(temp.path());
        assert!(probe("ninja", &env));
        assert!(!probe("cmake", &env));

        let status = probe_tool(Tool::BuildRunner, "ninja", &env);
        assert!(status.present);
        assert_eq!(status.resolved_path, Some(temp.path().join("ninja")));
    }

    #[test]
    fn test_probe_ignores_process_path() {
        let temp = TempDir::new().unwrap();
        let env = env_with_path(temp.path());
        assert!(!probe("definitely-not-installed-4711", &env));
    }

    #[test]
    fn test_installed_qt_prefers_qmake6() {
        let runner = ScriptedRunner::new().reply(
            "qmake6 -v",
            CommandOutput::ok(
                "QMake version 3.1\nUsing Qt version 6.7.2 in /usr/lib/x86_64-linux-gnu\n",
            ),
        );
        assert_eq!(installed_qt(&runner, 6), Some("6.7.2".parse().unwrap()));
        assert!(!runner.called("qmake -v"));
    }

    #[test]
    fn test_installed_qt_rejects_other_major() {
        let runner = ScriptedRunner::new()
            .reply("qmake6 -v", CommandOutput::failed(127, "not found"))
            .reply(
                "qmake -v",
                CommandOutput::ok("QMake version 3.1\nUsing Qt version 5.15.2 in /usr/lib\n"),
            );
        assert_eq!(installed_qt(&runner, 6), None);
    }

    #[test]
    fn test_tool_display() {
        assert_eq!(Tool::GuiRuntime.to_string(), "Qt");
        assert_eq!(Tool::BuildGenerator.to_string(), "CMake");
    }
}
