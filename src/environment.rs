//! Environment snapshots, deltas and vendor activation scripts
//!
//! The process environment is never written piecemeal. Activation results,
//! compiler directories and Qt bin directories are collected in an
//! [`EnvironmentDelta`] held by [`Environment`], and the run applies that
//! delta to the process exactly once via [`EnvironmentDelta::apply`].
//!
//! Only the allow-listed variables ([`ALLOWED_VARIABLES`]) can enter a delta.
//! Everything else an activation script exports is discarded.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::exec::{CommandRunner, Invocation};
use crate::probe;
use crate::ui;

/// Variables allowed to cross from an activation result into the process
pub const ALLOWED_VARIABLES: [&str; 4] = ["PATH", "INCLUDE", "LIB", "LIBPATH"];

/// Canonical allow-list spelling for `name`, if it is allowed at all.
/// Windows reports `Path`, so matching ignores case.
fn allowed_name(name: &str) -> Option<&'static str> {
    ALLOWED_VARIABLES
        .iter()
        .copied()
        .find(|allowed| allowed.eq_ignore_ascii_case(name))
}

/// Variable name to value, captured at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSnapshot {
    vars: BTreeMap<String, String>,
}

impl EnvironmentSnapshot {
    /// Capture the current process environment
    pub fn capture() -> Self {
        std::env::vars_os()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().into_owned(),
                    v.to_string_lossy().into_owned(),
                )
            })
            .collect()
    }

    /// Parse `NAME=VALUE` lines as printed by `set` or `env`.
    ///
    /// Lines without `=` and lines with an empty name (cmd's `=C:=C:\`) are
    /// skipped. The value is everything after the first `=`.
    pub fn parse(output: &str) -> Self {
        output
            .lines()
            .filter_map(|line| {
                let line = line.trim_end_matches('\r');
                let (name, value) = line.split_once('=')?;
                if name.is_empty() || name.contains(char::is_whitespace) {
                    return None;
                }
                Some((name.to_string(), value.to_string()))
            })
            .collect()
    }

    /// Look up a variable, falling back to a case-insensitive match
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str).or_else(|| {
            self.vars
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Allow-listed variables whose value in `after` is new or different
    pub fn diff(&self, after: &EnvironmentSnapshot) -> EnvironmentDelta {
        let mut delta = EnvironmentDelta::default();
        for (name, value) in &after.vars {
            if self.get(name) == Some(value.as_str()) {
                continue;
            }
            if !delta.set(name, value.clone()) {
                tracing::debug!(variable = %name, "discarding variable outside the allow-list");
            }
        }
        delta
    }
}

impl FromIterator<(String, String)> for EnvironmentSnapshot {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

/// Pending changes to allow-listed variables
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentDelta {
    vars: BTreeMap<&'static str, String>,
}

impl EnvironmentDelta {
    /// Record a new value. Returns `false` (and records nothing) for names
    /// outside the allow-list.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> bool {
        match allowed_name(name) {
            Some(canonical) => {
                self.vars.insert(canonical, value.into());
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        allowed_name(name).and_then(|n| self.vars.get(n).map(String::as_str))
    }

    /// Later values win
    pub fn merge(&mut self, other: EnvironmentDelta) {
        self.vars.extend(other.vars);
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.vars.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Write the delta into the current process environment.
    ///
    /// This is the only place the process environment is modified.
    pub fn apply(self) {
        for (name, value) in self.vars {
            tracing::debug!(variable = name, "updating process environment");
            // SAFETY: provisioning is single-threaded; no other thread reads
            // or writes the environment while the delta is applied.
            unsafe { std::env::set_var(name, value) };
        }
    }
}

/// The process environment as seen by the rest of the run: a base snapshot
/// overlaid with the changes that will be applied at the end
#[derive(Debug, Clone, Default)]
pub struct Environment {
    base: EnvironmentSnapshot,
    pending: EnvironmentDelta,
}

impl Environment {
    /// Start from the current process environment
    pub fn current() -> Self {
        Self::from_snapshot(EnvironmentSnapshot::capture())
    }

    pub fn from_snapshot(base: EnvironmentSnapshot) -> Self {
        Self {
            base,
            pending: EnvironmentDelta::default(),
        }
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.pending.get(name).or_else(|| self.base.get(name))
    }

    /// The effective environment as a snapshot, for diffing
    pub fn snapshot(&self) -> EnvironmentSnapshot {
        let mut vars = self.base.vars.clone();
        for (name, value) in &self.pending.vars {
            vars.retain(|k, _| !k.eq_ignore_ascii_case(name));
            vars.insert((*name).to_string(), value.clone());
        }
        EnvironmentSnapshot { vars }
    }

    pub fn merge(&mut self, delta: EnvironmentDelta) {
        self.pending.merge(delta);
    }

    /// Add `dir` to the end of `PATH`; no-op if it is already listed
    pub fn append_path(&mut self, dir: &Path) {
        self.edit_path(dir, false);
    }

    /// Add `dir` to the front of `PATH`; no-op if it is already listed
    pub fn prepend_path(&mut self, dir: &Path) {
        self.edit_path(dir, true);
    }

    fn edit_path(&mut self, dir: &Path, front: bool) {
        let current = self.var("PATH").map(OsString::from).unwrap_or_default();
        let mut entries: Vec<PathBuf> = std::env::split_paths(&current)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if entries.iter().any(|e| e == dir) {
            return;
        }
        if front {
            entries.insert(0, dir.to_path_buf());
        } else {
            entries.push(dir.to_path_buf());
        }
        match std::env::join_paths(entries) {
            Ok(joined) => {
                self.pending.set("PATH", joined.to_string_lossy().into_owned());
            }
            Err(e) => tracing::warn!(dir = %dir.display(), "cannot add directory to PATH: {e}"),
        }
    }

    /// Hand the accumulated changes to the caller for the final merge
    pub fn into_delta(self) -> EnvironmentDelta {
        self.pending
    }
}

/// How a vendor script is sourced and the resulting environment dumped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationShell {
    /// `cmd /C call "script" arch && set`
    Cmd,
    /// `sh -c '. script arch && env'`
    #[cfg(test)]
    Posix,
}

impl ActivationShell {
    fn invocation(self, script: &Path, arch: &str) -> Invocation {
        match self {
            Self::Cmd => Invocation::new("cmd")
                .arg("/C")
                .arg(format!("call \"{}\" {arch} && set", script.display()))
                .verbatim(),
            #[cfg(test)]
            Self::Posix => Invocation::new("sh")
                .arg("-c")
                .arg(r#". "$0" "$1" >/dev/null && env"#)
                .arg(script.display().to_string())
                .arg(arch),
        }
    }
}

/// Architecture argument for the activation script
pub fn host_arch() -> &'static str {
    if cfg!(target_pointer_width = "64") {
        "x64"
    } else {
        "x86"
    }
}

/// Outcome of a successful activation script run
#[derive(Debug, Clone, Default)]
pub struct Activation {
    /// Allow-listed changes, not yet applied
    pub delta: EnvironmentDelta,
    /// The compiler, if reachable with the delta applied
    pub compiler: Option<PathBuf>,
}

/// Runs a vendor activation script and extracts the allow-listed changes
pub struct EnvironmentActivator<'a> {
    runner: &'a dyn CommandRunner,
    shell: ActivationShell,
    compiler: &'a str,
}

impl<'a> EnvironmentActivator<'a> {
    pub fn new(runner: &'a dyn CommandRunner, shell: ActivationShell, compiler: &'a str) -> Self {
        Self {
            runner,
            shell,
            compiler,
        }
    }

    /// Run `script` for `arch` and diff the result against `env`.
    ///
    /// Returns `None` when the script cannot be run or exits non-zero. When
    /// the compiler is still unreachable afterwards, `toolchain_root` is
    /// searched for it and its directory is put in front of `PATH`.
    pub fn activate(
        &self,
        script: &Path,
        arch: &str,
        toolchain_root: &Path,
        env: &Environment,
    ) -> Option<Activation> {
        let invocation = self.shell.invocation(script, arch);
        let output = match self.runner.run(&invocation) {
            Ok(output) => output,
            Err(e) => {
                ui::warn(&format!("Error running {}: {e}", script.display()));
                return None;
            }
        };
        if !output.success {
            ui::warn(&format!(
                "Error running {}: {}",
                script.display(),
                output.stderr.trim()
            ));
            return None;
        }

        let after = EnvironmentSnapshot::parse(&output.stdout);
        let before = env.snapshot();
        tracing::debug!(variables = after.len(), "activation script finished");

        let mut activated = env.clone();
        activated.merge(before.diff(&after));
        ui::info("Compiler environment variables captured");

        let mut compiler = probe::find_in(self.compiler, &activated);
        if compiler.is_none() {
            ui::warn(&format!(
                "Could not find {} even after activation, scanning {}",
                self.compiler,
                toolchain_root.display()
            ));
            compiler = scan_for_executable(toolchain_root, self.compiler);
            if let Some(found) = &compiler {
                if let Some(dir) = found.parent() {
                    activated.prepend_path(dir);
                    ui::info(&format!("Added to PATH: {}", dir.display()));
                }
            }
        }

        Some(Activation {
            delta: activated.into_delta(),
            compiler,
        })
    }
}

/// First file named like the executable under `root`, depth-first
fn scan_for_executable(root: &Path, name: &str) -> Option<PathBuf> {
    let file_name = probe::executable_file_name(name);
    let mut matches = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == file_name.as_str())
        .map(walkdir::DirEntry::into_path);

    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        tracing::warn!(
            chosen = %first.display(),
            others,
            "several {file_name} found, using the first"
        );
    }
    Some(first)
}
