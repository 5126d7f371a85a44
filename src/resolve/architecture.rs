//! Architecture and module selection for a resolved Qt version

use std::collections::BTreeSet;

use super::{AqtHost, AqtIndex, FallbackReason, Resolved, VersionSpec, query};
use crate::config::QtConfig;
use crate::exec::CommandRunner;
use crate::ui;

/// Default architecture when nothing in the priority list is available
pub fn default_architecture(host: AqtHost) -> &'static str {
    match host {
        AqtHost::Windows => "win64_msvc2019_64",
        AqtHost::Linux => "gcc_64",
    }
}

const BUILTIN_MODULES: [&str; 2] = ["qtbase", "qt5compat"];

/// Selects an architecture by priority and the available modules
pub struct ArchitectureModuleResolver<'a> {
    runner: &'a dyn CommandRunner,
    index: &'a AqtIndex,
    qt: &'a QtConfig,
}

impl<'a> ArchitectureModuleResolver<'a> {
    pub fn new(runner: &'a dyn CommandRunner, index: &'a AqtIndex, qt: &'a QtConfig) -> Self {
        Self { runner, index, qt }
    }

    fn priority(&self) -> &[String] {
        match self.index.host() {
            AqtHost::Windows => &self.qt.windows_architectures,
            AqtHost::Linux => &self.qt.unix_architectures,
        }
    }

    pub fn resolve_architecture(&self, version: VersionSpec) -> Resolved<String> {
        ui::info(&format!(
            "Determining available architecture for Qt {version}..."
        ));
        let default = default_architecture(self.index.host()).to_string();

        let output = match query(self.runner, &self.index.list_architectures(version)) {
            Ok(output) => output,
            Err(reason) => {
                ui::warn(&format!(
                    "Failed to get list of architectures ({reason}). Using {default} by default."
                ));
                return Resolved::fallback(default, reason);
            }
        };

        match select_architecture(&output.stdout, self.priority()) {
            Some(arch) => Resolved::live(arch),
            None => {
                ui::warn(&format!(
                    "Could not find a suitable architecture. Using {default} by default."
                ));
                Resolved::fallback(default, FallbackReason::ParseEmpty)
            }
        }
    }

    /// Candidate modules the index lists; never empty
    pub fn resolve_modules(
        &self,
        version: VersionSpec,
        architecture: &str,
    ) -> Resolved<BTreeSet<String>> {
        ui::info(&format!(
            "Determining available modules for Qt {version} ({architecture})..."
        ));

        let output = match query(self.runner, &self.index.list_modules(version, architecture)) {
            Ok(output) => output,
            Err(reason) => {
                ui::warn(&format!(
                    "Failed to get list of modules ({reason}). Using basic modules."
                ));
                return Resolved::fallback(self.default_modules(), reason);
            }
        };

        let modules = select_modules(&output.stdout, &self.qt.modules);
        if modules.is_empty() {
            ui::warn("Could not determine modules. Using basic modules.");
            return Resolved::fallback(self.default_modules(), FallbackReason::ParseEmpty);
        }
        Resolved::live(modules)
    }

    fn default_modules(&self) -> BTreeSet<String> {
        let configured: BTreeSet<String> = self.qt.fallback_modules.iter().cloned().collect();
        if configured.is_empty() {
            BUILTIN_MODULES.iter().map(|m| (*m).to_string()).collect()
        } else {
            configured
        }
    }
}

/// First entry of `priority` that appears as a token in `output`
pub fn select_architecture(output: &str, priority: &[String]) -> Option<String> {
    let listed: BTreeSet<&str> = output.split_whitespace().collect();
    priority
        .iter()
        .find(|arch| listed.contains(arch.as_str()))
        .cloned()
}

/// Candidates occurring (case-insensitively) anywhere in `output`
pub fn select_modules(output: &str, candidates: &[String]) -> BTreeSet<String> {
    let haystack = output.to_lowercase();
    candidates
        .iter()
        .filter(|m| haystack.contains(&m.to_lowercase()))
        .cloned()
        .collect()
}

/// Directory `aqt` installs an architecture into, below `<root>/<version>/`
pub fn aqt_install_dir(architecture: &str) -> String {
    let stripped = ["win64_", "win32_", "linux_"]
        .iter()
        .find_map(|prefix| architecture.strip_prefix(prefix))
        .unwrap_or(architecture);

    match stripped {
        "mingw" => "mingw_64".to_string(),
        other => other.to_string(),
    }
}
