//! Visual Studio toolchain discovery
//!
//! Looks under the known install roots for `<root>/<year>/<edition>` and then
//! for `vcvarsall.bat` inside that edition. When the usual locations are
//! empty the edition directory is walked depth-first and the first match is
//! taken.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::config::ToolchainConfig;

/// Activation script name
pub const ACTIVATION_SCRIPT: &str = "vcvarsall.bat";

/// A located toolchain installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainInstall {
    /// Edition directory, e.g. `.../2022/Community`
    pub root: PathBuf,
    pub activation_script: PathBuf,
}

/// Scans the configured install roots
pub struct ToolchainLocator<'a> {
    config: &'a ToolchainConfig,
}

impl<'a> ToolchainLocator<'a> {
    pub fn new(config: &'a ToolchainConfig) -> Self {
        Self { config }
    }

    /// First edition directory in preference order across all roots
    pub fn find_installation(&self) -> Option<PathBuf> {
        self.config
            .roots
            .iter()
            .filter(|root| root.is_dir())
            .find_map(|root| self.find_in_root(root))
    }

    fn find_in_root(&self, root: &Path) -> Option<PathBuf> {
        let years = subdirectories(root);
        if years.is_empty() {
            return None;
        }

        // A year is only taken if one of the editions exists below it
        self.config
            .versions
            .iter()
            .filter(|year| years.iter().any(|y| y == *year))
            .find_map(|year| {
                self.config
                    .editions
                    .iter()
                    .map(|edition| root.join(year).join(edition))
                    .find(|path| path.is_dir())
            })
    }

    /// Installation root and activation script, if any
    pub fn locate(&self) -> Option<ToolchainInstall> {
        let root = self.find_installation()?;
        tracing::debug!(root = %root.display(), "toolchain installation");

        let candidates = [
            root.join("VC").join("Auxiliary").join("Build").join(ACTIVATION_SCRIPT),
            root.join("VC").join(ACTIVATION_SCRIPT),
        ];
        let script = candidates
            .into_iter()
            .find(|c| c.is_file())
            .or_else(|| walk_for(&root, ACTIVATION_SCRIPT))?;

        Some(ToolchainInstall {
            root,
            activation_script: script,
        })
    }
}

fn subdirectories(dir: &Path) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    entries
        .filter_map(std::result::Result::ok)
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect()
}

/// First file called `name` below `root`, depth-first in name order
fn walk_for(root: &Path, name: &str) -> Option<PathBuf> {
    let mut matches = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().is_file() && e.file_name() == name)
        .map(walkdir::DirEntry::into_path);

    let first = matches.next()?;
    let others = matches.count();
    if others > 0 {
        tracing::warn!(
            chosen = %first.display(),
            others,
            "several {name} found below {}, using the first",
            root.display()
        );
    }
    Some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "@echo off\n").unwrap();
    }

    fn config(roots: Vec<PathBuf>) -> ToolchainConfig {
        ToolchainConfig {
            roots,
            ..ToolchainConfig::default()
        }
    }

    #[test]
    fn test_locate_standard_layout() {
        let temp = TempDir::new().unwrap();
        let script = temp
            .path()
            .join("2022/Community/VC/Auxiliary/Build/vcvarsall.bat");
        touch(&script);

        let cfg = config(vec![temp.path().to_path_buf()]);
        let install = ToolchainLocator::new(&cfg).locate().unwrap();
        assert_eq!(install.root, temp.path().join("2022/Community"));
        assert_eq!(install.activation_script, script);
    }

    #[test]
    fn test_newest_year_wins() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("2019/Enterprise/VC/vcvarsall.bat"));
        touch(&temp.path().join("2022/Professional/VC/vcvarsall.bat"));

        let cfg = config(vec![temp.path().to_path_buf()]);
        let install = ToolchainLocator::new(&cfg).locate().unwrap();
        assert_eq!(install.root, temp.path().join("2022/Professional"));
    }

    #[test]
    fn test_edition_preference() {
        let temp = TempDir::new().unwrap();
        touch(&temp.path().join("2022/Enterprise/VC/vcvarsall.bat"));
        touch(&temp.path().join("2022/Community/VC/vcvarsall.bat"));

        let cfg = config(vec![temp.path().to_path_buf()]);
        let install = ToolchainLocator::new(&cfg).locate().unwrap();
        assert_eq!(install.root, temp.path().join("2022/Community"));
    }

    #[test]
    fn test_year_without_known_edition_is_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("2022/Preview")).unwrap();
        touch(&temp.path().join("2019/Community/VC/vcvarsall.bat"));

        let cfg = config(vec![temp.path().to_path_buf()]);
        let install = ToolchainLocator::new(&cfg).locate().unwrap();
        assert_eq!(install.root, temp.path().join("2019/Community"));
    }

    #[test]
    fn test_walk_fallback_takes_first_found() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("2017/BuildTools/a/vcvarsall.bat");
        let b = temp.path().join("2017/BuildTools/b/vcvarsall.bat");
        touch(&b);
        touch(&a);

        let cfg = config(vec![temp.path().to_path_buf()]);
        let install = ToolchainLocator::new(&cfg).locate().unwrap();
        assert_eq!(install.activation_script, a);
    }

    #[test]
    fn test_missing_roots_and_missing_script() {
        let temp = TempDir::new().unwrap();
        let cfg = config(vec![temp.path().join("nope")]);
        assert!(ToolchainLocator::new(&cfg).locate().is_none());

        std::fs::create_dir_all(temp.path().join("2022/Community/VC")).unwrap();
        let cfg = config(vec![temp.path().to_path_buf()]);
        assert!(ToolchainLocator::new(&cfg).locate().is_none());
        assert!(ToolchainLocator::new(&cfg).find_installation().is_some());
    }
}
