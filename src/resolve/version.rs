//! Latest Qt version on the supported release line

use regex::Regex;

use super::{AqtIndex, FallbackReason, Resolved, VersionSpec, query};
use crate::exec::CommandRunner;
use crate::ui;

/// Picks the newest `MAJOR.x.y` the index lists
pub struct VersionResolver<'a> {
    runner: &'a dyn CommandRunner,
    index: &'a AqtIndex,
    major: u64,
    default: VersionSpec,
}

impl<'a> VersionResolver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        index: &'a AqtIndex,
        major: u64,
        default: VersionSpec,
    ) -> Self {
        Self {
            runner,
            index,
            major,
            default,
        }
    }

    /// Newest listed version, or the default. Never fails and never retries.
    pub fn resolve_latest(&self) -> Resolved<VersionSpec> {
        ui::info(&format!(
            "Determining the latest available Qt {}.x version...",
            self.major
        ));

        let output = match query(self.runner, &self.index.list_versions()) {
            Ok(output) => output,
            Err(reason) => {
                ui::warn(&format!(
                    "Failed to get list of Qt versions ({reason}). Using Qt {} by default.",
                    self.default
                ));
                return Resolved::fallback(self.default, reason);
            }
        };

        match latest_in(&output.stdout, self.major) {
            Some(latest) => {
                ui::ok(&format!("Found latest available Qt version: {latest}"));
                Resolved::live(latest)
            }
            None => {
                ui::warn(&format!(
                    "No Qt {}.x versions found. Using Qt {} by default.",
                    self.major, self.default
                ));
                Resolved::fallback(self.default, FallbackReason::ParseEmpty)
            }
        }
    }
}

/// Every `major.x.y` token in `output`, in order of appearance
pub fn versions_in(output: &str, major: u64) -> Vec<VersionSpec> {
    let Ok(pattern) = Regex::new(&format!(r"\b{major}\.\d+\.\d+\b")) else {
        return Vec::new();
    };
    output
        .lines()
        .flat_map(|line| pattern.find_iter(line))
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// The numerically greatest `major.x.y` token in `output`
pub fn latest_in(output: &str, major: u64) -> Option<VersionSpec> {
    versions_in(output, major).into_iter().max()
}
