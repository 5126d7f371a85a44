//! Build descriptor patching
//!
//! Adds a post-build deployment block to `CMakeLists.txt`, right after the
//! last `target_link_libraries(...)`. [`patch`] is a pure function of the
//! text and idempotent: a descriptor that already carries the marker line
//! comes back unchanged, so running setup twice leaves the file as the
//! first run wrote it.
//!
//! A deployment command written by older tooling (an `add_custom_command`
//! mentioning `deployqt`) is removed before the new block goes in.

pub mod anchor;
pub mod block;
pub mod encoding;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{self, Result};
use crate::ui;

pub use encoding::Encoding;

const ANCHOR: &str = "target_link_libraries";
const LEGACY_CONSTRUCT: &str = "add_custom_command";
const LEGACY_NEEDLE: &str = "deployqt";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOutcome {
    Patched,
    AlreadyPatched,
    /// No link step to anchor on; the text is unchanged
    AnchorMissing,
}

/// Patched text and what happened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    pub text: String,
    pub outcome: PatchOutcome,
    /// Legacy deployment commands seen; only the last one is removed
    pub legacy_found: usize,
}

impl Patch {
    fn unchanged(original: &str, outcome: PatchOutcome, legacy_found: usize) -> Self {
        Self {
            text: original.to_string(),
            outcome,
            legacy_found,
        }
    }
}

pub fn is_patched(text: &str) -> bool {
    text.contains(block::MARKER) || text.contains(block::LEGACY_MARKER)
}

/// Insert the deployment block after the last link step
pub fn patch(original: &str) -> Patch {
    if is_patched(original) {
        return Patch::unchanged(original, PatchOutcome::AlreadyPatched, 0);
    }

    let legacy: Vec<_> = anchor::constructs(original, LEGACY_CONSTRUCT)
        .into_iter()
        .filter(|range| original[range.clone()].to_lowercase().contains(LEGACY_NEEDLE))
        .collect();

    let cleaned = match legacy.last() {
        Some(range) => {
            let range = anchor::with_line(original, range.clone());
            format!("{}{}", &original[..range.start], &original[range.end..])
        }
        None => original.to_string(),
    };

    let Some(start) = anchor::find_last(&cleaned, ANCHOR) else {
        return Patch::unchanged(original, PatchOutcome::AnchorMissing, legacy.len());
    };
    let Some(close) = anchor::find_matching_delimiter(&cleaned, start, '(', ')') else {
        return Patch::unchanged(original, PatchOutcome::AnchorMissing, legacy.len());
    };

    let split = close + 1;
    Patch {
        text: format!("{}{}{}", &cleaned[..split], block::render(), &cleaned[split..]),
        outcome: PatchOutcome::Patched,
        legacy_found: legacy.len(),
    }
}

/// A descriptor file as read from disk
#[derive(Debug, Clone)]
pub struct BuildDescriptor {
    pub path: PathBuf,
    pub text: String,
    pub encoding: Encoding,
}

impl BuildDescriptor {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(error::fs::not_found(path.display().to_string()));
        }
        let bytes = fs::read(path)
            .map_err(|e| error::fs::read_failed(path.display().to_string(), e.to_string()))?;
        let (text, encoding) = encoding::decode(&bytes);
        tracing::debug!(path = %path.display(), %encoding, "descriptor decoded");

        Ok(Self {
            path: path.to_path_buf(),
            text,
            encoding,
        })
    }

    /// Replace the file with `text` as UTF-8, keeping its permissions
    pub fn write(&self, text: &str) -> Result<()> {
        let write_failed =
            |e: std::io::Error| error::fs::write_failed(self.path.display().to_string(), e.to_string());

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_failed)?;
        tmp.write_all(text.as_bytes()).map_err(write_failed)?;

        let permissions = fs::metadata(&self.path).map_err(write_failed)?.permissions();
        fs::set_permissions(tmp.path(), permissions).map_err(write_failed)?;
        tmp.persist(&self.path).map_err(|e| write_failed(e.error))?;
        Ok(())
    }
}

/// Read, patch and (unless `dry_run`) write the descriptor at `path`
pub fn apply(path: &Path, dry_run: bool) -> Result<Patch> {
    let descriptor = BuildDescriptor::read(path)?;
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
    ui::info(&format!(
        "{name} successfully read with encoding {}",
        descriptor.encoding
    ));

    let patch = patch(&descriptor.text);
    if patch.legacy_found > 1 {
        ui::warn(&format!(
            "Found {} legacy deployment commands; only the last one is replaced",
            patch.legacy_found
        ));
    } else if patch.legacy_found == 1 && patch.outcome == PatchOutcome::Patched {
        ui::info("Replacing legacy deployment command");
    }

    match patch.outcome {
        PatchOutcome::AlreadyPatched => ui::ok(&format!("{name} already updated")),
        PatchOutcome::AnchorMissing => ui::warn(&format!(
            "Could not find a suitable place in {name} for updating (no {ANCHOR} block)"
        )),
        PatchOutcome::Patched if dry_run => {
            ui::info(&format!("{name} would be updated (dry run)"));
        }
        PatchOutcome::Patched => {
            descriptor.write(&patch.text)?;
            ui::ok(&format!("{name} updated with automatic deployment settings"));
        }
    }
    Ok(patch)
}
