//! Persistent PATH changes for future shells

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{self, Result};
use crate::exec::{CommandRunner, Invocation};

const MARKER_COMMENT: &str = "# Added by netter-setup";

/// `export PATH="$PATH:<dir>"`
pub fn export_path_line(dir: &Path) -> String {
    format!("export PATH=\"$PATH:{}\"", dir.display())
}

/// Login profile snippet for all users, e.g. `/etc/profile.d/netter.sh`
pub fn system_profile(project_name: &str) -> PathBuf {
    Path::new("/etc/profile.d").join(format!("{}.sh", project_name.to_lowercase()))
}

/// Append `line` to `profile` unless an identical line is already there.
///
/// Returns whether the file was changed. A missing profile is created.
pub fn append_if_absent(profile: &Path, line: &str) -> Result<bool> {
    let existing = match fs::read_to_string(profile) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => {
            return Err(error::fs::read_failed(
                profile.display().to_string(),
                e.to_string(),
            ));
        }
    };

    if existing.lines().any(|l| l.trim() == line) {
        tracing::debug!(profile = %profile.display(), "PATH entry already present");
        return Ok(false);
    }

    let separator = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        "\n"
    };
    let write_failed = |e: std::io::Error| error::fs::write_failed(profile.display().to_string(), e.to_string());

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(profile)
        .map_err(write_failed)?;
    write!(file, "{separator}\n{MARKER_COMMENT}\n{line}\n").map_err(write_failed)?;
    Ok(true)
}

/// Store `value` as the persistent PATH with `setx`; `/M` targets the
/// system-wide value instead of the user's
pub fn setx_path(runner: &dyn CommandRunner, value: &str, system: bool) -> Result<()> {
    let mut invocation = Invocation::new("setx").arg("PATH").arg(value);
    if system {
        invocation = invocation.arg("/M");
    }

    let output = runner
        .run(&invocation)
        .map_err(|e| error::install::command_failed("setx PATH", e.to_string()))?;
    if !output.success {
        return Err(error::install::command_failed(
            "setx PATH",
            output.status_text(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use crate::exec::testing::ScriptedRunner;
    use tempfile::TempDir;

    #[test]
    fn test_append_if_absent_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join(".bashrc");
        std::fs::write(&profile, "alias ll='ls -l'").unwrap();

        let line = export_path_line(Path::new("/home/u/Qt/6.8.0/gcc_64/bin"));
        assert!(append_if_absent(&profile, &line).unwrap());
        assert!(!append_if_absent(&profile, &line).unwrap());

        let content = std::fs::read_to_string(&profile).unwrap();
        assert!(content.starts_with("alias ll='ls -l'\n"));
        assert_eq!(content.matches(&line).count(), 1);
        assert!(content.contains(MARKER_COMMENT));
    }

    #[test]
    fn test_append_creates_missing_profile() {
        let temp = TempDir::new().unwrap();
        let profile = temp.path().join("netter.sh");
        assert!(append_if_absent(&profile, "export PATH=\"$PATH:/opt/qt/bin\"").unwrap());
        assert!(profile.exists());
    }

    #[test]
    fn test_system_profile_name() {
        assert_eq!(
            system_profile("Netter"),
            Path::new("/etc/profile.d/netter.sh")
        );
    }

    #[test]
    fn test_setx_system_and_user() {
        let runner = ScriptedRunner::new()
            .reply(r"setx PATH C:\a;C:\Qt\bin /M", CommandOutput::ok(""))
            .reply(r"setx PATH C:\a;C:\Qt\bin", CommandOutput::failed(1, "denied"));

        assert!(setx_path(&runner, r"C:\a;C:\Qt\bin", true).is_ok());
        assert!(setx_path(&runner, r"C:\a;C:\Qt\bin", false).is_err());
    }
}
