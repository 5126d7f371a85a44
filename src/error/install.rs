//! Install and command execution errors

use super::impl_error_constructors;

impl_error_constructors! {
    /// `tool` could not be installed by `command`
    failed => InstallFailed { tool, command, status },
    /// The isolated `aqt` install failed too
    fallback_failed => FallbackFailed { tool, reason },
    /// A command could not be spawned at all
    command_failed => CommandFailed { command, reason },
}
