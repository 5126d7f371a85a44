//! CLI definitions using clap derive API
//!
//! Argument types live in one submodule per command:
//! - setup: full provisioning run
//! - resolve: Qt resolution output options
//! - patch: descriptor patching options
//! - completions: shell completion generation

use clap::builder::{Styles, styling::AnsiColor};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod completions;
pub mod patch;
pub mod resolve;
pub mod setup;

pub use completions::CompletionsArgs;
pub use patch::PatchArgs;
pub use resolve::ResolveArgs;
pub use setup::SetupArgs;

/// netter-setup - build environment provisioning for Netter
///
/// Installs the C++ compiler, CMake, Ninja and Qt 6, patches CMakeLists.txt
/// with deployment steps and writes a launch script.
#[derive(Parser, Debug)]
#[command(
    name = "netter-setup",
    author,
    version,
    color = clap::ColorChoice::Auto,
    styles = Styles::styled()
        .header(AnsiColor::Green.on_default().bold())
        .usage(AnsiColor::Green.on_default().bold())
        .literal(AnsiColor::Cyan.on_default().bold())
        .placeholder(AnsiColor::Cyan.on_default()),
    about = "Provision the Netter build environment (compiler, CMake, Ninja, Qt 6)",
    long_about = "netter-setup detects and installs the native toolchain Netter builds with, \
                  resolves a Qt 6 version, architecture and module set, adds Qt deployment \
                  steps to CMakeLists.txt and writes a run_netter launch script.",
    after_help = "\x1b[1m\x1b[32mExamples:\x1b[0m\n   \
                  netter-setup setup                 \x1b[90m# Install everything, patch, write script, run\x1b[0m\n   \
                  netter-setup setup --yes --no-launch\n   \
                  netter-setup check                 \x1b[90m# Show what is installed\x1b[0m\n   \
                  netter-setup resolve --json        \x1b[90m# Qt version/arch/modules aqt would install\x1b[0m\n   \
                  netter-setup patch --dry-run       \x1b[90m# Print the patched CMakeLists.txt\x1b[0m\n"
)]
pub struct Cli {
    /// Project directory (defaults to current directory)
    #[arg(long, short = 'p', global = true, env = "NETTER_PROJECT_DIR")]
    pub project: Option<PathBuf>,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install missing tools, patch CMakeLists.txt and write the launch script
    Setup(SetupArgs),

    /// Probe every tool without installing anything
    Check,

    /// Resolve the Qt version, architecture and modules to install
    Resolve(ResolveArgs),

    /// Add Qt deployment steps to CMakeLists.txt
    Patch(PatchArgs),

    /// Write the run_netter launch script
    Script,

    /// Show version information
    #[command(hide = true)]
    Version,

    /// Generate shell completions
    Completions(CompletionsArgs),
}
