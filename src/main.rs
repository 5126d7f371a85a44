//! netter-setup - build environment provisioning for Netter
//!
//! Detects and installs the native toolchain (C++ compiler, CMake, Ninja,
//! Qt 6), patches CMakeLists.txt with Qt deployment steps and writes a
//! launch script that builds and runs the application.

use clap::Parser;
use miette::Diagnostic;

mod cli;
mod commands;
mod config;
mod descriptor;
mod environment;
mod error;
mod exec;
mod install;
mod logging;
mod persist;
mod probe;
mod resolve;
mod script;
mod strategy;
mod toolchain;
mod ui;

use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Setup(args) => commands::setup::run(cli.project, args),
        Commands::Check => commands::check::run(cli.project),
        Commands::Resolve(args) => commands::resolve::run(cli.project, args),
        Commands::Patch(args) => commands::patch::run(cli.project, args),
        Commands::Script => commands::script::run(cli.project),
        Commands::Version => commands::version::run(),
        Commands::Completions(args) => commands::completions::run(args),
    };

    if let Err(e) = result {
        ui::error(&e.to_string());
        if let Some(help) = e.help() {
            eprintln!("  help: {help}");
        }
        std::process::exit(1);
    }
}
