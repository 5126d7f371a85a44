//! Status output
//!
//! Every recoverable condition is announced here before the fallback kicks
//! in, so a user watching the run can tell live discovery from defaults.
//! Diagnostics for developers go through `tracing` instead.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

static QUIET: AtomicBool = AtomicBool::new(false);

/// Suppress status lines, e.g. while stdout carries JSON. Errors are
/// still printed.
pub fn set_quiet(quiet: bool) {
    QUIET.store(quiet, Ordering::Relaxed);
}

fn quiet() -> bool {
    QUIET.load(Ordering::Relaxed)
}

/// A heading for a group of steps
pub fn step(message: &str) {
    if !quiet() {
        println!("{}", Style::new().bold().apply_to(message));
    }
}

/// Plain progress line
pub fn info(message: &str) {
    if !quiet() {
        println!("{message}");
    }
}

/// Something already in place
pub fn ok(message: &str) {
    if !quiet() {
        println!("{} {message}", Style::new().green().bold().apply_to("✓"));
    }
}

/// A recoverable problem; the run continues
pub fn warn(message: &str) {
    if !quiet() {
        println!("{} {message}", Style::new().yellow().bold().apply_to("Warning:"));
    }
}

/// A failed step; the run may continue without it
pub fn error(message: &str) {
    eprintln!("{} {message}", Style::new().red().bold().apply_to("Error:"));
}

/// Spinner for captured commands that print nothing while they work
pub fn spinner(message: &str) -> ProgressBar {
    if quiet() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());

    let pb = ProgressBar::new_spinner();
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
