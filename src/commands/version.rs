//! Version command implementation

use crate::config::QtConfig;
use crate::error::Result;
use crate::strategy;

pub fn run() -> Result<()> {
    let qt = QtConfig::default();

    println!("netter-setup {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Build info:");
    println!("  Minimum Rust version: {}", env!("CARGO_PKG_RUST_VERSION"));
    println!(
        "  Target: {}-{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    println!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    println!("  Provisioning strategy: {}", strategy::for_host().name());
    println!(
        "  Qt release line: {} (fallback {})",
        qt.major, qt.fallback_version
    );

    Ok(())
}
