//! Resolve command: what `aqt` would install

use std::path::PathBuf;

use crate::cli::ResolveArgs;
use crate::commands::helpers;
use crate::error::Result;
use crate::exec::SystemRunner;
use crate::install::qt_bin_dir;
use crate::resolve::{self, AqtIndex, ResolutionResult};
use crate::strategy;

pub fn run(project: Option<PathBuf>, args: ResolveArgs) -> Result<()> {
    let (_, config) = helpers::load(project)?;
    let index = AqtIndex::on_path(strategy::for_host().host());

    if args.json {
        crate::ui::set_quiet(true);
    }
    let result = resolve::resolve_all(&SystemRunner, &index, &config.qt)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result, &config.qt_install_dir()?);
    }
    Ok(())
}

fn print_summary(result: &ResolutionResult, install_dir: &std::path::Path) {
    println!();
    println!("Version:      {}", result.version);
    println!("Architecture: {}", result.architecture);
    println!("Modules:      {}", result.module_args().join(" "));
    println!("Bin dir:      {}", qt_bin_dir(install_dir, result).display());
    if !result.fallbacks.is_empty() {
        let stages: Vec<_> = result
            .fallbacks
            .iter()
            .map(|s| format!("{s:?}").to_lowercase())
            .collect();
        println!("Defaults used for: {}", stages.join(", "));
    }
}
