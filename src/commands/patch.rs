//! Patch command

use std::path::PathBuf;

use crate::cli::PatchArgs;
use crate::commands::helpers;
use crate::descriptor::{self, PatchOutcome};
use crate::error::Result;

pub fn run(project: Option<PathBuf>, args: PatchArgs) -> Result<()> {
    let (project_dir, config) = helpers::load(project)?;
    let patch = descriptor::apply(&project_dir.join(&config.descriptor), args.dry_run)?;

    if args.dry_run && patch.outcome == PatchOutcome::Patched {
        println!();
        print!("{}", patch.text);
    }
    Ok(())
}
