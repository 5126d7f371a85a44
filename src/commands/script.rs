//! Script command

use std::path::PathBuf;

use crate::commands::helpers;
use crate::error::Result;
use crate::script::{self, ScriptPaths, ScriptPlatform};
use crate::ui;

pub fn run(project: Option<PathBuf>) -> Result<()> {
    let (project_dir, config) = helpers::load(project)?;

    let platform = ScriptPlatform::host();
    let paths = ScriptPaths::new(
        &project_dir,
        &config,
        platform,
        helpers::activation_script(platform, &config),
    );
    let path = script::write(platform, &paths)?;
    ui::ok(&format!("Created startup script: {}", path.display()));
    Ok(())
}
