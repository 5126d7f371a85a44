//! Setup command: provision, patch, write the launch script, run it

use std::path::{Path, PathBuf};

use crate::cli::SetupArgs;
use crate::commands::helpers;
use crate::descriptor;
use crate::environment::Environment;
use crate::error::Result;
use crate::exec::{CommandRunner, Invocation, SystemRunner};
use crate::install::{InstallOrchestrator, Session};
use crate::script::{self, ScriptPaths, ScriptPlatform};
use crate::strategy;
use crate::ui;

pub fn run(project: Option<PathBuf>, args: SetupArgs) -> Result<()> {
    let (project_dir, config) = helpers::load(project)?;
    ui::step(&format!(
        "Setting up dependencies for {} project...",
        config.project_name
    ));

    let runner = SystemRunner;
    let strategy = strategy::for_host();
    let session = Session::new(&runner, &config, Environment::current()).assume_yes(args.yes);
    let outcome = InstallOrchestrator::new(strategy.as_ref()).provision(session)?;

    if let Some(resolution) = &outcome.resolution {
        ui::ok(&format!(
            "Qt {} ({}) installed with aqt",
            resolution.version, resolution.architecture
        ));
    }
    let missing: Vec<String> = outcome
        .statuses
        .iter()
        .filter(|s| !s.present)
        .map(|s| s.tool.to_string())
        .collect();
    if !missing.is_empty() {
        ui::warn(&format!("Still missing: {}", missing.join(", ")));
    }

    let delta = outcome.environment.into_delta();
    if !delta.is_empty() {
        let names: Vec<_> = delta.names().collect();
        ui::info(&format!("Updating environment: {}", names.join(", ")));
    }
    delta.apply();

    let descriptor_path = project_dir.join(&config.descriptor);
    if let Err(e) = descriptor::apply(&descriptor_path, false) {
        ui::error(&format!("Could not update {}: {e}", descriptor_path.display()));
    }

    let platform = ScriptPlatform::host();
    let paths = ScriptPaths::new(
        &project_dir,
        &config,
        platform,
        helpers::activation_script(platform, &config),
    );
    let script_path = script::write(platform, &paths)?;
    ui::ok(&format!("Created startup script: {}", script_path.display()));

    println!();
    ui::step("Setup complete!");
    ui::info(&format!(
        "To build and run {}, execute the script: {}",
        config.project_name,
        script_path.display()
    ));

    if !args.no_launch {
        println!();
        ui::step(&format!("Starting {}...", config.project_name));
        launch(&runner, platform, &script_path);
    }
    Ok(())
}

/// Run the launch script in the foreground; failures are reported only
fn launch(runner: &dyn CommandRunner, platform: ScriptPlatform, script: &Path) {
    let invocation = match platform {
        ScriptPlatform::Windows => Invocation::for_path(script),
        ScriptPlatform::Unix => Invocation::new("bash").arg(script.display().to_string()),
    }
    .inherit();

    match runner.run(&invocation) {
        Ok(output) if output.success => {}
        Ok(output) => ui::error(&format!("Script exited with {}", output.status_text())),
        Err(e) => {
            ui::error(&format!("Error running script: {e}"));
            ui::info("Please run the script manually.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::CommandOutput;
    use crate::exec::testing::ScriptedRunner;

    #[test]
    fn test_launch_uses_bash_on_unix() {
        let runner = ScriptedRunner::new().reply("bash /p/run_netter.sh", CommandOutput::ok(""));
        launch(&runner, ScriptPlatform::Unix, Path::new("/p/run_netter.sh"));
        assert!(runner.called("bash /p/run_netter.sh"));
    }

    #[test]
    fn test_launch_failure_is_not_fatal() {
        let runner = ScriptedRunner::new();
        launch(&runner, ScriptPlatform::Windows, Path::new(r"C:\p\run_netter.bat"));
        assert_eq!(runner.calls.borrow().len(), 1);
    }
}
