//! Check command: probe every tool, install nothing

use std::path::PathBuf;

use console::Style;

use crate::commands::helpers;
use crate::environment::Environment;
use crate::error::Result;
use crate::exec::SystemRunner;
use crate::install::{InstallAction, InstallPlan, InstallStep, Session};
use crate::strategy;

pub fn run(project: Option<PathBuf>) -> Result<()> {
    let (_, config) = helpers::load(project)?;

    let runner = SystemRunner;
    let strategy = strategy::for_host();
    let mut session = Session::new(&runner, &config, Environment::current());
    let plan = InstallPlan::build(strategy.as_ref(), &mut session);

    println!(
        "{}",
        Style::new()
            .bold()
            .apply_to(format!("Toolchain status ({})", strategy.name()))
    );
    for step in plan.steps() {
        println!("{}", format_step(step));
    }

    match plan.pending() {
        0 => println!("\nEverything is installed."),
        n => println!("\n{n} tool(s) missing. Run `netter-setup setup` to install them."),
    }
    Ok(())
}

fn format_step(step: &InstallStep) -> String {
    let mark = if step.status.present {
        Style::new().green().apply_to("✓")
    } else {
        Style::new().red().apply_to("✗")
    };

    let mut line = format!("  {mark} {:<14}", step.tool.to_string());
    if let Some(detail) = &step.status.detail {
        line.push_str(&format!(" {detail}"));
    }
    match (&step.status.resolved_path, step.action) {
        (Some(path), _) => line.push_str(&format!(" ({})", path.display())),
        (None, InstallAction::Skip) => {}
        (None, action) => line.push_str(&format!(" [{action}]")),
    }
    line
}
