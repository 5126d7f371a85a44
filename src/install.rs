//! Install orchestration
//!
//! Every tool is probed once, the probes become an [`InstallPlan`], and the
//! plan is executed in order. A failed install is fatal, except for Qt: when
//! the package manager cannot provide it, Qt is installed with `aqt` from an
//! isolated Python environment instead.
//!
//! Environment changes made along the way (compiler activation, the Qt bin
//! directory) accumulate in the session's [`Environment`] and are returned to
//! the caller in the [`ProvisionOutcome`]; nothing here touches the process
//! environment.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::SetupConfig;
use crate::environment::Environment;
use crate::error::{self, Result};
use crate::exec::{CommandRunner, Invocation};
use crate::probe::{self, Tool, ToolchainStatus};
use crate::resolve::{self, AqtIndex, ResolutionResult, architecture::aqt_install_dir};
use crate::strategy::ProvisioningStrategy;
use crate::ui;

/// Shared state of one provisioning run
pub struct Session<'a> {
    pub runner: &'a dyn CommandRunner,
    pub config: &'a SetupConfig,
    /// Effective environment: the process environment plus pending changes
    pub env: Environment,
    /// Skip interactive confirmations
    pub assume_yes: bool,
}

impl<'a> Session<'a> {
    pub fn new(runner: &'a dyn CommandRunner, config: &'a SetupConfig, env: Environment) -> Self {
        Self {
            runner,
            config,
            env,
            assume_yes: false,
        }
    }

    pub fn assume_yes(mut self, yes: bool) -> Self {
        self.assume_yes = yes;
        self
    }
}

/// What to do about one tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallAction {
    Skip,
    InstallPrimary,
    InstallFallback,
}

impl fmt::Display for InstallAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Skip => "present",
            Self::InstallPrimary => "install",
            Self::InstallFallback => "install (fallback)",
        })
    }
}

#[derive(Debug, Clone)]
pub struct InstallStep {
    pub tool: Tool,
    pub action: InstallAction,
    /// Probe result the action was derived from
    pub status: ToolchainStatus,
}

/// Ordered install steps, built once per run
#[derive(Debug, Clone)]
pub struct InstallPlan {
    steps: Vec<InstallStep>,
}

impl InstallPlan {
    /// Probe every tool in install order and decide what to do about it
    pub fn build(strategy: &dyn ProvisioningStrategy, session: &mut Session<'_>) -> Self {
        let steps = Tool::ALL
            .into_iter()
            .map(|tool| {
                let status = strategy.probe(tool, session);
                let action = if status.present {
                    InstallAction::Skip
                } else if tool == Tool::GuiRuntime
                    && !strategy.has_primary_installer(tool, session)
                {
                    InstallAction::InstallFallback
                } else {
                    InstallAction::InstallPrimary
                };
                tracing::debug!(%tool, present = status.present, ?action, "planned");
                InstallStep {
                    tool,
                    action,
                    status,
                }
            })
            .collect();
        Self { steps }
    }

    pub fn steps(&self) -> &[InstallStep] {
        &self.steps
    }

    /// Number of tools that need installing
    pub fn pending(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.action != InstallAction::Skip)
            .count()
    }
}

/// Result of a provisioning run
#[derive(Debug)]
pub struct ProvisionOutcome {
    pub statuses: Vec<ToolchainStatus>,
    /// Set when Qt was installed through `aqt`
    pub resolution: Option<ResolutionResult>,
    /// Effective environment, with every pending change
    pub environment: Environment,
}

/// Drives a [`ProvisioningStrategy`] to a provisioned state
pub struct InstallOrchestrator<'a> {
    strategy: &'a dyn ProvisioningStrategy,
}

impl<'a> InstallOrchestrator<'a> {
    pub fn new(strategy: &'a dyn ProvisioningStrategy) -> Self {
        Self { strategy }
    }

    pub fn provision(&self, mut session: Session<'_>) -> Result<ProvisionOutcome> {
        ui::step(&format!(
            "Checking dependencies for {}...",
            self.strategy.name()
        ));
        let plan = InstallPlan::build(self.strategy, &mut session);

        let mut statuses = Vec::with_capacity(plan.steps().len());
        let mut resolution = None;

        for step in plan.steps() {
            let status = match step.action {
                InstallAction::Skip => {
                    report_present(&step.status);
                    step.status.clone()
                }
                InstallAction::InstallPrimary | InstallAction::InstallFallback => {
                    let (status, aqt) = self.execute(step, &mut session)?;
                    if aqt.is_some() {
                        resolution = aqt;
                    }
                    status
                }
            };
            statuses.push(status);
        }

        Ok(ProvisionOutcome {
            statuses,
            resolution,
            environment: session.env,
        })
    }

    fn execute(
        &self,
        step: &InstallStep,
        session: &mut Session<'_>,
    ) -> Result<(ToolchainStatus, Option<ResolutionResult>)> {
        let tool = step.tool;
        ui::step(&format!("{tool} not found, installing..."));

        let aqt = match step.action {
            InstallAction::InstallFallback => Some(self.install_qt_fallback(session)?),
            _ => match self.strategy.install(tool, session) {
                Ok(aqt) => aqt,
                Err(e) if tool == Tool::GuiRuntime => {
                    ui::error(&format!("Installing Qt failed: {e}"));
                    Some(self.install_qt_fallback(session)?)
                }
                Err(e) => return Err(e),
            },
        };

        if let Some(resolution) = &aqt {
            let bin = self.register_qt(resolution, session)?;
            let mut status = ToolchainStatus::found(tool, bin);
            status.detail = Some(resolution.version.to_string());
            return Ok((status, aqt));
        }

        let status = self.strategy.probe(tool, session);
        if !status.present {
            ui::warn(&format!(
                "{tool} is still not reachable through PATH after installing"
            ));
        }
        Ok((status, None))
    }

    /// Isolated `aqtinstall` environment, then resolution and install
    /// through its `aqt`
    fn install_qt_fallback(&self, session: &mut Session<'_>) -> Result<ResolutionResult> {
        ui::step("Creating a virtual environment for aqtinstall...");
        let fallback = |e: error::ProvisionError| error::install::fallback_failed("Qt", e.to_string());

        self.strategy.prepare_fallback(session).map_err(fallback)?;

        let venv = session.config.venv_dir()?;
        run_install(
            session.runner,
            "Qt",
            Invocation::new(self.strategy.python())
                .args(["-m", "venv"])
                .arg(venv.display().to_string())
                .inherit(),
        )
        .map_err(fallback)?;

        let bin = venv.join(self.strategy.venv_scripts_dir());
        run_install(
            session.runner,
            "Qt",
            Invocation::for_path(&bin.join(probe::executable_file_name("pip")))
                .args(["install", "aqtinstall"])
                .inherit(),
        )
        .map_err(fallback)?;

        let index = AqtIndex::at(
            bin.join(probe::executable_file_name("aqt")),
            self.strategy.host(),
        );
        install_qt_with_aqt(session, &index).map_err(fallback)
    }

    /// Put the Qt bin directory on the pending PATH and persist it
    fn register_qt(
        &self,
        resolution: &ResolutionResult,
        session: &mut Session<'_>,
    ) -> Result<PathBuf> {
        let bin = qt_bin_dir(&session.config.qt_install_dir()?, resolution);
        session.env.append_path(&bin);

        ui::info("Adding Qt to PATH...");
        if let Err(e) = self.strategy.persist_path(&bin, session) {
            ui::warn(&format!(
                "Could not persist PATH ({e}). Add {} to PATH manually.",
                bin.display()
            ));
        }
        Ok(bin)
    }
}

fn report_present(status: &ToolchainStatus) {
    match &status.detail {
        Some(detail) => ui::ok(&format!("{} {detail} found!", status.tool)),
        None => ui::ok(&format!("{} found!", status.tool)),
    }
}

/// `<install_dir>/<version>/<arch dir>/bin`
pub fn qt_bin_dir(install_dir: &Path, resolution: &ResolutionResult) -> PathBuf {
    install_dir
        .join(resolution.version.to_string())
        .join(aqt_install_dir(&resolution.architecture))
        .join("bin")
}

/// Run an installer command; a spawn error or non-zero exit is an error
pub(crate) fn run_install(
    runner: &dyn CommandRunner,
    tool: &str,
    invocation: Invocation,
) -> Result<()> {
    ui::info(&format!("Executing command: {invocation}"));
    let output = runner
        .run(&invocation)
        .map_err(|e| error::install::command_failed(invocation.to_string(), e.to_string()))?;
    if !output.success {
        return Err(error::install::failed(
            tool,
            invocation.to_string(),
            output.status_text(),
        ));
    }
    Ok(())
}

/// Resolve version, architecture and modules through `index` and install
pub(crate) fn install_qt_with_aqt(
    session: &Session<'_>,
    index: &AqtIndex,
) -> Result<ResolutionResult> {
    let resolution = resolve::resolve_all(session.runner, index, &session.config.qt)?;
    let install_dir = session.config.qt_install_dir()?;
    ui::step(&format!(
        "Installing Qt {} in {}...",
        resolution.version,
        install_dir.display()
    ));
    run_install(session.runner, "Qt", index.install(&resolution, &install_dir))?;
    Ok(resolution)
}
