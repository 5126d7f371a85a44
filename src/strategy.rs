//! Platform-specific provisioning
//!
//! All OS branching lives behind [`ProvisioningStrategy`]. The strategy is
//! picked once at startup with [`for_host`]; everything downstream talks to
//! the trait.

use std::cell::Cell;
use std::path::Path;

use crate::environment::{ActivationShell, EnvironmentActivator, host_arch};
use crate::error::Result;
use crate::exec::{CommandRunner, Invocation};
use crate::install::{self, Session, run_install};
use crate::persist;
use crate::probe::{self, Tool, ToolchainStatus};
use crate::resolve::{AqtHost, AqtIndex, ResolutionResult};
use crate::toolchain::ToolchainLocator;
use crate::ui;

/// How tools are found and installed on one platform
pub trait ProvisioningStrategy {
    /// Platform name for status output
    fn name(&self) -> &'static str;

    fn host(&self) -> AqtHost;

    /// Executable probed for `tool`
    fn executable(&self, tool: Tool) -> &'static str;

    fn probe(&self, tool: Tool, session: &mut Session<'_>) -> ToolchainStatus {
        match tool {
            Tool::Compiler => self.probe_compiler(session),
            Tool::GuiRuntime => probe_qt(session),
            other => probe::probe_tool(other, self.executable(other), &session.env),
        }
    }

    /// May change `session.env` when the compiler needs an activated
    /// environment
    fn probe_compiler(&self, session: &mut Session<'_>) -> ToolchainStatus;

    /// Whether the platform's package installer can be used for `tool`
    fn has_primary_installer(&self, tool: Tool, session: &Session<'_>) -> bool;

    /// Install `tool`. Returns the resolution when Qt was installed
    /// through `aqt`.
    fn install(&self, tool: Tool, session: &mut Session<'_>) -> Result<Option<ResolutionResult>>;

    /// Prerequisites for the isolated `aqtinstall` environment
    fn prepare_fallback(&self, session: &mut Session<'_>) -> Result<()>;

    /// Interpreter used to create the isolated environment
    fn python(&self) -> &'static str;

    /// Directory of a venv holding its executables
    fn venv_scripts_dir(&self) -> &'static str;

    fn is_elevated(&self, runner: &dyn CommandRunner) -> bool;

    /// Make `dir` part of PATH for future shells
    fn persist_path(&self, dir: &Path, session: &Session<'_>) -> Result<()>;
}

/// The strategy for the platform this binary was built for
pub fn for_host() -> Box<dyn ProvisioningStrategy> {
    if cfg!(windows) {
        Box::new(WindowsStrategy)
    } else {
        Box::new(UnixStrategy::default())
    }
}

/// Installed Qt on the configured release line
fn probe_qt(session: &Session<'_>) -> ToolchainStatus {
    let major = session.config.qt.major;
    match probe::installed_qt(session.runner, major) {
        Some(version) => {
            let qmake = probe::find_in("qmake6", &session.env)
                .or_else(|| probe::find_in("qmake", &session.env));
            ToolchainStatus {
                tool: Tool::GuiRuntime,
                present: true,
                resolved_path: qmake,
                detail: Some(version.to_string()),
            }
        }
        None => ToolchainStatus::absent(Tool::GuiRuntime),
    }
}

/// MSVC, pip and `aqt`
#[derive(Debug, Default)]
pub struct WindowsStrategy;

impl WindowsStrategy {
    fn pip_install(package: &str) -> Invocation {
        Invocation::new("pip").args(["install", package]).inherit()
    }

    fn guide_compiler_install(&self, session: &mut Session<'_>) -> Result<()> {
        ui::warn(
            "MSVC (Visual Studio) not found. Please install Visual Studio with C++ development tools.",
        );
        ui::info("You can download it from: https://visualstudio.microsoft.com/downloads/");
        ui::info("Make sure that the 'Desktop development with C++' component is selected");

        if !session.assume_yes {
            let proceed = inquire::Confirm::new("Continue once Visual Studio is installed?")
                .with_default(true)
                .prompt()?;
            if !proceed {
                ui::warn("Continuing without a C++ compiler");
                return Ok(());
            }
        }

        if !self.probe_compiler(session).present {
            ui::warn("MSVC still not found. The build will fail until it is installed.");
        }
        Ok(())
    }
}

impl ProvisioningStrategy for WindowsStrategy {
    fn name(&self) -> &'static str {
        "Windows"
    }

    fn host(&self) -> AqtHost {
        AqtHost::Windows
    }

    fn executable(&self, tool: Tool) -> &'static str {
        match tool {
            Tool::Compiler => "cl",
            Tool::BuildGenerator => "cmake",
            Tool::BuildRunner => "ninja",
            Tool::GuiRuntime => "qmake",
        }
    }

    fn probe_compiler(&self, session: &mut Session<'_>) -> ToolchainStatus {
        let compiler = self.executable(Tool::Compiler);
        if let Some(path) = probe::find_in(compiler, &session.env) {
            return ToolchainStatus::found(Tool::Compiler, path);
        }

        ui::info("Setting up MSVC environment...");
        let Some(install) = ToolchainLocator::new(&session.config.toolchain).locate() else {
            ui::warn("Could not find vcvarsall.bat");
            return ToolchainStatus::absent(Tool::Compiler);
        };
        ui::info(&format!(
            "Found vcvarsall.bat: {}",
            install.activation_script.display()
        ));

        let activator = EnvironmentActivator::new(session.runner, ActivationShell::Cmd, compiler);
        let Some(activation) = activator.activate(
            &install.activation_script,
            host_arch(),
            &install.root,
            &session.env,
        ) else {
            return ToolchainStatus::absent(Tool::Compiler);
        };

        session.env.merge(activation.delta);
        match activation.compiler {
            Some(path) => ToolchainStatus::found(Tool::Compiler, path),
            None => ToolchainStatus::absent(Tool::Compiler),
        }
    }

    fn has_primary_installer(&self, tool: Tool, session: &Session<'_>) -> bool {
        match tool {
            Tool::Compiler => true,
            _ => probe::probe("pip", &session.env),
        }
    }

    fn install(&self, tool: Tool, session: &mut Session<'_>) -> Result<Option<ResolutionResult>> {
        match tool {
            Tool::Compiler => {
                self.guide_compiler_install(session)?;
                Ok(None)
            }
            Tool::BuildGenerator => {
                run_install(session.runner, "CMake", Self::pip_install("cmake"))?;
                Ok(None)
            }
            Tool::BuildRunner => {
                run_install(session.runner, "Ninja", Self::pip_install("ninja"))?;
                Ok(None)
            }
            Tool::GuiRuntime => {
                run_install(session.runner, "Qt", Self::pip_install("aqtinstall"))?;
                let index = AqtIndex::on_path(self.host());
                install::install_qt_with_aqt(session, &index).map(Some)
            }
        }
    }

    fn prepare_fallback(&self, _session: &mut Session<'_>) -> Result<()> {
        Ok(())
    }

    fn python(&self) -> &'static str {
        "python"
    }

    fn venv_scripts_dir(&self) -> &'static str {
        "Scripts"
    }

    fn is_elevated(&self, runner: &dyn CommandRunner) -> bool {
        runner
            .run(&Invocation::new("net").arg("session"))
            .is_ok_and(|output| output.success)
    }

    fn persist_path(&self, _dir: &Path, session: &Session<'_>) -> Result<()> {
        let system = self.is_elevated(session.runner);
        let path = session.env.var("PATH").unwrap_or_default();
        persist::setx_path(session.runner, path, system)?;
        if !system {
            ui::info("Note: added to the user PATH only. Run as administrator to change the system PATH.");
        }
        Ok(())
    }
}

/// g++, apt and system Qt packages
#[derive(Debug, Default)]
pub struct UnixStrategy {
    /// `apt-get update` runs at most once per run
    updated: Cell<bool>,
}

const QT_PACKAGES: [&str; 3] = ["qt6-base-dev", "qt6-declarative-dev", "qt6-tools-dev-tools"];

impl UnixStrategy {
    fn apt_get<I, S>(args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new("sudo").arg("apt-get").args(args).inherit()
    }

    fn apt_install(&self, runner: &dyn CommandRunner, tool: &str, packages: &[&str]) -> Result<()> {
        if !self.updated.get() {
            run_install(runner, tool, Self::apt_get(["update"]))?;
            self.updated.set(true);
        }
        run_install(
            runner,
            tool,
            Self::apt_get(["install", "-y"]).args(packages.iter().copied()),
        )
    }

    fn package(tool: Tool) -> &'static str {
        match tool {
            Tool::Compiler => "g++",
            Tool::BuildGenerator => "cmake",
            Tool::BuildRunner => "ninja-build",
            Tool::GuiRuntime => "qt6-base-dev",
        }
    }
}

impl ProvisioningStrategy for UnixStrategy {
    fn name(&self) -> &'static str {
        "Linux"
    }

    fn host(&self) -> AqtHost {
        AqtHost::Linux
    }

    fn executable(&self, tool: Tool) -> &'static str {
        match tool {
            Tool::Compiler => "g++",
            Tool::BuildGenerator => "cmake",
            Tool::BuildRunner => "ninja",
            Tool::GuiRuntime => "qmake6",
        }
    }

    fn probe_compiler(&self, session: &mut Session<'_>) -> ToolchainStatus {
        probe::probe_tool(
            Tool::Compiler,
            self.executable(Tool::Compiler),
            &session.env,
        )
    }

    fn has_primary_installer(&self, _tool: Tool, session: &Session<'_>) -> bool {
        probe::probe("apt-get", &session.env)
    }

    fn install(&self, tool: Tool, session: &mut Session<'_>) -> Result<Option<ResolutionResult>> {
        if tool != Tool::GuiRuntime {
            self.apt_install(session.runner, &tool.to_string(), &[Self::package(tool)])?;
            return Ok(None);
        }

        ui::info("Installing Qt 6 via system packages...");
        self.apt_install(session.runner, "Qt", &QT_PACKAGES)?;
        match probe::installed_qt(session.runner, session.config.qt.major) {
            Some(version) => {
                ui::ok(&format!("Installed Qt {version} via system packages"));
            }
            None => ui::warn("Qt installation via apt may not have succeeded"),
        }
        Ok(None)
    }

    fn prepare_fallback(&self, session: &mut Session<'_>) -> Result<()> {
        if !self.has_primary_installer(Tool::GuiRuntime, session) {
            return Ok(());
        }
        self.apt_install(session.runner, "Qt", &["python3-venv"])
    }

    fn python(&self) -> &'static str {
        "python3"
    }

    fn venv_scripts_dir(&self) -> &'static str {
        "bin"
    }

    fn is_elevated(&self, _runner: &dyn CommandRunner) -> bool {
        is_root()
    }

    fn persist_path(&self, dir: &Path, session: &Session<'_>) -> Result<()> {
        let profile = if self.is_elevated(session.runner) {
            persist::system_profile(&session.config.project_name)
        } else {
            crate::config::home_dir()?.join(".bashrc")
        };
        if persist::append_if_absent(&profile, &persist::export_path_line(dir))? {
            ui::info(&format!("PATH updated in {}", profile.display()));
        }
        Ok(())
    }
}

#[cfg(unix)]
fn is_root() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
fn is_root() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SetupConfig;
    use crate::environment::{Environment, EnvironmentSnapshot};
    use crate::exec::CommandOutput;
    use crate::exec::testing::ScriptedRunner;

    fn env(path: &str) -> Environment {
        Environment::from_snapshot(
            [("PATH".to_string(), path.to_string())]
                .into_iter()
                .collect::<EnvironmentSnapshot>(),
        )
    }

    #[test]
    fn test_apt_update_runs_once_per_run() {
        let runner = ScriptedRunner::new()
            .reply("sudo apt-get update", CommandOutput::ok(""))
            .reply("sudo apt-get install -y cmake", CommandOutput::ok(""))
            .reply("sudo apt-get install -y ninja-build", CommandOutput::ok(""));
        let config = SetupConfig::default();
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let strategy = UnixStrategy::default();
        strategy.install(Tool::BuildGenerator, &mut session).unwrap();
        strategy.install(Tool::BuildRunner, &mut session).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(
            calls.iter().filter(|c| *c == "sudo apt-get update").count(),
            1
        );
        assert_eq!(calls.last().unwrap(), "sudo apt-get install -y ninja-build");
    }

    #[test]
    fn test_apt_qt_install_that_yields_no_qt6_only_warns() {
        let runner = ScriptedRunner::new()
            .reply("sudo apt-get update", CommandOutput::ok(""))
            .reply(
                "sudo apt-get install -y qt6-base-dev qt6-declarative-dev qt6-tools-dev-tools",
                CommandOutput::ok(""),
            )
            .reply(
                "qmake -v",
                CommandOutput::ok("Using Qt version 5.15.8 in /usr/lib\n"),
            );
        let config = SetupConfig::default();
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let result = UnixStrategy::default().install(Tool::GuiRuntime, &mut session);
        assert!(matches!(result, Ok(None)));
        assert!(runner.called("qmake6 -v"));
    }

    #[test]
    fn test_apt_failure_is_an_error() {
        let runner = ScriptedRunner::new()
            .reply("sudo apt-get update", CommandOutput::ok(""))
            .reply(
                "sudo apt-get install -y g++",
                CommandOutput::failed(100, "E: Unable to locate package"),
            );
        let config = SetupConfig::default();
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let err = UnixStrategy::default()
            .install(Tool::Compiler, &mut session)
            .unwrap_err();
        assert!(err.to_string().contains("g++"));
    }

    #[test]
    fn test_no_apt_means_no_primary_installer() {
        let temp = tempfile::TempDir::new().unwrap();
        let runner = ScriptedRunner::new();
        let config = SetupConfig::default();
        let session = Session::new(&runner, &config, env(&temp.path().display().to_string()));
        assert!(!UnixStrategy::default().has_primary_installer(Tool::Compiler, &session));
    }

    #[test]
    fn test_qt_probe_reports_version() {
        let runner = ScriptedRunner::new().reply(
            "qmake6 -v",
            CommandOutput::ok("QMake version 3.1\nUsing Qt version 6.4.2 in /usr/lib\n"),
        );
        let config = SetupConfig::default();
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let status = UnixStrategy::default().probe(Tool::GuiRuntime, &mut session);
        assert!(status.present);
        assert_eq!(status.detail.as_deref(), Some("6.4.2"));
    }

    #[test]
    fn test_windows_executables_and_venv_layout() {
        let strategy = WindowsStrategy;
        assert_eq!(strategy.executable(Tool::Compiler), "cl");
        assert_eq!(strategy.venv_scripts_dir(), "Scripts");
        assert_eq!(strategy.host(), AqtHost::Windows);
    }

    #[test]
    fn test_windows_elevation_follows_net_session() {
        let admin = ScriptedRunner::new().reply("net session", CommandOutput::ok(""));
        assert!(WindowsStrategy.is_elevated(&admin));

        let user = ScriptedRunner::new().reply("net session", CommandOutput::failed(2, "denied"));
        assert!(!WindowsStrategy.is_elevated(&user));
    }

    fn write_executable(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }
    }

    #[test]
    fn test_windows_compiler_probe_activates_located_toolchain() {
        let root = tempfile::TempDir::new().unwrap();
        let edition = root.path().join("2022").join("Community");
        let script = edition.join("VC").join("Auxiliary").join("Build").join("vcvarsall.bat");
        std::fs::create_dir_all(script.parent().unwrap()).unwrap();
        std::fs::write(&script, "@echo off\r\n").unwrap();

        let bin = edition.join("VC").join("Tools").join("bin");
        write_executable(&bin.join(probe::executable_file_name("cl")));
        let include = edition.join("VC").join("include");

        let mut config = SetupConfig::default();
        config.toolchain.roots = vec![root.path().to_path_buf()];
        let located = ToolchainLocator::new(&config.toolchain).locate().unwrap();
        assert_eq!(located.activation_script, script);

        let command = format!(
            "cmd /C call \"{}\" {} && set",
            script.display(),
            host_arch()
        );
        let dump = format!(
            "Path={}\r\nINCLUDE={}\r\nVSCMD_VER=17.0\r\n",
            bin.display(),
            include.display()
        );
        let runner = ScriptedRunner::new().reply(&command, CommandOutput::ok(dump));
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let status = WindowsStrategy.probe_compiler(&mut session);

        assert!(runner.called(&command));
        assert!(status.present);
        assert_eq!(
            status.resolved_path.as_deref().and_then(Path::parent),
            Some(bin.as_path())
        );
        assert_eq!(session.env.var("PATH"), Some(bin.to_str().unwrap()));
        assert_eq!(session.env.var("INCLUDE"), Some(include.to_str().unwrap()));
        assert_eq!(session.env.var("VSCMD_VER"), None);
    }

    #[test]
    fn test_windows_compiler_probe_without_toolchain_is_absent() {
        let root = tempfile::TempDir::new().unwrap();
        let mut config = SetupConfig::default();
        config.toolchain.roots = vec![root.path().join("missing")];
        let runner = ScriptedRunner::new();
        let mut session = Session::new(&runner, &config, env("/nowhere"));

        let status = WindowsStrategy.probe_compiler(&mut session);
        assert!(!status.present);
        assert!(runner.calls.borrow().is_empty());
    }
}
