//! Launch script generation
//!
//! `run_netter.bat` / `run_netter.sh` put `target/release` on PATH (once),
//! configure and build the project with CMake and Ninja when the executable
//! is missing, and run it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::SetupConfig;
use crate::environment::host_arch;
use crate::error::{self, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPlatform {
    Windows,
    Unix,
}

impl ScriptPlatform {
    pub fn host() -> Self {
        if cfg!(windows) { Self::Windows } else { Self::Unix }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::Windows => "run_netter.bat",
            Self::Unix => "run_netter.sh",
        }
    }
}

/// Everything the script needs to know about the project layout
#[derive(Debug, Clone)]
pub struct ScriptPaths {
    pub project_name: String,
    pub project_dir: PathBuf,
    pub build_dir: PathBuf,
    /// Added to PATH by the script
    pub bin_dir: PathBuf,
    pub executable: PathBuf,
    /// MSVC activation script, Windows only
    pub activation_script: Option<PathBuf>,
}

impl ScriptPaths {
    pub fn new(
        project_dir: &Path,
        config: &SetupConfig,
        platform: ScriptPlatform,
        activation_script: Option<PathBuf>,
    ) -> Self {
        let build_dir = project_dir.join(&config.build_dir);
        let suffix = match platform {
            ScriptPlatform::Windows => ".exe",
            ScriptPlatform::Unix => "",
        };
        Self {
            project_name: config.project_name.clone(),
            project_dir: project_dir.to_path_buf(),
            executable: build_dir.join(format!("{}{suffix}", config.project_name)),
            build_dir,
            bin_dir: project_dir.join("target").join("release"),
            activation_script,
        }
    }
}

pub fn generate(platform: ScriptPlatform, paths: &ScriptPaths) -> String {
    match platform {
        ScriptPlatform::Windows => generate_batch(paths),
        ScriptPlatform::Unix => generate_shell(paths),
    }
}

fn generate_batch(paths: &ScriptPaths) -> String {
    let name = &paths.project_name;
    let project = paths.project_dir.display();
    let build = paths.build_dir.display();
    let bin = paths.bin_dir.display();
    let exe = paths.executable.display();

    let activation = match &paths.activation_script {
        Some(script) => format!(
            ":: Set up MSVC environment\r\n\
             echo Setting up MSVC environment...\r\n\
             call \"{}\" {} >nul\r\n\
             if errorlevel 1 echo WARNING: MSVC environment could not be set up\r\n\r\n",
            script.display(),
            host_arch()
        ),
        None => "echo WARNING: Could not find vcvarsall.bat, MSVC environment variables may not be set up\r\n\r\n"
            .to_string(),
    };

    format!(
        "@echo off\r\nsetlocal\r\n\r\n\
         {activation}\
         :: Add {name} to PATH once\r\n\
         echo ;%PATH%; | find /I \";{bin};\" >nul || (\r\n\
         \x20   echo Adding {bin} to PATH...\r\n\
         \x20   setx PATH \"%PATH%;{bin}\" >nul\r\n\
         \x20   set \"PATH=%PATH%;{bin}\"\r\n\
         )\r\n\r\n\
         if not exist \"{build}\" (\r\n\
         \x20   echo Creating build directory and building project...\r\n\
         \x20   mkdir \"{build}\"\r\n\
         \x20   pushd \"{build}\"\r\n\
         \x20   cmake \"{project}\" -G \"Ninja\" && ninja\r\n\
         \x20   popd\r\n\
         )\r\n\r\n\
         if not exist \"{exe}\" (\r\n\
         \x20   echo Building {name}...\r\n\
         \x20   pushd \"{build}\"\r\n\
         \x20   cmake \"{project}\" -G \"Ninja\" && ninja\r\n\
         \x20   popd\r\n\
         )\r\n\r\n\
         if not exist \"{exe}\" goto build_failed\r\n\
         echo Running {name}...\r\n\
         \"{exe}\" %*\r\n\
         exit /b\r\n\r\n\
         :build_failed\r\n\
         echo Failed to build {name}\r\n\
         exit /b 1\r\n"
    )
}

fn generate_shell(paths: &ScriptPaths) -> String {
    let name = &paths.project_name;
    let project = paths.project_dir.display();
    let build = paths.build_dir.display();
    let bin = paths.bin_dir.display();
    let exe = paths.executable.display();

    format!(
        r#"#!/bin/bash

# Add {name} to PATH once
case ":$PATH:" in
    *":{bin}:"*) ;;
    *)
        echo "Adding {bin} to PATH..."
        export PATH="$PATH:{bin}"
        ;;
esac
if ! grep -qF "{bin}" ~/.bashrc 2>/dev/null; then
    echo 'export PATH="$PATH:{bin}"' >> ~/.bashrc
    echo "PATH updated in .bashrc file"
fi

build() {{
    (cd "{build}" && cmake "{project}" -G "Ninja" && ninja)
}}

if [ ! -d "{build}" ]; then
    echo "Creating build directory and building project..."
    mkdir -p "{build}"
    build
fi

if [ ! -f "{exe}" ]; then
    echo "Building {name}..."
    build
fi

if [ -f "{exe}" ]; then
    echo "Running {name}..."
    exec "{exe}" "$@"
fi

echo "Failed to build {name}"
exit 1
"#
    )
}

/// Write the script into the project directory; executable on unix
pub fn write(platform: ScriptPlatform, paths: &ScriptPaths) -> Result<PathBuf> {
    let path = paths.project_dir.join(platform.file_name());
    let write_failed = |e: std::io::Error| error::fs::write_failed(path.display().to_string(), e.to_string());

    fs::write(&path, generate(platform, paths)).map_err(write_failed)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).map_err(write_failed)?;
    }

    tracing::debug!(path = %path.display(), "launch script written");
    Ok(path)
}
