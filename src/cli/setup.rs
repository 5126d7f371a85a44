use clap::Parser;

/// Arguments for the setup command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                   Interactive setup, then build and run:\n    netter-setup setup\n\n\
                   Unattended (CI):\n    netter-setup setup --yes --no-launch")]
pub struct SetupArgs {
    /// Do not wait for confirmation after manual installation steps
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Do not run the launch script at the end
    #[arg(long)]
    pub no_launch: bool,
}
