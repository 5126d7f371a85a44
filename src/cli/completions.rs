use clap::Parser;
use clap_complete::Shell;

/// Arguments for completions command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  bash:\n    netter-setup completions bash > ~/.local/share/bash-completion/completions/netter-setup\n\n\
                  zsh:\n    netter-setup completions zsh > ~/.zfunc/_netter-setup\n\n\
                  PowerShell:\n    netter-setup completions powershell | Out-String | Invoke-Expression")]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum, ignore_case = true)]
    pub shell: Shell,
}
