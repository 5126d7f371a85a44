use clap::Parser;

/// Arguments for the resolve command
#[derive(Parser, Debug)]
pub struct ResolveArgs {
    /// Print the resolution as JSON
    #[arg(long)]
    pub json: bool,
}
