use clap::Parser;

/// Arguments for the patch command
#[derive(Parser, Debug)]
#[command(after_help = "The patch is idempotent: running it again leaves the file unchanged.")]
pub struct PatchArgs {
    /// Print the patched descriptor instead of writing it
    #[arg(long)]
    pub dry_run: bool,
}
