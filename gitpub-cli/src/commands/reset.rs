//! Reset command - reconcile the checkout without publishing
//!
//! Useful for inspecting the state a publish run would start from.

use clap::Args;
use gitpub_core::{reconcile, Config};

/// Arguments for the reset command
#[derive(Args, Debug)]
pub struct ResetArgs {}

impl ResetArgs {
    /// Execute the reset command
    pub fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let cwd = std::env::current_dir()?;
        let publish = config.resolve(&cwd)?;

        if verbose {
            tracing::info!(
                repo = %publish.repo_uri,
                branch = %publish.branch,
                repo_dir = %publish.repo_dir.display(),
                "resolved reset target"
            );
        }

        let result = reconcile(&publish.reconcile_request())?;

        println!("Checkout ready:");
        println!("  Path:   {}", result.repo.root().display());
        println!("  Branch: {}", result.branch);
        match &result.remote_tip {
            Some(tip) => println!("  Tip:    {} (remote)", tip),
            None => println!("  Tip:    (new branch, no commits yet)"),
        }

        Ok(())
    }
}
