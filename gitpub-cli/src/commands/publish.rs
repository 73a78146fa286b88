//! Publish command - run the full pipeline

use std::path::PathBuf;

use clap::Args;
use gitpub_core::{run_publish, Config};

/// Arguments for the publish command
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Source directory to publish (repeatable, overrides config)
    #[arg(short, long)]
    pub source: Vec<PathBuf>,

    /// Commit message (overrides config)
    #[arg(short, long)]
    pub message: Option<String>,

    /// Show what would be published without touching anything
    #[arg(long)]
    pub dry_run: bool,
}

impl PublishArgs {
    /// Execute the publish command
    pub fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let mut config = config.clone();
        if !self.source.is_empty() {
            config.contents.sources = self.source.clone();
        }
        if let Some(message) = &self.message {
            config.commit.message = message.clone();
        }

        let cwd = std::env::current_dir()?;
        let publish = config.resolve(&cwd)?;

        if verbose {
            tracing::info!(
                repo = %publish.repo_uri,
                branch = %publish.branch,
                repo_dir = %publish.repo_dir.display(),
                "resolved publish plan"
            );
        }

        println!("gitpub Publish");
        println!("==============");
        println!();
        println!("Repository: {}", publish.repo_uri);
        println!("Branch:     {}", publish.branch);
        println!("Checkout:   {}", publish.repo_dir.display());
        for source in &publish.sources {
            println!("Source:     {}", source.display());
        }
        println!();

        if self.dry_run {
            println!("[Dry run] Would reset the checkout, copy the sources, commit, and push");
            return Ok(());
        }

        let report = run_publish(&publish)?;

        println!("Files copied: {}", report.files_copied);
        match &report.commit {
            Some(id) => println!("Commit:       {}", id),
            None => println!("Commit:       (no changes)"),
        }
        if report.pushed {
            println!("Push:         {} -> {}", report.branch, publish.repo_uri);
        } else {
            println!("Push:         (up to date)");
        }

        Ok(())
    }
}
