//! gitpub CLI - Publish generated content to a Git branch
//!
//! Resets a local checkout to the target branch, copies build output into
//! it, commits, and pushes.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gitpub_core::Config;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{PublishArgs, ResetArgs};

/// gitpub: publish generated content to a Git branch
#[derive(Parser, Debug)]
#[command(name = "gitpub")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./gitpub.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Repository to publish to (overrides config and env)
    #[arg(long, global = true, env = "GITPUB_REPO_URI")]
    repo_uri: Option<String>,

    /// Branch to publish to (overrides config and env)
    #[arg(short, long, global = true, env = "GITPUB_BRANCH")]
    branch: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show version information
    Version,

    /// Run the full publish pipeline (reset, copy, commit, push)
    #[command(visible_alias = "p")]
    Publish(PublishArgs),

    /// Reset the checkout to the target branch without publishing
    Reset(ResetArgs),

    /// Show current configuration
    Config,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    // Load configuration with overrides
    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        cli.repo_uri.clone(),
        cli.branch.clone(),
    )?;

    match cli.command {
        Some(Commands::Version) => {
            println!("gitpub {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Publish(args)) => {
            args.execute(cli.verbose, &config)?;
        }
        Some(Commands::Reset(args)) => {
            args.execute(cli.verbose, &config)?;
        }
        Some(Commands::Config) => {
            show_config(&cli, &config);
        }
        None => {
            println!("gitpub - publish generated content to a Git branch");
            println!();
            println!("Use --help for usage information");
        }
    }

    Ok(())
}

fn show_config(cli: &Cli, config: &Config) {
    println!("gitpub Configuration");
    println!("====================");
    println!();
    println!("Repository:");
    println!(
        "  uri:           {}",
        config
            .repo
            .uri
            .as_deref()
            .unwrap_or("(inferred from the enclosing repo's origin)")
    );
    println!(
        "  reference_uri: {}",
        config
            .repo
            .reference_uri
            .as_deref()
            .unwrap_or("(enclosing repo, when available)")
    );
    println!(
        "  branch:        {}",
        config.repo.branch.as_deref().unwrap_or("(not set)")
    );
    if let Some(depth) = config.repo.fetch_depth {
        println!("  fetch_depth:   {}", depth);
    }
    println!();
    println!("Contents:");
    if config.contents.sources.is_empty() {
        println!("  sources: (none)");
    } else {
        for source in &config.contents.sources {
            println!("  source: {}", source.display());
        }
    }
    for pattern in &config.contents.exclude {
        println!("  exclude: {}", pattern);
    }
    println!();
    println!("Commit message: {}", config.commit.message);
    for pattern in &config.preserve {
        println!("Preserve: {}", pattern);
    }
    println!(
        "Checkout dir: {}",
        config
            .repo_dir
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(cache default)".to_string())
    );
    println!();

    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(gitpub_core::config::CONFIG_FILE));
    println!("Config file: {}", path.display());
    if path.exists() {
        println!("  (exists)");
    } else {
        println!("  (not found - using defaults)");
    }
}
