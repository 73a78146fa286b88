//! Configuration management for gitpub
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (GITPUB_*)
//! 3. Config file (./gitpub.toml)
//! 4. Default values
//!
//! Loading produces a [`Config`] that may still have holes (no repo URI, no
//! branch). [`Config::resolve`] fills the holes from the Git repository
//! enclosing the working directory and fails on anything that stays
//! unresolved.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::git::ReconcileRequest;
use crate::{Error, Result};

/// Name of the per-project config file searched in the working directory
pub const CONFIG_FILE: &str = "gitpub.toml";

/// Target repository settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct RepoSettings {
    /// URI of the repository to publish to
    ///
    /// When unset, the URL of the remote named "origin" of the enclosing
    /// repository is used.
    pub uri: Option<String>,

    /// Local repository used as an object-transfer source for the first fetch
    pub reference_uri: Option<String>,

    /// Branch to publish to
    pub branch: Option<String>,

    /// Shallow-fetch depth for the publish branch
    pub fetch_depth: Option<u32>,
}

/// What gets copied into the checkout
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ContentsSettings {
    /// Directories whose contents are copied to the checkout root
    pub sources: Vec<PathBuf>,

    /// Globs of source-relative paths to skip while copying
    pub exclude: Vec<String>,
}

/// Commit settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CommitSettings {
    /// Message used for publish commits
    pub message: String,
}

impl Default for CommitSettings {
    fn default() -> Self {
        Self {
            message: "Generated by gitpub.".to_string(),
        }
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Target repository settings
    pub repo: RepoSettings,

    /// Content sources
    pub contents: ContentsSettings,

    /// Commit settings
    pub commit: CommitSettings,

    /// Globs of checkout-relative paths that survive the reset cleanup
    pub preserve: Vec<String>,

    /// Checkout directory override
    ///
    /// Defaults to a per-repository directory under the user cache dir.
    pub repo_dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from `./gitpub.toml` when present
    ///
    /// Returns default config if no file is given and none is found. An
    /// explicitly given path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }

        let default = Path::new(CONFIG_FILE);
        if default.exists() {
            return Self::load_from_file(default);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(Error::Io)?;
        toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Apply environment variable overrides
    ///
    /// Supported variables:
    /// - GITPUB_REPO_URI: repository to publish to
    /// - GITPUB_BRANCH: branch to publish to
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(uri) = std::env::var("GITPUB_REPO_URI") {
            self.repo.uri = Some(uri);
        }

        if let Ok(branch) = std::env::var("GITPUB_BRANCH") {
            self.repo.branch = Some(branch);
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, repo_uri: Option<String>, branch: Option<String>) -> Self {
        if let Some(uri) = repo_uri {
            self.repo.uri = Some(uri);
        }

        if let Some(branch) = branch {
            self.repo.branch = Some(branch);
        }

        self
    }

    /// Load configuration with all overrides applied
    ///
    /// Priority: CLI > env > config file > defaults
    pub fn load_with_overrides(
        path: Option<&Path>,
        repo_uri: Option<String>,
        branch: Option<String>,
    ) -> Result<Self> {
        Ok(Self::load(path)?
            .with_env_overrides()
            .with_cli_overrides(repo_uri, branch))
    }

    /// Resolve every optional setting into a publish plan
    ///
    /// `cwd` anchors the search for an enclosing repository, which supplies
    /// the repo URI (remote named "origin" only) and the reference URI when
    /// they are not set explicitly.
    pub fn resolve(&self, cwd: &Path) -> Result<ResolvedPublish> {
        let enclosing = git2::Repository::discover(cwd).ok();

        let repo_uri = match &self.repo.uri {
            Some(uri) => uri.clone(),
            None => origin_url(enclosing.as_ref()).ok_or_else(|| {
                Error::Config(
                    "repo.uri is not set and the enclosing repository has no remote named 'origin'"
                        .to_string(),
                )
            })?,
        };

        let reference_uri = self
            .repo
            .reference_uri
            .clone()
            .or_else(|| enclosing.as_ref().and_then(workdir_file_uri));

        let branch = self
            .repo
            .branch
            .clone()
            .ok_or_else(|| Error::Config("repo.branch is not set".to_string()))?;

        let repo_dir = match &self.repo_dir {
            Some(dir) => dir.clone(),
            None => default_repo_dir(&repo_uri)?,
        };

        Ok(ResolvedPublish {
            repo_uri,
            reference_uri,
            branch,
            fetch_depth: self.repo.fetch_depth,
            repo_dir,
            sources: self.contents.sources.clone(),
            exclude: self.contents.exclude.clone(),
            preserve: self.preserve.clone(),
            message: self.commit.message.clone(),
        })
    }
}

/// A fully resolved publish plan: every option filled in or defaulted
#[derive(Debug, Clone)]
pub struct ResolvedPublish {
    /// Repository to publish to
    pub repo_uri: String,
    /// Local object-transfer source for the first fetch
    pub reference_uri: Option<String>,
    /// Branch to publish to
    pub branch: String,
    /// Shallow-fetch depth
    pub fetch_depth: Option<u32>,
    /// Checkout directory
    pub repo_dir: PathBuf,
    /// Directories whose contents are copied to the checkout root
    pub sources: Vec<PathBuf>,
    /// Globs skipped while copying
    pub exclude: Vec<String>,
    /// Globs that survive the reset cleanup
    pub preserve: Vec<String>,
    /// Commit message
    pub message: String,
}

impl ResolvedPublish {
    /// The reset-stage request for this plan
    pub fn reconcile_request(&self) -> ReconcileRequest {
        ReconcileRequest {
            repo_dir: self.repo_dir.clone(),
            repo_uri: self.repo_uri.clone(),
            reference_uri: self.reference_uri.clone(),
            branch: self.branch.clone(),
            preserve: self.preserve.clone(),
            fetch_depth: self.fetch_depth,
        }
    }
}

/// URL of the remote literally named "origin", if any.
///
/// Other remotes are never considered, so resolution fails when "origin" is
/// absent even if the repository has remotes under different names.
fn origin_url(repo: Option<&git2::Repository>) -> Option<String> {
    repo.and_then(|r| r.find_remote("origin").ok())
        .and_then(|remote| remote.url().map(str::to_string))
}

/// file:// URI of a repository's working directory
fn workdir_file_uri(repo: &git2::Repository) -> Option<String> {
    repo.workdir()
        .and_then(|dir| url::Url::from_file_path(dir).ok())
        .map(|u| u.to_string())
}

/// Default checkout location: `<cache>/gitpub/repos/<slug>`
fn default_repo_dir(repo_uri: &str) -> Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| Error::Config("Could not determine cache directory".to_string()))?;

    Ok(cache_dir.join("gitpub").join("repos").join(repo_slug(repo_uri)))
}

/// Directory-name slug for a repository URI
///
/// Takes the final path segment, strips a ".git" suffix, and replaces
/// separator characters that cannot appear in a file name.
pub fn repo_slug(uri: &str) -> String {
    let trimmed = uri.trim_end_matches('/');
    let tail = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed)
        .trim_end_matches(".git");

    let safe: String = tail
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '@' => '-',
            c => c,
        })
        .collect();

    if safe.is_empty() {
        "repo".to_string()
    } else {
        safe
    }
}
