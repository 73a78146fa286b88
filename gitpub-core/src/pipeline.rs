//! The publish pipeline: reset, copy, commit, push
//!
//! One publish run is a fixed sequence of four stages with explicit data
//! handoff between them. The checkout handle opened by the reset stage is
//! owned by the run and released when the run ends, on success and on
//! failure alike.

use std::path::PathBuf;

use crate::config::ResolvedPublish;
use crate::content::copy_contents;
use crate::git::{reconcile, CommitOutcome, PushOutcome};
use crate::paths::PathMatcher;
use crate::{Error, Result};

/// Stage of a publish run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishPhase {
    /// Reconciling the checkout with the target remote branch
    #[default]
    Reset,
    /// Copying generated content into the checkout
    Copy,
    /// Recording the changes
    Commit,
    /// Pushing the branch upstream
    Push,
    /// Run complete
    Complete,
    /// Run failed
    Failed,
}

impl PublishPhase {
    /// Get the next phase in a successful run
    pub fn next(&self) -> Option<PublishPhase> {
        match self {
            PublishPhase::Reset => Some(PublishPhase::Copy),
            PublishPhase::Copy => Some(PublishPhase::Commit),
            PublishPhase::Commit => Some(PublishPhase::Push),
            PublishPhase::Push => Some(PublishPhase::Complete),
            PublishPhase::Complete | PublishPhase::Failed => None,
        }
    }

    /// Get a human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            PublishPhase::Reset => "Preparing the checkout for new content",
            PublishPhase::Copy => "Copying content into the checkout",
            PublishPhase::Commit => "Committing changes",
            PublishPhase::Push => "Pushing to the remote",
            PublishPhase::Complete => "Publish complete",
            PublishPhase::Failed => "Publish failed",
        }
    }

    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, PublishPhase::Complete | PublishPhase::Failed)
    }
}

impl std::fmt::Display for PublishPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Summary of a finished publish run
#[derive(Debug, Clone)]
pub struct PublishReport {
    /// Branch published to
    pub branch: String,
    /// Checkout directory used for the run
    pub repo_dir: PathBuf,
    /// Whether the branch existed remotely before the run
    pub branch_existed_remotely: bool,
    /// Number of files copied into the checkout
    pub files_copied: usize,
    /// Commit created, if anything changed
    pub commit: Option<String>,
    /// Whether the branch was pushed
    pub pushed: bool,
}

/// Run the full publish pipeline for a resolved plan.
pub fn run_publish(publish: &ResolvedPublish) -> Result<PublishReport> {
    if publish.sources.is_empty() {
        return Err(Error::Config(
            "contents.sources is empty, nothing to publish".to_string(),
        ));
    }
    let exclude = PathMatcher::new(&publish.exclude)?;

    let mut phase = PublishPhase::Reset;
    tracing::info!(branch = %publish.branch, repo = %publish.repo_uri, "starting publish run");

    let result = run_stages(publish, &exclude, &mut phase);
    if result.is_err() {
        transition(&mut phase, PublishPhase::Failed);
    }
    result
}

fn run_stages(
    publish: &ResolvedPublish,
    exclude: &PathMatcher,
    phase: &mut PublishPhase,
) -> Result<PublishReport> {
    // the checkout handle lives for exactly this scope; dropping it at the
    // end of the run (or on an early return) releases the native resources
    let reconciliation = reconcile(&publish.reconcile_request())?;

    transition(phase, PublishPhase::Copy);
    let files_copied = copy_contents(&publish.sources, exclude, reconciliation.repo.root())?;

    transition(phase, PublishPhase::Commit);
    let commit = reconciliation.repo.commit_contents(&publish.message)?;

    transition(phase, PublishPhase::Push);
    let push = reconciliation.repo.push_branch(&publish.branch)?;

    transition(phase, PublishPhase::Complete);
    Ok(PublishReport {
        branch: reconciliation.branch,
        repo_dir: publish.repo_dir.clone(),
        branch_existed_remotely: reconciliation.branch_existed_remotely,
        files_copied,
        commit: match commit {
            CommitOutcome::Committed(id) => Some(id),
            CommitOutcome::NoChanges => None,
        },
        pushed: matches!(push, PushOutcome::Pushed(_)),
    })
}

fn transition(phase: &mut PublishPhase, to: PublishPhase) {
    tracing::info!(from = ?phase, to = ?to, "publish phase transition");
    *phase = to;
}
