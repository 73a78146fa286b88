//! Checkout reconciliation, the reset stage of a publish run
//!
//! Brings a local checkout directory into a known clean state matching the
//! target remote branch: reuse or recreate the repository, resolve the
//! branch (tracking checkout or fresh orphan), then prune the working tree
//! down to the preserve list.

use std::path::{Path, PathBuf};

use auth_git2::GitAuthenticator;
use git2::build::CheckoutBuilder;
use git2::{AutotagOption, Direction, FetchOptions, Repository};

use super::repo::{credential_callbacks, PublishRepo, ORIGIN_REMOTE, REFERENCE_REMOTE};
use crate::paths::PathMatcher;
use crate::{Error, Result};

/// Everything the reset stage needs to know
#[derive(Debug, Clone)]
pub struct ReconcileRequest {
    /// Directory holding (or about to hold) the publish checkout
    pub repo_dir: PathBuf,
    /// URI of the repository to publish to
    pub repo_uri: String,
    /// Optional local repository used to pre-seed objects
    pub reference_uri: Option<String>,
    /// Branch to publish to
    pub branch: String,
    /// Globs of checkout-relative paths that survive cleaning
    pub preserve: Vec<String>,
    /// Shallow-fetch depth
    pub fetch_depth: Option<u32>,
}

/// Result of a successful reset: an open checkout positioned on the branch
///
/// HEAD points at the target branch in every case. When the branch did not
/// exist remotely it is unborn, and the first commit will have no parent.
#[derive(Debug)]
pub struct Reconciliation {
    /// Branch the checkout is positioned on
    pub branch: String,
    /// Whether the branch existed on the remote at fetch time
    pub branch_existed_remotely: bool,
    /// Remote tip commit id at fetch time
    pub remote_tip: Option<String>,
    /// The open checkout
    pub repo: PublishRepo,
}

/// Reconcile the checkout directory with the target remote branch.
///
/// Destructive by design: uncommitted state from a prior interrupted run is
/// discarded, so re-running is always safe.
pub fn reconcile(request: &ReconcileRequest) -> Result<Reconciliation> {
    if !git2::Branch::name_is_valid(&request.branch).unwrap_or(false) {
        return Err(Error::InvalidBranch(request.branch.clone()));
    }

    let preserve = PathMatcher::new(&request.preserve)?;

    let repo = open_or_create(request)?;
    let remote_tip = repo.remote_branch_tip(&request.repo_uri, &request.branch)?;

    match remote_tip {
        Some(tip) => {
            if request.reference_uri.is_some() {
                repo.seed_from_reference(&request.branch);
            }
            repo.fetch_publish_branch(&request.repo_uri, &request.branch, request.fetch_depth)?;
            repo.checkout_tracking(&request.branch)?;
            tracing::info!(branch = %request.branch, tip = %tip, "checked out publish branch at remote tip");
        }
        None => {
            repo.checkout_orphan(&request.branch)?;
            tracing::info!(branch = %request.branch, "remote branch not found, starting orphan");
        }
    }

    repo.clean_worktree(&preserve)?;

    Ok(Reconciliation {
        branch: request.branch.clone(),
        branch_existed_remotely: remote_tip.is_some(),
        remote_tip: remote_tip.map(|oid| oid.to_string()),
        repo,
    })
}

/// Reuse the checkout when its origin matches the request, else recreate it.
fn open_or_create(request: &ReconcileRequest) -> Result<PublishRepo> {
    if let Some(existing) = open_matching(request) {
        // clear merge/rebase leftovers from an interrupted run
        existing.inner().cleanup_state()?;
        if let Some(reference_uri) = &request.reference_uri {
            existing.set_reference_remote(reference_uri)?;
        }
        tracing::debug!(dir = %request.repo_dir.display(), "reusing existing checkout");
        return Ok(existing);
    }

    if request.repo_dir.exists() {
        tracing::info!(dir = %request.repo_dir.display(), "discarding unusable checkout");
        std::fs::remove_dir_all(&request.repo_dir)?;
    }

    std::fs::create_dir_all(&request.repo_dir)?;
    let repo = Repository::init(&request.repo_dir)?;
    repo.remote(ORIGIN_REMOTE, &request.repo_uri)?;
    if let Some(reference_uri) = &request.reference_uri {
        repo.remote(REFERENCE_REMOTE, reference_uri)?;
    }

    tracing::debug!(dir = %request.repo_dir.display(), "initialized fresh checkout");
    PublishRepo::from_repo(repo)
}

fn open_matching(request: &ReconcileRequest) -> Option<PublishRepo> {
    let repo = PublishRepo::open(&request.repo_dir).ok()?;
    (repo.origin_url().as_deref() == Some(request.repo_uri.as_str())).then_some(repo)
}

impl PublishRepo {
    /// ls-remote the origin and return the target branch tip, if the branch
    /// exists there.
    ///
    /// A connection failure means the remote cannot be contacted at all.
    pub(crate) fn remote_branch_tip(&self, url: &str, branch: &str) -> Result<Option<git2::Oid>> {
        let auth = GitAuthenticator::default();
        let git_config = self.inner().config()?;
        let mut remote = self.inner().find_remote(ORIGIN_REMOTE)?;

        let connection = remote
            .connect_auth(
                Direction::Fetch,
                Some(credential_callbacks(&auth, &git_config)),
                None,
            )
            .map_err(|e| Error::remote_unreachable(url, &e))?;

        let wanted = format!("refs/heads/{branch}");
        let tip = connection
            .list()
            .map_err(|e| Error::remote_unreachable(url, &e))?
            .iter()
            .find(|head| head.name() == wanted)
            .map(|head| head.oid());

        Ok(tip)
    }

    /// Fetch the publish branch from origin into its remote-tracking ref.
    pub(crate) fn fetch_publish_branch(
        &self,
        url: &str,
        branch: &str,
        depth: Option<u32>,
    ) -> Result<()> {
        let auth = GitAuthenticator::default();
        let git_config = self.inner().config()?;
        let mut remote = self.inner().find_remote(ORIGIN_REMOTE)?;

        let mut options = FetchOptions::new();
        options.remote_callbacks(credential_callbacks(&auth, &git_config));
        options.download_tags(AutotagOption::None);
        if let Some(depth) = depth {
            options.depth(depth as i32);
        }

        let refspec = format!("+refs/heads/{branch}:refs/remotes/origin/{branch}");
        remote
            .fetch(&[refspec.as_str()], Some(&mut options), None)
            .map_err(|e| Error::from_transport(url, e))?;

        Ok(())
    }

    /// Point the reference remote at `uri`, adding it when missing.
    pub(crate) fn set_reference_remote(&self, uri: &str) -> Result<()> {
        if self.inner().find_remote(REFERENCE_REMOTE).is_ok() {
            self.inner().remote_set_url(REFERENCE_REMOTE, uri)?;
        } else {
            self.inner().remote(REFERENCE_REMOTE, uri)?;
        }
        Ok(())
    }

    /// Best-effort object pre-seeding from the reference remote.
    ///
    /// Failures are logged and ignored: the origin fetch that follows is
    /// authoritative.
    pub(crate) fn seed_from_reference(&self, branch: &str) {
        match self.fetch_from_reference(branch) {
            Ok(true) => tracing::debug!(branch = %branch, "seeded objects from reference repository"),
            Ok(false) => {}
            Err(e) => {
                tracing::warn!(branch = %branch, error = %e, "reference repository fetch failed, continuing without it");
            }
        }
    }

    fn fetch_from_reference(&self, branch: &str) -> Result<bool> {
        let auth = GitAuthenticator::default();
        let git_config = self.inner().config()?;
        let mut remote = self.inner().find_remote(REFERENCE_REMOTE)?;

        let wanted = format!("refs/heads/{branch}");
        let connection = remote.connect_auth(
            Direction::Fetch,
            Some(credential_callbacks(&auth, &git_config)),
            None,
        )?;
        let exists = connection.list()?.iter().any(|head| head.name() == wanted);
        drop(connection);

        if !exists {
            return Ok(false);
        }

        let mut options = FetchOptions::new();
        options.remote_callbacks(credential_callbacks(&auth, &git_config));
        options.download_tags(AutotagOption::None);

        let refspec = format!("+refs/heads/{branch}:refs/remotes/reference/{branch}");
        remote.fetch(&[refspec.as_str()], Some(&mut options), None)?;

        Ok(true)
    }

    /// Force the local branch to the fetched remote tip and check it out.
    pub(crate) fn checkout_tracking(&self, branch: &str) -> Result<()> {
        let tracking = self
            .inner()
            .find_reference(&format!("refs/remotes/origin/{branch}"))?;
        let tip = tracking.peel_to_commit()?.id();

        // direct ref write works whether or not the branch is checked out
        let local_ref = format!("refs/heads/{branch}");
        self.inner()
            .reference(&local_ref, tip, true, &format!("gitpub: reset {branch} to {tip}"))?;
        self.inner().set_head(&local_ref)?;

        let mut checkout = CheckoutBuilder::new();
        checkout.force();
        self.inner().checkout_head(Some(&mut checkout))?;

        Ok(())
    }

    /// Point HEAD at an unborn branch that inherits nothing.
    pub(crate) fn checkout_orphan(&self, branch: &str) -> Result<()> {
        let local_ref = format!("refs/heads/{branch}");
        if let Ok(mut existing) = self.inner().find_reference(&local_ref) {
            existing.delete()?;
        }
        self.inner().set_head(&local_ref)?;

        // no parent commit and no tree entries
        let mut index = self.inner().index()?;
        index.clear()?;
        index.write()?;

        Ok(())
    }

    /// Delete every working-tree file that matches no preserve pattern.
    ///
    /// Directories left empty are removed; `.git` always survives.
    pub(crate) fn clean_worktree(&self, preserve: &PathMatcher) -> Result<()> {
        clean_dir(self.root(), self.root(), preserve)?;
        Ok(())
    }
}

fn clean_dir(dir: &Path, root: &Path, preserve: &PathMatcher) -> std::io::Result<bool> {
    let mut empty = true;

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();

        if dir == root && entry.file_name() == ".git" {
            empty = false;
            continue;
        }

        if entry.file_type()?.is_dir() {
            if clean_dir(&path, root, preserve)? {
                std::fs::remove_dir(&path)?;
            } else {
                empty = false;
            }
        } else {
            let relative = path.strip_prefix(root).unwrap_or(&path);
            if preserve.matches(relative) {
                empty = false;
            } else {
                std::fs::remove_file(&path)?;
            }
        }
    }

    Ok(empty)
}
