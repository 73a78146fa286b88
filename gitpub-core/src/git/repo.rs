//! Publish checkout handle

use std::path::{Path, PathBuf};

use auth_git2::GitAuthenticator;
use git2::{RemoteCallbacks, Repository};

use crate::{Error, Result};

/// The remote a publish checkout pushes to and fetches from
pub(crate) const ORIGIN_REMOTE: &str = "origin";

/// Optional local remote used to pre-seed objects before the first fetch
pub(crate) const REFERENCE_REMOTE: &str = "reference";

/// An open publish checkout.
///
/// Owns the underlying repository handle; dropping the value releases the
/// native resources, so the handle lives exactly as long as one publish run.
pub struct PublishRepo {
    /// The underlying git2 repository
    repo: Repository,
    /// Path to the checkout root
    root: PathBuf,
}

impl std::fmt::Debug for PublishRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublishRepo")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl PublishRepo {
    /// Wrap an already opened repository
    pub(crate) fn from_repo(repo: Repository) -> Result<Self> {
        let root = repo
            .workdir()
            .ok_or_else(|| Error::Config("Bare repositories are not supported".to_string()))?
            .to_path_buf();

        Ok(Self { repo, root })
    }

    /// Open the repository rooted exactly at `path`.
    ///
    /// No upward discovery: the publish checkout often lives inside another
    /// repository's working tree, and discovery would walk out of it.
    pub fn open(path: &Path) -> Result<Self> {
        let repo = Repository::open(path)?;
        Self::from_repo(repo)
    }

    /// Get the checkout root path
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Get access to the underlying git2 repository
    pub fn inner(&self) -> &Repository {
        &self.repo
    }

    /// URL configured for the "origin" remote, if any
    pub fn origin_url(&self) -> Option<String> {
        self.repo
            .find_remote(ORIGIN_REMOTE)
            .ok()
            .and_then(|remote| remote.url().map(str::to_string))
    }

    /// Get the current branch name
    ///
    /// Returns `Ok(None)` for a detached HEAD. An unborn branch reports its
    /// name, since that is where the next commit will land.
    pub fn current_branch(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => {
                let reference = self.repo.find_reference("HEAD")?;
                let target = reference
                    .symbolic_target()
                    .and_then(|name| name.strip_prefix("refs/heads/"))
                    .map(str::to_string);
                return Ok(target);
            }
            Err(e) => return Err(e.into()),
        };

        if head.is_branch() {
            Ok(head.shorthand().map(str::to_string))
        } else {
            Ok(None)
        }
    }

    /// Whether HEAD points at a branch with no commits yet
    pub fn head_is_unborn(&self) -> bool {
        matches!(
            self.repo.head(),
            Err(ref e) if e.code() == git2::ErrorCode::UnbornBranch
        )
    }
}

/// Remote callbacks wired to the user's credential configuration.
///
/// Covers credential helpers, ssh-agent, and askpass the way the git CLI
/// would; local-path remotes never invoke them.
pub(crate) fn credential_callbacks<'a>(
    auth: &'a GitAuthenticator,
    git_config: &'a git2::Config,
) -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(auth.credentials(git_config));
    callbacks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_rejects_missing_repo() {
        let dir = tempfile::tempdir().unwrap();
        assert!(PublishRepo::open(dir.path()).is_err());
    }

    #[test]
    fn test_open_reports_root_and_origin() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.remote(ORIGIN_REMOTE, "https://example.com/site.git")
            .unwrap();
        drop(repo);

        let publish = PublishRepo::open(dir.path()).unwrap();
        assert_eq!(
            publish.root().canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
        assert_eq!(
            publish.origin_url().as_deref(),
            Some("https://example.com/site.git")
        );
    }

    #[test]
    fn test_unborn_head_reports_branch_name() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/gh-pages").unwrap();
        drop(repo);

        let publish = PublishRepo::open(dir.path()).unwrap();
        assert!(publish.head_is_unborn());
        assert_eq!(publish.current_branch().unwrap().as_deref(), Some("gh-pages"));
    }
}
