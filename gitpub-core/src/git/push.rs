//! Push stage: publish the branch upstream when the tip moved

use auth_git2::GitAuthenticator;
use git2::PushOptions;

use super::repo::{credential_callbacks, PublishRepo, ORIGIN_REMOTE};
use crate::{Error, Result};

/// What the push stage did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// The branch was pushed at the given tip
    Pushed(String),
    /// The remote already has the local tip (or there is nothing to push)
    UpToDate,
}

impl PublishRepo {
    /// Push the branch to origin unless the remote already has it.
    ///
    /// An unborn branch (nothing ever committed) has nothing to push. The
    /// push is a plain non-force update, so a rewritten remote surfaces as a
    /// git error instead of being clobbered.
    pub fn push_branch(&self, branch: &str) -> Result<PushOutcome> {
        let local_ref = format!("refs/heads/{branch}");
        let local_tip = match self.inner().find_reference(&local_ref) {
            Ok(reference) => reference.peel_to_commit()?.id(),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                tracing::debug!(branch = %branch, "branch has no commits, nothing to push");
                return Ok(PushOutcome::UpToDate);
            }
            Err(e) => return Err(e.into()),
        };

        let tracking_ref = format!("refs/remotes/origin/{branch}");
        if let Ok(tracking) = self.inner().find_reference(&tracking_ref) {
            if tracking.target() == Some(local_tip) {
                tracing::debug!(branch = %branch, tip = %local_tip, "remote already at local tip");
                return Ok(PushOutcome::UpToDate);
            }
        }

        let auth = GitAuthenticator::default();
        let git_config = self.inner().config()?;
        let mut remote = self.inner().find_remote(ORIGIN_REMOTE)?;
        let url = remote.url().unwrap_or_default().to_string();

        let mut options = PushOptions::new();
        options.remote_callbacks(credential_callbacks(&auth, &git_config));

        let refspec = format!("{local_ref}:{local_ref}");
        remote
            .push(&[refspec.as_str()], Some(&mut options))
            .map_err(|e| Error::from_transport(&url, e))?;

        // mirror what a porcelain push does, so the next run sees the
        // remote as current
        self.inner().reference(
            &tracking_ref,
            local_tip,
            true,
            &format!("gitpub: push {branch}"),
        )?;

        tracing::info!(branch = %branch, tip = %local_tip, "pushed publish branch");
        Ok(PushOutcome::Pushed(local_tip.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::Repository;
    use std::fs;
    use std::path::Path;

    fn publish_repo_with_commit(path: &Path, branch: &str, remote_url: &str) -> PublishRepo {
        let repo = Repository::init(path).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
        drop(config);
        repo.set_head(&format!("refs/heads/{branch}")).unwrap();
        repo.remote(ORIGIN_REMOTE, remote_url).unwrap();
        drop(repo);

        let publish = PublishRepo::open(path).unwrap();
        fs::write(path.join("index.html"), "hello").unwrap();
        publish.commit_contents("init").unwrap();
        publish
    }

    #[test]
    fn test_push_creates_remote_branch() {
        let dir = tempfile::tempdir().unwrap();
        let remote_dir = dir.path().join("remote.git");
        Repository::init_bare(&remote_dir).unwrap();

        let checkout = dir.path().join("checkout");
        fs::create_dir_all(&checkout).unwrap();
        let publish =
            publish_repo_with_commit(&checkout, "gh-pages", remote_dir.to_str().unwrap());

        let outcome = publish.push_branch("gh-pages").unwrap();
        let tip = match outcome {
            PushOutcome::Pushed(tip) => tip,
            PushOutcome::UpToDate => panic!("expected a push"),
        };

        let remote = Repository::open_bare(&remote_dir).unwrap();
        let pushed = remote
            .find_reference("refs/heads/gh-pages")
            .unwrap()
            .target()
            .unwrap();
        assert_eq!(pushed.to_string(), tip);

        // the tracking ref was updated locally too
        assert!(publish
            .inner()
            .find_reference("refs/remotes/origin/gh-pages")
            .is_ok());
    }

    #[test]
    fn test_second_push_is_up_to_date() {
        let dir = tempfile::tempdir().unwrap();
        let remote_dir = dir.path().join("remote.git");
        Repository::init_bare(&remote_dir).unwrap();

        let checkout = dir.path().join("checkout");
        fs::create_dir_all(&checkout).unwrap();
        let publish =
            publish_repo_with_commit(&checkout, "gh-pages", remote_dir.to_str().unwrap());

        assert!(matches!(
            publish.push_branch("gh-pages").unwrap(),
            PushOutcome::Pushed(_)
        ));
        assert_eq!(publish.push_branch("gh-pages").unwrap(), PushOutcome::UpToDate);
    }

    #[test]
    fn test_unborn_branch_has_nothing_to_push() {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        repo.set_head("refs/heads/gh-pages").unwrap();
        repo.remote(ORIGIN_REMOTE, "https://example.com/site.git")
            .unwrap();
        drop(repo);

        let publish = PublishRepo::open(dir.path()).unwrap();
        assert_eq!(publish.push_branch("gh-pages").unwrap(), PushOutcome::UpToDate);
    }
}
