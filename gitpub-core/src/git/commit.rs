//! Commit stage: stage everything, commit only when something changed

use git2::IndexAddOption;

use super::repo::PublishRepo;
use crate::Result;

/// What the commit stage did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// A commit was created with the given id
    Committed(String),
    /// The staged tree matches the branch tip, nothing to record
    NoChanges,
}

impl CommitOutcome {
    /// Commit id, when one was created
    pub fn commit_id(&self) -> Option<&str> {
        match self {
            CommitOutcome::Committed(id) => Some(id),
            CommitOutcome::NoChanges => None,
        }
    }
}

impl PublishRepo {
    /// Stage every addition, modification, and deletion in the working tree
    /// and commit the result.
    ///
    /// Skips the commit when the staged tree equals the branch tip (or the
    /// branch is unborn and nothing is staged). On an unborn branch the
    /// commit is created with no parent.
    pub fn commit_contents(&self, message: &str) -> Result<CommitOutcome> {
        let mut index = self.inner().index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree_id = index.write_tree()?;

        let head_commit = match self.inner().head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };

        match &head_commit {
            Some(parent) if parent.tree_id() == tree_id => {
                tracing::debug!("working tree matches branch tip, skipping commit");
                return Ok(CommitOutcome::NoChanges);
            }
            None if index.is_empty() => {
                tracing::debug!("unborn branch with empty tree, skipping commit");
                return Ok(CommitOutcome::NoChanges);
            }
            _ => {}
        }

        let tree = self.inner().find_tree(tree_id)?;
        let signature = self.inner().signature()?;
        let parents: Vec<&git2::Commit> = head_commit.iter().collect();

        let oid = self
            .inner()
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;

        tracing::info!(commit = %oid, parents = parents.len(), "recorded publish commit");
        Ok(CommitOutcome::Committed(oid.to_string()))
    }
}
