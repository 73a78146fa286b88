//! Git operations for gitpub
//!
//! This module wraps everything gitpub does to a repository: reconciling the
//! publish checkout with the target branch, committing staged content, and
//! pushing the result upstream.

mod commit;
mod push;
mod reconcile;
mod repo;

pub use commit::CommitOutcome;
pub use push::PushOutcome;
pub use reconcile::{reconcile, ReconcileRequest, Reconciliation};
pub use repo::PublishRepo;
