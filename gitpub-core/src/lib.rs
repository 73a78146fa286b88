//! gitpub core - Library for publishing generated content to a Git branch
//!
//! This crate provides the building blocks of a publish run: resolving
//! configuration, reconciling a local checkout with a target remote branch,
//! copying content into it, committing, and pushing.

pub mod config;
pub mod content;
pub mod error;
pub mod git;
pub mod paths;
pub mod pipeline;

pub use config::{Config, ResolvedPublish};
pub use error::{Error, Result};
pub use git::{reconcile, CommitOutcome, PublishRepo, PushOutcome, ReconcileRequest, Reconciliation};
pub use paths::PathMatcher;
pub use pipeline::{run_publish, PublishPhase, PublishReport};
