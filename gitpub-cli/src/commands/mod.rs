//! CLI command implementations

pub mod publish;
pub mod reset;

pub use publish::PublishArgs;
pub use reset::ResetArgs;
