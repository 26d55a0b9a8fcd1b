//! Command abstraction for the navigation tree.

use async_trait::async_trait;

use crate::error::Result;
use crate::shell::context::ShellContext;

/// An action command attached to a shell node. Commands declared on the
/// root node are global: the tree materializes them into every
/// descendant's command table at construction, so they resolve identically
/// at any depth.
#[async_trait]
pub trait Command: Send + Sync {
    fn name(&self) -> &str;

    /// One-line description shown by `help`.
    fn help(&self) -> &str;

    async fn run(&self, ctx: &ShellContext, args: &[String]) -> Result<()>;
}
