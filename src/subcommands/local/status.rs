//! `status` subcommand.

use crate::ctx::RtContext;
use anyhow::Result;
use clap::Args;

/// CLI arguments for the `status` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct StatusCmd;

impl StatusCmd {
    /// Run the `status` subcommand.
    pub fn run(self, ctx: RtContext) -> Result<()> {
        ctx.sync_in()?;
        ctx.print_status()
    }
}
