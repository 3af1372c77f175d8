//! `authors` subcommand.

use crate::ctx::RtContext;
use anyhow::Result;
use clap::Args;

/// CLI arguments for the `authors` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct AuthorsCmd {
    /// Name of the review branch.
    #[clap(index = 1)]
    branch_name: String,
    /// Fall back to the author of the review tip if the review has no commits of its own.
    #[clap(long)]
    any: bool,
    /// Print author names next to their emails.
    #[clap(short, long, conflicts_with = "any")]
    names: bool,
}

impl AuthorsCmd {
    /// Run the `authors` subcommand.
    pub fn run(self, ctx: RtContext) -> Result<()> {
        ctx.sync_in()?;
        let pair = ctx.pair(&self.branch_name)?;

        if self.names {
            for (name, email) in pair.get_author_names_emails()? {
                println!("{} <{}>", name, email);
            }
            return Ok(());
        }

        let emails = if self.any {
            pair.get_any_author_emails()?
        } else {
            pair.get_author_emails()?
        };
        emails.iter().for_each(|email| println!("{}", email));
        Ok(())
    }
}
