//! `land` subcommand.

use super::{confirm, select_review};
use crate::{ctx::RtContext, errors::BranchError};
use anyhow::Result;
use clap::Args;
use itertools::Itertools;
use nu_ansi_term::Color;

/// CLI arguments for the `land` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct LandCmd {
    /// Name of the review branch. Prompted for if omitted.
    #[clap(index = 1)]
    branch_name: Option<String>,
    /// Message of the landed commit. Defaults to one naming the review and its authors.
    #[clap(short, long)]
    message: Option<String>,
    /// Skip the confirmation prompt.
    #[clap(short, long)]
    yes: bool,
}

impl LandCmd {
    /// Run the `land` subcommand.
    pub fn run(self, ctx: RtContext) -> Result<()> {
        ctx.sync_in()?;
        let branch_name = select_review(&ctx, self.branch_name)?;
        let mut pair = ctx.pair(&branch_name)?;
        let base = pair.base_branch_name()?.to_string();
        let tracking = pair.tracking_branch_name();

        let question = format!(
            "Land `{}` onto `{}`?",
            Color::Blue.paint(&branch_name),
            Color::Blue.paint(&base)
        );
        if !confirm(&question, self.yes)? {
            return Ok(());
        }

        let message = match self.message {
            Some(message) => message,
            None => {
                let authors = pair.get_any_author_emails()?.join(", ");
                format!("{}\n\nAuthors: {}", pair.review().description(), authors)
            }
        };

        let author = ctx.config.land.identity();
        match pair.land(&author, &message) {
            Ok(landed) => {
                let mut touched = vec![base.as_str(), branch_name.as_str()];
                touched.extend(tracking.as_deref());
                ctx.publish(&touched)?;
                println!(
                    "Landed `{}` onto `{}` as {}.",
                    Color::Blue.paint(&branch_name),
                    Color::Blue.paint(&base),
                    Color::Green.paint(landed.to_string())
                );
                Ok(())
            }
            Err(e @ (BranchError::LandConflict(_) | BranchError::NothingToLand(_))) => {
                pair.mark_bad_land()?;
                let current = pair.tracking_branch_name();
                let touched = tracking
                    .iter()
                    .chain(current.iter())
                    .map(String::as_str)
                    .unique()
                    .collect_vec();
                ctx.publish(&touched)?;
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
