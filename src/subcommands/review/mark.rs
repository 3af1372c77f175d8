//! `mark` subcommand.

use super::{confirm, select_review};
use crate::{constants::TIP_LEN, ctx::RtContext};
use anyhow::{anyhow, Result};
use clap::{Args, ValueEnum};
use itertools::Itertools;
use nu_ansi_term::Color;

/// The transitions `mark` can apply.
#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Transition {
    /// Start tracking a new review in good standing. Requires `--review-id`.
    OkNewReview,
    /// Start tracking a new review that is already in a bad state. Requires `--review-id`.
    NewBadInReview,
    /// Reject a review before it was opened.
    BadPreReview,
    BadInReview,
    OkInReview,
    /// Record a failed landing attempt.
    BadLand,
}

/// CLI arguments for the `mark` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct MarkCmd {
    /// The transition to apply.
    #[clap(value_enum)]
    transition: Transition,
    /// Name of the review branch. Prompted for if omitted.
    branch_name: Option<String>,
    /// The id assigned to the review by the review host.
    #[clap(long)]
    review_id: Option<u64>,
    /// Skip the confirmation prompt.
    #[clap(short, long)]
    yes: bool,
}

impl MarkCmd {
    /// Run the `mark` subcommand.
    pub fn run(self, ctx: RtContext) -> Result<()> {
        ctx.sync_in()?;
        let branch_name = select_review(&ctx, self.branch_name)?;
        let mut pair = ctx.pair(&branch_name)?;
        let previous = pair.tracking_branch_name();
        if pair.is_new() {
            pair.verify_review_branch_base()?;
        }

        if pair.has_new_commits() {
            let commits = pair.describe_new_commits()?;
            println!("New commits on `{}`:", Color::Blue.paint(&branch_name));
            for commit in &commits {
                println!(
                    "  {} {} ({})",
                    Color::Yellow.paint(&commit.id.to_string()[..TIP_LEN]),
                    commit.summary,
                    commit.author.email
                );
            }
        }

        let question = format!(
            "Mark `{}` ({}) as {:?}?",
            Color::Blue.paint(&branch_name),
            pair.state(),
            self.transition
        );
        if !confirm(&question, self.yes)? {
            return Ok(());
        }

        let review_id = || {
            self.review_id
                .ok_or_else(|| anyhow!("{:?} requires `--review-id`.", self.transition))
        };
        match self.transition {
            Transition::OkNewReview => pair.mark_ok_new_review(review_id()?)?,
            Transition::NewBadInReview => pair.mark_new_bad_in_review(review_id()?)?,
            Transition::BadPreReview => pair.mark_bad_pre_review()?,
            Transition::BadInReview => pair.mark_bad_in_review()?,
            Transition::OkInReview => pair.mark_ok_in_review()?,
            Transition::BadLand => pair.mark_bad_land()?,
        }

        // Publish the old name as well, so that the remote drops it.
        let current = pair.tracking_branch_name();
        let touched = previous
            .iter()
            .chain(current.iter())
            .map(String::as_str)
            .unique()
            .collect_vec();
        ctx.publish(&touched)?;

        println!(
            "Marked `{}` as {}.",
            Color::Blue.paint(&branch_name),
            Color::Green.paint(pair.state().to_string())
        );
        Ok(())
    }
}
