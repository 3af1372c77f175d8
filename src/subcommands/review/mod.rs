//! Subcommands that move a review through its lifecycle.

use crate::ctx::RtContext;
use anyhow::Result;

mod mark;
pub use mark::MarkCmd;

mod land;
pub use land::LandCmd;

/// Returns `branch_name`, prompting the user to select a review branch if it is [None].
fn select_review(ctx: &RtContext, branch_name: Option<String>) -> Result<String> {
    match branch_name {
        Some(name) => Ok(name),
        None => Ok(inquire::Select::new("Select a review", ctx.display_reviews()?)
            .with_formatter(&|f| f.value.branch_name.clone())
            .prompt()?
            .branch_name),
    }
}

/// Asks the user to confirm `question`, unless `yes` was passed.
fn confirm(question: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    Ok(inquire::Confirm::new(question)
        .with_default(false)
        .prompt()?)
}
