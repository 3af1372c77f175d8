//! Contains the formatting logic for the [RtContext] struct.

use super::RtContext;
use crate::{
    branch::{PairState, ReviewTrackingBranchPair},
    constants::{
        BAD_COLOR, BRANCH_COLOR, EMPTY_CIRCLE, FILLED_CIRCLE, MUTED_COLOR, NEW_COLOR, OK_COLOR,
    },
    git::RefGateway,
};
use anyhow::Result;
use std::fmt::{Display, Write};
use tracing::warn;

impl RtContext {
    /// Gathers a list of [DisplayReview]s for every review branch that still exists.
    ///
    /// This function is particularly useful when creating prompts with [inquire::Select].
    pub fn display_reviews(&self) -> Result<Vec<DisplayReview>> {
        let mut reviews = Vec::new();
        for found in self.discover()?.pairs {
            let pair = found.into_pair(&self.gateway)?;
            if pair.review_tip().is_none() {
                continue;
            }

            let mut display_value = String::new();
            write_pair(&mut display_value, &pair)?;
            reviews.push(DisplayReview {
                display_value,
                branch_name: pair.review_branch_name(),
            });
        }
        Ok(reviews)
    }

    /// Prints the status of every review in the repository.
    pub fn print_status(&self) -> Result<()> {
        let mut buf = String::new();
        self.write_status(&mut buf)?;
        print!("{}", buf);
        Ok(())
    }

    /// Writes the status of every review in the repository to the given [Write]r.
    pub fn write_status<W: Write>(&self, w: &mut W) -> Result<()> {
        let discovery = self.discover()?;

        for found in discovery.pairs {
            let name = found.review_name();
            match found.into_pair(&self.gateway) {
                Ok(pair) => write_pair(w, &pair)?,
                // A broken pair must not hide the others.
                Err(e) => warn!("Skipping `{}`: {}", name, e),
            }
            writeln!(w)?;
        }

        for name in discovery.malformed {
            writeln!(w, "{}", MUTED_COLOR.paint(format!("malformed: {}", name)))?;
        }
        for name in discovery.collisions {
            writeln!(w, "{}", MUTED_COLOR.paint(format!("collision: {}", name)))?;
        }
        Ok(())
    }
}

/// Writes the log-line of a single pair: freshness marker, review name, state and id.
fn write_pair<W: Write, G: RefGateway>(
    w: &mut W,
    pair: &ReviewTrackingBranchPair<'_, G>,
) -> Result<()> {
    let marker = if pair.has_new_commits() {
        FILLED_CIRCLE
    } else {
        EMPTY_CIRCLE
    };
    let state = pair.state();
    let color = match state {
        PairState::New => NEW_COLOR,
        PairState::Active(status) if !status.is_bad() => OK_COLOR,
        PairState::Null | PairState::Abandoned(_) => MUTED_COLOR,
        PairState::Active(_) => BAD_COLOR,
    };

    write!(
        w,
        "{} {} {}",
        marker,
        BRANCH_COLOR.paint(pair.review_branch_name()),
        color.paint(state.to_string())
    )?;
    if let Some(id) = pair.review_id_or_none() {
        write!(w, " #{}", id)?;
    }
    Ok(())
}

/// A pair of a log-line and a review branch name, which implements [Display].
#[derive(Debug)]
pub struct DisplayReview {
    /// The log-line to display.
    pub(crate) display_value: String,
    /// The review branch name corresponding to the log-line.
    pub(crate) branch_name: String,
}

impl Display for DisplayReview {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_value)
    }
}
