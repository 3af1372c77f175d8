//! The transitions of a [ReviewTrackingBranchPair].
//!
//! Each transition renders the next tracking branch name and publishes it with a single
//! atomic gateway edit, so at no point are two tracking branches live for one review.

use super::{PairState, ReviewTrackingBranchPair};
use crate::{
    errors::{BranchError, BranchResult},
    git::{Expect, RefEdit, RefGateway},
    naming::{
        make_tracking_name, parse_tracking, role_of, BranchRole, TipRef,
        TrackingBranchDescription, TrackingStatus,
    },
};
use tracing::{info, warn};

impl<'g, G: RefGateway> ReviewTrackingBranchPair<'g, G> {
    /// Starts tracking a new review that was opened successfully as `review_id`.
    pub fn mark_ok_new_review(&mut self, review_id: u64) -> BranchResult<()> {
        self.create_tracking(
            "mark_ok_new_review",
            TrackingStatus::OkInReview,
            Some(review_id),
        )
    }

    /// Starts tracking a new review that was opened as `review_id` but is already bad.
    pub fn mark_new_bad_in_review(&mut self, review_id: u64) -> BranchResult<()> {
        self.create_tracking(
            "mark_new_bad_in_review",
            TrackingStatus::BadInReview,
            Some(review_id),
        )
    }

    /// Starts tracking a review branch that could not be turned into a review.
    pub fn mark_bad_pre_review(&mut self) -> BranchResult<()> {
        self.create_tracking("mark_bad_pre_review", TrackingStatus::BadPreReview, None)
    }

    pub fn mark_bad_in_review(&mut self) -> BranchResult<()> {
        self.rewrite_tracking("mark_bad_in_review", TrackingStatus::BadInReview)
    }

    /// Marks the review as good, keeping its review id if it has one.
    pub fn mark_ok_in_review(&mut self) -> BranchResult<()> {
        self.rewrite_tracking("mark_ok_in_review", TrackingStatus::OkInReview)
    }

    pub fn mark_bad_land(&mut self) -> BranchResult<()> {
        self.rewrite_tracking("mark_bad_land", TrackingStatus::BadLand)
    }

    /// Writes the first tracking branch of a [PairState::New] pair.
    fn create_tracking(
        &mut self,
        transition: &'static str,
        status: TrackingStatus,
        review_id: Option<u64>,
    ) -> BranchResult<()> {
        match self.state() {
            PairState::New => self.write_tracking(transition, status, review_id),
            from => Err(BranchError::IllegalTransition { transition, from }),
        }
    }

    /// Replaces the tracking branch of a [PairState::Active] pair.
    fn rewrite_tracking(
        &mut self,
        transition: &'static str,
        status: TrackingStatus,
    ) -> BranchResult<()> {
        match self.state() {
            PairState::Active(_) => {
                let review_id = self.review_id_or_none();
                self.write_tracking(transition, status, review_id)
            }
            from => Err(BranchError::IllegalTransition { transition, from }),
        }
    }

    fn write_tracking(
        &mut self,
        transition: &'static str,
        status: TrackingStatus,
        review_id: Option<u64>,
    ) -> BranchResult<()> {
        if self.stale {
            return Err(BranchError::TransitionConflict(self.review_branch_name()));
        }
        let Some(tip) = self.review_tip else {
            return Err(BranchError::IllegalTransition {
                transition,
                from: self.state(),
            });
        };

        let next = TrackingBranchDescription::new(
            status,
            self.review.clone(),
            review_id,
            TipRef::from_oid(tip),
        );
        let next_name = make_tracking_name(&next);
        let previous = self.tracking_branch_name().zip(self.tracking_target);

        let own = previous.as_ref().map(|(name, _)| name.as_str());
        if let Some(rival) = self.rival_tracking(own)? {
            warn!(
                "`{}` on `{}` found another tracking branch `{}`; pair is stale",
                transition, self.review, rival
            );
            self.stale = true;
            return Err(BranchError::TransitionConflict(rival));
        }

        let edits = match &previous {
            Some((name, target)) if *name == next_name => {
                vec![RefEdit::write(&next_name, tip, Expect::Target(*target))]
            }
            Some((name, target)) => vec![
                RefEdit::write(&next_name, tip, Expect::Absent),
                RefEdit::remove(name, Expect::Target(*target)),
            ],
            None => vec![RefEdit::write(&next_name, tip, Expect::Absent)],
        };

        if let Err(e) = self.gateway.apply(&edits) {
            let e = BranchError::from(e);
            if matches!(e, BranchError::TransitionConflict(_)) {
                warn!(
                    "`{}` on `{}` lost a race; pair is stale",
                    transition, self.review
                );
                self.stale = true;
            }
            return Err(e);
        }

        info!(
            "{} `{}`: {} -> {}",
            transition,
            self.review,
            previous
                .as_ref()
                .map_or("untracked", |(name, _)| name.as_str()),
            next_name
        );
        self.tracking = Some(next);
        self.tracking_target = Some(tip);
        Ok(())
    }

    /// Returns a tracking branch other than `own` that records this same review.
    ///
    /// Writers that saw the review untracked may pick different statuses, and so
    /// different names; this catches the one that comes second.
    fn rival_tracking(&self, own: Option<&str>) -> BranchResult<Option<String>> {
        Ok(self.gateway.list_branches()?.into_iter().find(|name| {
            Some(name.as_str()) != own
                && role_of(name) == Some(BranchRole::Tracking)
                && parse_tracking(name).is_ok_and(|t| t.review() == &self.review)
        }))
    }
}
