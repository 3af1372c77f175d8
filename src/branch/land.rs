//! Landing an accepted review onto its base.

use super::{PairState, ReviewTrackingBranchPair};
use crate::{
    errors::{BranchError, BranchResult},
    git::{Expect, Identity, MergeOutcome, RefEdit, RefGateway},
    naming::TrackingStatus,
};
use git2::Oid;
use tracing::{info, warn};

impl<'g, G: RefGateway> ReviewTrackingBranchPair<'g, G> {
    /// Squashes the review branch onto its base, then removes both the review and the
    /// tracking branch.
    ///
    /// Only a review in good standing whose tip is the one it was accepted at can land.
    ///
    /// The base update and both removals are one atomic edit. A crash before it leaves
    /// only an unreferenced commit behind, so landing can simply be retried.
    ///
    /// ## Takes
    /// - `author` - The author recorded on the landed commit.
    /// - `message` - The message of the landed commit.
    ///
    /// ## Returns
    /// - `Ok(Oid)` - The new tip of the base branch.
    /// - `Err(BranchError::LandConflict)` - If the review does not merge cleanly.
    /// - `Err(BranchError::NothingToLand)` - If the review would not change its base.
    /// - `Err(BranchError::TransitionConflict)` - If any of the three branches moved.
    /// - `Err(BranchError::IllegalTransition)` - If the review is not
    ///   [TrackingStatus::OkInReview] or has commits pushed since it was marked.
    pub fn land(&mut self, author: &Identity, message: &str) -> BranchResult<Oid> {
        let state = self.state();
        let (
            PairState::Active(TrackingStatus::OkInReview),
            Some(review_tip),
            Some(tracking_target),
        ) = (state, self.review_tip, self.tracking_target)
        else {
            return Err(BranchError::IllegalTransition {
                transition: "land",
                from: state,
            });
        };
        // Commits pushed after the review was accepted have not been reviewed.
        if self.has_new_commits() {
            return Err(BranchError::IllegalTransition {
                transition: "land",
                from: state,
            });
        }
        if self.stale {
            return Err(BranchError::TransitionConflict(self.review_branch_name()));
        }

        let base = self.base_branch_name()?.to_string();
        let base_tip = self
            .gateway
            .resolve(&base)?
            .ok_or_else(|| BranchError::InvalidBase(base.clone()))?;

        let review_name = self.review_branch_name();
        let landed = match self
            .gateway
            .squash_merge(base_tip, review_tip, author, message)?
        {
            MergeOutcome::Merged(oid) => oid,
            MergeOutcome::Conflicted => return Err(BranchError::LandConflict(review_name)),
            MergeOutcome::Empty => return Err(BranchError::NothingToLand(review_name)),
        };

        let tracking_name = self.tracking_branch_name().unwrap_or_default();
        let result = self.gateway.apply(&[
            RefEdit::write(&base, landed, Expect::Target(base_tip)),
            RefEdit::remove(&review_name, Expect::Target(review_tip)),
            RefEdit::remove(&tracking_name, Expect::Target(tracking_target)),
        ]);
        if let Err(e) = result {
            let e = BranchError::from(e);
            if matches!(e, BranchError::TransitionConflict(_)) {
                warn!("Landing `{}` lost a race; pair is stale", review_name);
                self.stale = true;
            }
            return Err(e);
        }

        info!("Landed `{}` onto `{}` as {}", review_name, base, landed);
        self.review_tip = None;
        self.tracking = None;
        self.tracking_target = None;
        Ok(landed)
    }
}

#[cfg(test)]
mod test {
    use crate::{
        branch::{PairState, ReviewTrackingBranchPair},
        errors::BranchError,
        git::{GitGateway, Identity, RefGateway},
        naming::{parse_review, TrackingStatus},
        test_utils::Fixture,
    };

    const BRANCH: &str = "r/master/landing";

    fn lander() -> Identity {
        Identity::new("alice", "alice@example.com")
    }

    fn in_review(fixture: &Fixture) -> ReviewTrackingBranchPair<'_, GitGateway> {
        let mut pair =
            ReviewTrackingBranchPair::new(&fixture.gateway, parse_review(BRANCH).unwrap(), None)
                .unwrap();
        pair.mark_ok_new_review(11).unwrap();
        pair
    }

    #[test]
    fn lands_onto_base() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        fixture.commit_on(BRANCH, "two.txt", "alice");
        let mut pair = in_review(&fixture);

        let landed = pair.land(&lander(), "landing").unwrap();

        assert_eq!(pair.state(), PairState::Null);
        assert_eq!(fixture.gateway.resolve("master").unwrap(), Some(landed));
        assert_eq!(fixture.gateway.list_branches().unwrap(), vec!["master"]);

        let commit = fixture.repository().find_commit(landed).unwrap();
        assert_eq!(commit.parent_ids().collect::<Vec<_>>(), vec![fixture.master]);
        assert_eq!(commit.author().name(), Some("alice"));
        assert_eq!(commit.message(), Some("landing"));
        assert!(commit.tree().unwrap().get_name("two.txt").is_some());
    }

    #[test]
    fn conflicting_review_is_not_landed() {
        let fixture = Fixture::new();
        fixture.write_on(BRANCH, "README", "review side", "alice");
        fixture.write_on("master", "README", "base side", "bob");
        let base_tip = fixture.gateway.resolve("master").unwrap();
        let mut pair = in_review(&fixture);

        assert!(matches!(
            pair.land(&lander(), "landing"),
            Err(BranchError::LandConflict(ref name)) if name == BRANCH
        ));
        assert_eq!(fixture.gateway.resolve("master").unwrap(), base_tip);

        pair.mark_bad_land().unwrap();
        assert_eq!(pair.state(), PairState::Active(TrackingStatus::BadLand));
        assert_eq!(pair.review_id_or_none(), Some(11));
    }

    #[test]
    fn already_merged_review_has_nothing_to_land() {
        let fixture = Fixture::new();
        fixture.point(BRANCH, fixture.master);
        let mut pair = in_review(&fixture);

        assert!(matches!(
            pair.land(&lander(), "landing"),
            Err(BranchError::NothingToLand(_))
        ));
    }

    #[test]
    fn lands_onto_moved_base() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        let mut pair = in_review(&fixture);
        let theirs = fixture.commit_on("master", "theirs.txt", "bob");

        let landed = pair.land(&lander(), "landing").unwrap();

        let commit = fixture.repository().find_commit(landed).unwrap();
        assert_eq!(commit.parent_ids().collect::<Vec<_>>(), vec![theirs]);
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("one.txt").is_some());
        assert!(tree.get_name("theirs.txt").is_some());
    }

    #[test]
    fn cannot_land_untracked_review() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        let mut pair =
            ReviewTrackingBranchPair::new(&fixture.gateway, parse_review(BRANCH).unwrap(), None)
                .unwrap();

        assert!(matches!(
            pair.land(&lander(), "landing"),
            Err(BranchError::IllegalTransition {
                from: PairState::New,
                ..
            })
        ));
    }

    #[test]
    fn review_pushed_during_landing() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        let mut pair = in_review(&fixture);
        fixture.commit_on(BRANCH, "late.txt", "alice");

        let error = pair.land(&lander(), "landing").unwrap_err();
        assert!(matches!(error, BranchError::TransitionConflict(_)));
        assert!(pair.is_stale());
        assert_eq!(
            fixture.gateway.resolve("master").unwrap(),
            Some(fixture.master)
        );
    }

    #[test]
    fn rejected_review_cannot_land() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        let mut pair =
            ReviewTrackingBranchPair::new(&fixture.gateway, parse_review(BRANCH).unwrap(), None)
                .unwrap();
        pair.mark_bad_pre_review().unwrap();

        assert!(matches!(
            pair.land(&lander(), "landing"),
            Err(BranchError::IllegalTransition {
                from: PairState::Active(TrackingStatus::BadPreReview),
                ..
            })
        ));
        assert_eq!(
            fixture.gateway.resolve("master").unwrap(),
            Some(fixture.master)
        );
    }

    #[test]
    fn unreviewed_commits_cannot_land() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "one.txt", "alice");
        let accepted = in_review(&fixture);
        fixture.commit_on(BRANCH, "sneaky.txt", "mallory");

        let mut pair = ReviewTrackingBranchPair::new(
            &fixture.gateway,
            parse_review(BRANCH).unwrap(),
            accepted.tracking().cloned(),
        )
        .unwrap();
        assert!(pair.has_new_commits());

        let error = pair.land(&lander(), "landing").unwrap_err();
        assert!(error.is_usage_error());
        assert_eq!(
            fixture.gateway.resolve("master").unwrap(),
            Some(fixture.master)
        );
        assert!(!pair.is_stale());
    }
}
