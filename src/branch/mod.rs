//! The review/tracking branch pair: one logical code review, persisted as two branches.
//!
//! A [ReviewTrackingBranchPair] is built fresh every cycle from the current branch
//! listing, queried, moved through at most one transition and then dropped. All state
//! lives in the branch names; nothing is cached between cycles.

use crate::{
    errors::{BranchError, BranchResult},
    git::RefGateway,
    naming::{
        make_review_name, make_tracking_name, ReviewBranchDescription, TrackingBranchDescription,
        TrackingStatus,
    },
};
use git2::Oid;
use std::fmt::{self, Display};
use tracing::{debug, warn};

mod authors;
mod land;
mod transitions;

/// The state of a [ReviewTrackingBranchPair], derived from which of its branches exist
/// and what the tracking branch name records.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum PairState {
    /// Neither branch exists.
    Null,
    /// The review branch exists and has never been tracked.
    New,
    /// The tracking branch outlived its review branch.
    Abandoned(TrackingStatus),
    /// Both branches exist.
    Active(TrackingStatus),
}

impl PairState {
    /// The recorded status, if a tracking branch exists.
    pub fn status(self) -> Option<TrackingStatus> {
        match self {
            Self::Null | Self::New => None,
            Self::Abandoned(status) | Self::Active(status) => Some(status),
        }
    }
}

impl Display for PairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::New => f.write_str("new"),
            Self::Abandoned(status) => write!(f, "abandoned ({})", status),
            Self::Active(status) => write!(f, "{}", status),
        }
    }
}

/// A review branch together with its tracking branch, if any.
pub struct ReviewTrackingBranchPair<'g, G: RefGateway> {
    gateway: &'g G,
    review: ReviewBranchDescription,
    /// The review branch tip when the pair was built, [None] if it did not resolve.
    review_tip: Option<Oid>,
    tracking: Option<TrackingBranchDescription>,
    /// The object the tracking branch points at, present iff `tracking` is.
    tracking_target: Option<Oid>,
    /// Set once a write lost a race; the pair must be rebuilt before another transition.
    stale: bool,
}

impl<'g, G: RefGateway> ReviewTrackingBranchPair<'g, G> {
    /// Builds a pair, resolving both branches through `gateway`.
    ///
    /// A `tracking` description whose branch no longer resolves is dropped, leaving the
    /// pair untracked.
    pub fn new(
        gateway: &'g G,
        review: ReviewBranchDescription,
        tracking: Option<TrackingBranchDescription>,
    ) -> BranchResult<Self> {
        let review_tip = gateway.resolve(&make_review_name(&review))?;

        let (tracking, tracking_target) = match tracking {
            Some(tracking) => match gateway.resolve(&make_tracking_name(&tracking))? {
                Some(target) => (Some(tracking), Some(target)),
                None => {
                    warn!(
                        "Tracking branch `{}` vanished, treating `{}` as untracked",
                        tracking,
                        review
                    );
                    (None, None)
                }
            },
            None => (None, None),
        };

        let pair = Self {
            gateway,
            review,
            review_tip,
            tracking,
            tracking_target,
            stale: false,
        };
        debug!("Built pair for `{}`: {}", pair.review, pair.state());
        Ok(pair)
    }

    /// Builds the pair a tracking branch belongs to.
    pub fn from_tracking(gateway: &'g G, tracking: TrackingBranchDescription) -> BranchResult<Self> {
        let review = tracking.review().clone();
        Self::new(gateway, review, Some(tracking))
    }

    /// The current state of the pair.
    pub fn state(&self) -> PairState {
        match (self.review_tip, &self.tracking) {
            (None, None) => PairState::Null,
            (Some(_), None) => PairState::New,
            (None, Some(tracking)) => PairState::Abandoned(tracking.status()),
            (Some(_), Some(tracking)) => PairState::Active(tracking.status()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self.state(), PairState::Null)
    }

    pub fn is_new(&self) -> bool {
        matches!(self.state(), PairState::New)
    }

    pub fn is_abandoned(&self) -> bool {
        matches!(self.state(), PairState::Abandoned(_))
    }

    pub fn is_status_bad_pre_review(&self) -> bool {
        self.status() == Some(TrackingStatus::BadPreReview)
    }

    pub fn is_status_bad_in_review(&self) -> bool {
        self.status() == Some(TrackingStatus::BadInReview)
    }

    pub fn is_status_ok_in_review(&self) -> bool {
        self.status() == Some(TrackingStatus::OkInReview)
    }

    pub fn is_status_bad_land(&self) -> bool {
        self.status() == Some(TrackingStatus::BadLand)
    }

    /// Returns `true` if the recorded status is any of the bad statuses.
    pub fn is_status_bad(&self) -> bool {
        self.status().is_some_and(TrackingStatus::is_bad)
    }

    fn status(&self) -> Option<TrackingStatus> {
        self.state().status()
    }

    /// The name of the branch the review merges into.
    ///
    /// ## Returns
    /// - `Err(BranchError::Inconsistent)` - If the tracking branch records a different
    ///   review than the review branch describes.
    pub fn base_branch_name(&self) -> BranchResult<&str> {
        match &self.tracking {
            Some(tracking) if tracking.review() != &self.review => {
                Err(BranchError::Inconsistent {
                    review: make_review_name(&self.review),
                    tracking: make_tracking_name(tracking),
                })
            }
            _ => Ok(self.review.base()),
        }
    }

    pub fn review_branch_name(&self) -> String {
        make_review_name(&self.review)
    }

    pub fn tracking_branch_name(&self) -> Option<String> {
        self.tracking.as_ref().map(make_tracking_name)
    }

    /// The review id, once one has been assigned by a transition.
    pub fn review_id_or_none(&self) -> Option<u64> {
        self.tracking.as_ref().and_then(|t| t.review_id())
    }

    pub fn review(&self) -> &ReviewBranchDescription {
        &self.review
    }

    pub fn tracking(&self) -> Option<&TrackingBranchDescription> {
        self.tracking.as_ref()
    }

    pub fn review_tip(&self) -> Option<Oid> {
        self.review_tip
    }

    /// Returns `true` once a transition lost a race against another writer.
    pub fn is_stale(&self) -> bool {
        self.stale
    }

    /// Returns `true` if the review branch moved since the tracking branch was written.
    ///
    /// An untracked review always has new commits; a pair without a review branch never
    /// does.
    pub fn has_new_commits(&self) -> bool {
        match (self.review_tip, &self.tracking) {
            (Some(_), None) => true,
            (Some(tip), Some(tracking)) => !tracking.tip().matches(tip),
            (None, _) => false,
        }
    }

    /// Checks that the base named by the review branch exists.
    ///
    /// ## Returns
    /// - `Err(BranchError::BaseBranchNotFound)` - If the base does not resolve.
    pub fn verify_review_branch_base(&self) -> BranchResult<()> {
        let base = self.review.base();
        match self.gateway.resolve(base)? {
            Some(_) => Ok(()),
            None => Err(BranchError::BaseBranchNotFound(base.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{PairState, ReviewTrackingBranchPair};
    use crate::{
        errors::BranchError,
        git::GitGateway,
        naming::{
            make_tracking_name, parse_review, ReviewBranchDescription, TipRef,
            TrackingBranchDescription, TrackingStatus,
        },
        test_utils::Fixture,
    };

    const BRANCH: &str = "r/master/untracked";

    fn untracked(fixture: &Fixture) -> ReviewTrackingBranchPair<'_, GitGateway> {
        fixture.commit_on(BRANCH, "README.md", "alice");
        let review = parse_review(BRANCH).unwrap();
        let pair = ReviewTrackingBranchPair::new(&fixture.gateway, review, None).unwrap();
        pair.verify_review_branch_base().unwrap();
        pair
    }

    #[test]
    fn new_branch() {
        let fixture = Fixture::new();
        let pair = untracked(&fixture);

        assert_eq!(pair.state(), PairState::New);
        assert!(pair.is_new());
        assert!(!pair.is_abandoned());
        assert!(!pair.is_null());
        assert!(!pair.is_status_bad_pre_review());
        assert!(!pair.is_status_bad_in_review());
        assert!(!pair.is_status_bad_land());
        assert!(!pair.is_status_bad());
        assert!(pair.has_new_commits());
        assert_eq!(pair.base_branch_name().unwrap(), "master");
        assert_eq!(pair.review_branch_name(), BRANCH);
        assert_eq!(pair.review_id_or_none(), None);
        assert_eq!(pair.tracking_branch_name(), None);
    }

    #[test]
    fn null_when_nothing_exists() {
        let fixture = Fixture::new();
        let review = parse_review(BRANCH).unwrap();
        let pair = ReviewTrackingBranchPair::new(&fixture.gateway, review, None).unwrap();

        assert_eq!(pair.state(), PairState::Null);
        assert!(pair.is_null());
        assert!(!pair.is_new());
        assert!(!pair.has_new_commits());
    }

    #[test]
    fn abandoned_keeps_recorded_status() {
        for status in TrackingStatus::ALL {
            let fixture = Fixture::new();
            let review = ReviewBranchDescription::new("gone", "master").unwrap();
            let tracking = TrackingBranchDescription::new(
                status,
                review,
                Some(7),
                TipRef::from_oid(fixture.master),
            );
            fixture.point(&make_tracking_name(&tracking), fixture.master);

            let pair = ReviewTrackingBranchPair::from_tracking(&fixture.gateway, tracking).unwrap();
            assert_eq!(pair.state(), PairState::Abandoned(status));
            assert!(pair.is_abandoned());
            assert!(!pair.is_null());
            assert!(!pair.is_new());
            assert_eq!(
                pair.is_status_bad_pre_review(),
                status == TrackingStatus::BadPreReview
            );
            assert_eq!(
                pair.is_status_bad_in_review(),
                status == TrackingStatus::BadInReview
            );
            assert_eq!(pair.is_status_bad_land(), status == TrackingStatus::BadLand);
            assert_eq!(pair.is_status_bad(), status.is_bad());
            assert_eq!(pair.review_id_or_none(), Some(7));
            assert!(!pair.has_new_commits());
        }
    }

    #[test]
    fn vanished_tracking_branch_is_dropped() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "README.md", "alice");
        let review = parse_review(BRANCH).unwrap();
        let tracking = TrackingBranchDescription::new(
            TrackingStatus::OkInReview,
            review.clone(),
            Some(1),
            TipRef::from_oid(fixture.master),
        );

        let pair = ReviewTrackingBranchPair::new(&fixture.gateway, review, Some(tracking)).unwrap();
        assert!(pair.is_new());
    }

    #[test]
    fn inconsistent_base() {
        let fixture = Fixture::new();
        fixture.commit_on(BRANCH, "README.md", "alice");
        let review = parse_review(BRANCH).unwrap();
        let tracking = TrackingBranchDescription::new(
            TrackingStatus::OkInReview,
            ReviewBranchDescription::new("untracked", "develop").unwrap(),
            Some(1),
            TipRef::from_oid(fixture.master),
        );
        fixture.point(&make_tracking_name(&tracking), fixture.master);

        let pair = ReviewTrackingBranchPair::new(&fixture.gateway, review, Some(tracking)).unwrap();
        assert!(matches!(
            pair.base_branch_name(),
            Err(BranchError::Inconsistent { .. })
        ));
    }

    #[test]
    fn missing_base_branch() {
        let fixture = Fixture::new();
        let branch = "r/develop/orphan";
        fixture.commit_on(branch, "README.md", "alice");
        let pair =
            ReviewTrackingBranchPair::new(&fixture.gateway, parse_review(branch).unwrap(), None)
                .unwrap();

        assert!(matches!(
            pair.verify_review_branch_base(),
            Err(BranchError::BaseBranchNotFound(ref base)) if base == "develop"
        ));
    }
}
