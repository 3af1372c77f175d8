//! Pairing review branches with their tracking branches.

use crate::{
    branch::ReviewTrackingBranchPair,
    errors::{BranchResult, GatewayResult},
    git::RefGateway,
    naming::{
        make_review_name, parse_review, parse_tracking, role_of, BranchRole,
        ReviewBranchDescription, TrackingBranchDescription,
    },
};
use std::collections::{btree_map::Entry, BTreeMap};
use tracing::{debug, warn};

/// A review, as found in one branch listing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DiscoveredPair {
    /// A review branch, with its tracking branch if one was listed.
    Review {
        review: ReviewBranchDescription,
        tracking: Option<TrackingBranchDescription>,
    },
    /// A tracking branch whose review branch was not listed.
    Orphan(TrackingBranchDescription),
}

impl DiscoveredPair {
    /// The review branch name this entry is keyed by.
    pub fn review_name(&self) -> String {
        match self {
            Self::Review { review, .. } => make_review_name(review),
            Self::Orphan(tracking) => tracking.review_name(),
        }
    }

    /// Resolves the entry into a [ReviewTrackingBranchPair] through `gateway`.
    pub fn into_pair<G: RefGateway>(
        self,
        gateway: &G,
    ) -> BranchResult<ReviewTrackingBranchPair<'_, G>> {
        match self {
            Self::Review { review, tracking } => {
                ReviewTrackingBranchPair::new(gateway, review, tracking)
            }
            Self::Orphan(tracking) => ReviewTrackingBranchPair::from_tracking(gateway, tracking),
        }
    }
}

/// The result of [discover].
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Discovery {
    /// One entry per review, ordered by review branch name.
    pub pairs: Vec<DiscoveredPair>,
    /// Names carrying a review or tracking prefix that do not parse.
    pub malformed: Vec<String>,
    /// Tracking branches skipped because another tracking branch already claims their
    /// review.
    pub collisions: Vec<String>,
}

impl Discovery {
    /// Finds the entry for the review branch `name`.
    pub fn find(&self, name: &str) -> Option<&DiscoveredPair> {
        self.pairs.iter().find(|p| p.review_name() == name)
    }
}

/// Lists the branches behind `gateway` and groups them into reviews.
///
/// Tracking branches are matched to review branches by base and description. When
/// several tracking branches claim the same review, the first in name order wins and the
/// rest are reported as collisions. Branches with neither prefix are ignored.
pub fn discover<G: RefGateway>(gateway: &G) -> GatewayResult<Discovery> {
    let mut reviews = BTreeMap::new();
    let mut trackers = BTreeMap::new();
    let mut discovery = Discovery::default();

    let mut names = gateway.list_branches()?;
    names.sort();

    for name in names {
        match role_of(&name) {
            Some(BranchRole::Review) => match parse_review(&name) {
                Ok(review) => {
                    reviews.insert(make_review_name(&review), review);
                }
                Err(e) => {
                    warn!("Skipping malformed branch: {}", e);
                    discovery.malformed.push(name);
                }
            },
            Some(BranchRole::Tracking) => match parse_tracking(&name) {
                Ok(tracking) => match trackers.entry(tracking.review_name()) {
                    Entry::Vacant(slot) => {
                        slot.insert(tracking);
                    }
                    Entry::Occupied(winner) => {
                        warn!(
                            "Tracking branch `{}` collides with `{}`, skipping",
                            name,
                            winner.get()
                        );
                        discovery.collisions.push(name);
                    }
                },
                Err(e) => {
                    warn!("Skipping malformed branch: {}", e);
                    discovery.malformed.push(name);
                }
            },
            None => {}
        }
    }

    for (name, review) in reviews {
        let tracking = trackers.remove(&name);
        discovery
            .pairs
            .push(DiscoveredPair::Review { review, tracking });
    }
    discovery
        .pairs
        .extend(trackers.into_values().map(DiscoveredPair::Orphan));
    discovery.pairs.sort_by_key(DiscoveredPair::review_name);

    debug!(
        "Discovered {} review(s), {} malformed, {} colliding",
        discovery.pairs.len(),
        discovery.malformed.len(),
        discovery.collisions.len()
    );
    Ok(discovery)
}
