//! Translation between review/tracking branch names and their structured descriptions.
//!
//! Branch names are the only persisted form of review state, so everything past this
//! module deals in [ReviewBranchDescription] and [TrackingBranchDescription] instead of
//! raw names. The layout is:
//!
//! ```text
//! review:   r/<base>/<description>
//! tracking: dev/rt/v1/<status>/<review-id|none>/<tip>/<base>/<description>
//! ```
//!
//! `<base>` may itself contain `/`; `<description>` is always the final component.

use crate::{
    constants::{
        MAX_DESCRIPTION_LEN, MIN_TIP_LEN, NO_REVIEW_ID, REVIEW_PREFIX, TIP_LEN, TRACKING_PREFIX,
    },
    errors::NamingError,
};
use git2::Oid;
use std::fmt::{self, Display};

/// The role a branch plays in a review.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum BranchRole {
    /// Authored by a developer; proposes work against a base.
    Review,
    /// Owned by `rt`; records the status of a review.
    Tracking,
}

/// Classifies a branch name by its prefix.
///
/// Only the prefix is inspected, so a name classified as [BranchRole::Review] may still
/// fail [parse_review].
pub fn role_of(name: &str) -> Option<BranchRole> {
    if name.starts_with(TRACKING_PREFIX) {
        Some(BranchRole::Tracking)
    } else if name.starts_with(REVIEW_PREFIX) {
        Some(BranchRole::Review)
    } else {
        None
    }
}

/// The parsed form of a review branch name.
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct ReviewBranchDescription {
    base: String,
    description: String,
}

impl ReviewBranchDescription {
    /// Creates a new [ReviewBranchDescription].
    ///
    /// ## Takes
    /// - `description` - The review topic. Must be a single name-safe component; see
    ///   [sanitize_description] for turning free-form text into one.
    /// - `base` - The name of the branch the review merges into.
    ///
    /// ## Returns
    /// - `Err(NamingError::InvalidComponent)` - If either part is not name-safe.
    pub fn new(
        description: impl Into<String>,
        base: impl Into<String>,
    ) -> Result<Self, NamingError> {
        let description = description.into();
        let base = base.into();

        if !is_valid_component(&description) {
            return Err(NamingError::InvalidComponent(description));
        }
        if let Some(bad) = base.split('/').find(|c| !is_valid_component(c)) {
            return Err(NamingError::InvalidComponent(bad.to_string()));
        }

        Ok(Self { base, description })
    }

    /// The review topic.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The branch the review merges into.
    pub fn base(&self) -> &str {
        &self.base
    }
}

impl Display for ReviewBranchDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", REVIEW_PREFIX, self.base, self.description)
    }
}

/// The status of a review, as recorded in its tracking branch.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum TrackingStatus {
    /// Rejected before a review was opened.
    BadPreReview,
    /// A review exists, but the branch is in a bad state.
    BadInReview,
    /// A review exists and is in good standing.
    OkInReview,
    /// Landing was attempted and failed.
    BadLand,
}

impl TrackingStatus {
    /// Every status, in wire-format order.
    pub const ALL: [Self; 4] = [
        Self::BadPreReview,
        Self::BadInReview,
        Self::OkInReview,
        Self::BadLand,
    ];

    /// Returns `true` for every status except [TrackingStatus::OkInReview].
    pub const fn is_bad(self) -> bool {
        !matches!(self, Self::OkInReview)
    }

    const fn token(self) -> &'static str {
        match self {
            Self::BadPreReview => "bad-pre-review",
            Self::BadInReview => "bad-in-review",
            Self::OkInReview => "ok-in-review",
            Self::BadLand => "bad-land",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.token() == token)
    }
}

impl Display for TrackingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// A short prefix of the review branch tip at the time a tracking branch was written.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TipRef(String);

impl TipRef {
    /// Creates a [TipRef] from the review tip's [Oid].
    pub fn from_oid(oid: Oid) -> Self {
        let mut hex = oid.to_string();
        hex.truncate(TIP_LEN);
        Self(hex)
    }

    /// Parses a tip reference from a tracking branch name component.
    pub fn parse(s: &str) -> Option<Self> {
        let well_formed = (MIN_TIP_LEN..=40).contains(&s.len())
            && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(s.to_string()))
    }

    /// Returns `true` if `oid` is the commit this reference was taken from.
    pub fn matches(&self, oid: Oid) -> bool {
        oid.to_string().starts_with(&self.0)
    }

    /// The hex digits of the reference, as written in the tracking branch name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TipRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The parsed form of a tracking branch name.
///
/// Status, review identity and the last seen review tip are all recovered from the
/// name alone.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct TrackingBranchDescription {
    status: TrackingStatus,
    review: ReviewBranchDescription,
    review_id: Option<u64>,
    tip: TipRef,
}

impl TrackingBranchDescription {
    /// Creates a new [TrackingBranchDescription] for the review described by `review`.
    pub fn new(
        status: TrackingStatus,
        review: ReviewBranchDescription,
        review_id: Option<u64>,
        tip: TipRef,
    ) -> Self {
        Self {
            status,
            review,
            review_id,
            tip,
        }
    }

    /// The status recorded by the last transition.
    pub fn status(&self) -> TrackingStatus {
        self.status
    }

    /// The review this tracking branch belongs to.
    pub fn review(&self) -> &ReviewBranchDescription {
        &self.review
    }

    /// The base of the tracked review. See [ReviewBranchDescription::base].
    pub fn base(&self) -> &str {
        self.review.base()
    }

    /// The topic of the tracked review. See [ReviewBranchDescription::description].
    pub fn description(&self) -> &str {
        self.review.description()
    }

    /// The id assigned by the review host, [None] until a review was opened.
    pub fn review_id(&self) -> Option<u64> {
        self.review_id
    }

    /// The review tip the status was recorded against.
    ///
    /// ## Returns
    /// - `&TipRef` - Compare it with the current tip through [TipRef::matches] to tell
    ///   whether the review has commits the status does not cover.
    pub fn tip(&self) -> &TipRef {
        &self.tip
    }

    /// The name of the review branch this tracking branch belongs to.
    pub fn review_name(&self) -> String {
        make_review_name(&self.review)
    }
}

impl Display for TrackingBranchDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/", TRACKING_PREFIX, self.status)?;
        match self.review_id {
            Some(id) => write!(f, "{}", id)?,
            None => f.write_str(NO_REVIEW_ID)?,
        }
        write!(
            f,
            "/{}/{}/{}",
            self.tip,
            self.review.base(),
            self.review.description()
        )
    }
}

/// Parses a review branch name.
///
/// ## Returns
/// - `Ok(ReviewBranchDescription)` - The parsed description.
/// - `Err(NamingError::NotReviewBranch)` - If `name` is not a well-formed review branch.
pub fn parse_review(name: &str) -> Result<ReviewBranchDescription, NamingError> {
    let not_review = || NamingError::NotReviewBranch(name.to_string());

    let rest = name.strip_prefix(REVIEW_PREFIX).ok_or_else(not_review)?;
    let (base, description) = rest.rsplit_once('/').ok_or_else(not_review)?;

    ReviewBranchDescription::new(description, base).map_err(|_| not_review())
}

/// Parses a tracking branch name.
///
/// ## Returns
/// - `Ok(TrackingBranchDescription)` - The parsed description.
/// - `Err(NamingError::NotTrackingBranch)` - If `name` is not a well-formed tracking branch.
pub fn parse_tracking(name: &str) -> Result<TrackingBranchDescription, NamingError> {
    let not_tracking = || NamingError::NotTrackingBranch(name.to_string());

    let rest = name.strip_prefix(TRACKING_PREFIX).ok_or_else(not_tracking)?;
    let mut fields = rest.splitn(4, '/');
    let (Some(status), Some(review_id), Some(tip), Some(tail)) =
        (fields.next(), fields.next(), fields.next(), fields.next())
    else {
        return Err(not_tracking());
    };

    let status = TrackingStatus::from_token(status).ok_or_else(not_tracking)?;
    let review_id = match review_id {
        NO_REVIEW_ID => None,
        // Only the canonical decimal form is accepted, so that one review maps to one name.
        id => {
            let parsed = id.parse::<u64>().map_err(|_| not_tracking())?;
            if parsed.to_string() != id {
                return Err(not_tracking());
            }
            Some(parsed)
        }
    };
    let tip = TipRef::parse(tip).ok_or_else(not_tracking)?;
    let (base, description) = tail.rsplit_once('/').ok_or_else(not_tracking)?;
    let review = ReviewBranchDescription::new(description, base).map_err(|_| not_tracking())?;

    Ok(TrackingBranchDescription::new(status, review, review_id, tip))
}

/// Renders the review branch name for `description`.
pub fn make_review_name(description: &ReviewBranchDescription) -> String {
    description.to_string()
}

/// Renders the tracking branch name for `description`.
pub fn make_tracking_name(description: &TrackingBranchDescription) -> String {
    description.to_string()
}

/// Maps free-form text onto a single name-safe component.
///
/// The mapping is lossy: runs of unsafe characters collapse into one `-`, letters are
/// lower-cased and the result is truncated. Distinct inputs may therefore produce the
/// same component. Returns [None] if nothing usable remains.
pub fn sanitize_description(text: &str) -> Option<String> {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('-') {
            out.push('-');
        }
    }
    out.truncate(MAX_DESCRIPTION_LEN);

    let trimmed = out.trim_end_matches('-');
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Returns `true` if `component` can appear between two `/` of a branch name.
fn is_valid_component(component: &str) -> bool {
    !component.is_empty()
        && component
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
        && !component.starts_with(['.', '-'])
        && !component.ends_with('.')
        && !component.ends_with(".lock")
        && !component.contains("..")
}
