//! Error types for the `rt` application.

use crate::branch::PairState;
use thiserror::Error;

/// Errors raised while translating between branch names and their descriptions.
#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum NamingError {
    /// The name is not a well-formed review branch name.
    #[error("`{0}` is not a review branch")]
    NotReviewBranch(String),
    /// The name is not a well-formed tracking branch name.
    #[error("`{0}` is not a tracking branch")]
    NotTrackingBranch(String),
    /// A description or base component contains characters unsafe for a ref name.
    #[error("`{0}` is not a valid branch name component")]
    InvalidComponent(String),
}

/// Errors raised by a [RefGateway].
///
/// [RefGateway]: crate::git::RefGateway
#[derive(Error, Debug)]
pub enum GatewayError {
    /// A ref did not hold the value an edit expected, or the remote rejected an update.
    #[error("ref `{0}` changed underneath us")]
    RefWriteConflict(String),
    /// Syncing would overwrite the branches of a repository someone works in.
    #[error("refusing to fetch into `{0}`, which is not a bare repository")]
    NotBare(String),
    /// A [git2::Error] occurred.
    #[error("libgit2 error: {}", .0)]
    Git2(#[from] git2::Error),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Errors raised by a [ReviewTrackingBranchPair].
///
/// [ReviewTrackingBranchPair]: crate::branch::ReviewTrackingBranchPair
#[derive(Error, Debug)]
pub enum BranchError {
    #[error(transparent)]
    Naming(#[from] NamingError),
    #[error(transparent)]
    Gateway(GatewayError),
    /// The review and tracking branches describe different reviews.
    #[error("review branch `{review}` and tracking branch `{tracking}` disagree")]
    Inconsistent { review: String, tracking: String },
    /// The base named by the review branch does not exist.
    #[error("base branch `{0}` not found")]
    BaseBranchNotFound(String),
    /// The base could not be resolved while walking the review's commits.
    #[error("base branch `{0}` does not resolve")]
    InvalidBase(String),
    /// There are no commits on the review branch that are not on its base.
    #[error("review branch `{0}` has no commits on top of its base")]
    NoCommits(String),
    /// The review branch has no commits at all.
    #[error("review branch `{0}` has no history")]
    NoHistory(String),
    /// The tracking branch moved while a transition was being written.
    ///
    /// The pair is stale after this and must be rebuilt from a fresh fetch.
    #[error("transition on `{0}` lost a race; refetch and retry next cycle")]
    TransitionConflict(String),
    /// A transition was invoked from a state it is not defined for.
    #[error("cannot `{transition}` from state {from}")]
    IllegalTransition {
        transition: &'static str,
        from: PairState,
    },
    /// The review branch does not merge cleanly onto its base.
    #[error("review branch `{0}` conflicts with its base")]
    LandConflict(String),
    /// Landing the review branch would not change its base.
    #[error("review branch `{0}` has nothing to land")]
    NothingToLand(String),
}

impl BranchError {
    /// Returns `true` for races and remote failures, which clear up once the
    /// pair is rebuilt on a later cycle.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::TransitionConflict(_) => true,
            Self::Gateway(e) => !matches!(e, GatewayError::NotBare(_)),
            _ => false,
        }
    }

    /// Returns `true` for caller contract violations.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::IllegalTransition { .. })
    }
}

impl From<GatewayError> for BranchError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::RefWriteConflict(name) => Self::TransitionConflict(name),
            e => Self::Gateway(e),
        }
    }
}

pub type BranchResult<T> = Result<T, BranchError>;

#[cfg(test)]
mod test {
    use super::{BranchError, GatewayError};

    #[test]
    fn ref_write_conflict_becomes_transition_conflict() {
        let e: BranchError = GatewayError::RefWriteConflict("dev/rt/v1/x".to_string()).into();
        assert!(matches!(e, BranchError::TransitionConflict(ref n) if n == "dev/rt/v1/x"));
        assert!(e.is_transient());
        assert!(!e.is_usage_error());
    }

    #[test]
    fn data_errors_are_not_transient() {
        assert!(!BranchError::NoCommits("r/master/x".to_string()).is_transient());
        assert!(!BranchError::InvalidBase("nope".to_string()).is_transient());
        let not_bare: BranchError = GatewayError::NotBare("/work/.git".to_string()).into();
        assert!(!not_bare.is_transient());
    }
}
