//! Constants for the `rt` application.

use nu_ansi_term::Color;

/// Name of the configuration file, stored within the repository's git directory.
pub(crate) const RT_CFG_FILE_NAME: &str = "rt.toml";

/// Prefix of every review branch name.
pub(crate) const REVIEW_PREFIX: &str = "r/";

/// Prefix of every tracking branch name, including the wire format version.
///
/// Bump the version segment whenever the layout of the fields after it changes.
pub(crate) const TRACKING_PREFIX: &str = "dev/rt/v1/";

/// Placeholder written in place of a review id before one has been assigned.
pub(crate) const NO_REVIEW_ID: &str = "none";

/// Number of hex digits of the review tip recorded in a tracking branch name.
pub(crate) const TIP_LEN: usize = 12;

/// Shortest tip reference accepted when parsing.
pub(crate) const MIN_TIP_LEN: usize = 4;

/// Longest component produced by [crate::naming::sanitize_description].
pub(crate) const MAX_DESCRIPTION_LEN: usize = 64;

/// Reflog message prefix for ref writes performed by `rt`.
pub(crate) const REFLOG_PREFIX: &str = "rt";

/// Marks reviews with commits the tracking branch has not seen.
pub(crate) const FILLED_CIRCLE: char = '●';
pub(crate) const EMPTY_CIRCLE: char = '○';

pub(crate) const BAD_COLOR: Color = Color::Red;
pub(crate) const OK_COLOR: Color = Color::Green;
pub(crate) const NEW_COLOR: Color = Color::Cyan;
pub(crate) const BRANCH_COLOR: Color = Color::Blue;
pub(crate) const MUTED_COLOR: Color = Color::DarkGray;
