//! The subcommands for the `rt` application.

use crate::ctx::RtContext;
use clap::Subcommand;

mod local;
use local::{AuthorsCmd, ConfigCmd, StatusCmd};

mod review;
use review::{LandCmd, MarkCmd};

#[derive(Debug, Clone, Eq, PartialEq, Subcommand)]
pub enum Subcommands {
    /// Print the state of every review in the repository.
    #[clap(aliases = ["s", "ls"])]
    Status(StatusCmd),
    /// Move a review through one transition, recording it in the review's tracking branch.
    #[clap(alias = "m")]
    Mark(MarkCmd),
    /// Print the authors of the commits under review.
    #[clap(alias = "a")]
    Authors(AuthorsCmd),
    /// Squash a review onto its base, removing the review and its tracking branch.
    Land(LandCmd),
    /// Initialize and print the `rt` configuration for the repository.
    Config(ConfigCmd),
}

impl Default for Subcommands {
    fn default() -> Self {
        Self::Status(StatusCmd)
    }
}

impl Subcommands {
    /// Run the subcommand with the given context.
    pub fn run(self, ctx: RtContext) -> anyhow::Result<()> {
        match self {
            Self::Status(args) => args.run(ctx),
            Self::Mark(args) => args.run(ctx),
            Self::Authors(args) => args.run(ctx),
            Self::Land(args) => args.run(ctx),
            Self::Config(args) => args.run(ctx),
        }
    }
}
