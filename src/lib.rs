#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub mod branch;
pub mod cli;
pub mod config;
pub mod discover;
pub mod errors;
pub mod git;
pub mod naming;

pub(crate) mod constants;
mod ctx;
mod subcommands;

#[cfg(test)]
pub(crate) mod test_utils;

pub use branch::{PairState, ReviewTrackingBranchPair};
pub use discover::{discover, DiscoveredPair, Discovery};
pub use git::{GitGateway, RefGateway};
