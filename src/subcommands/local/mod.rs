//! Subcommands that only read from the repository.

mod status;
pub use status::StatusCmd;

mod authors;
pub use authors::AuthorsCmd;

mod config;
pub use config::ConfigCmd;
