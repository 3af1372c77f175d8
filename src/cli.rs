//! The CLI for `rt`.

use crate::{
    ctx::RtContext,
    git::{active_repository, repository_at},
    subcommands::Subcommands,
};
use anyhow::{anyhow, Result};
use clap::{
    builder::styling::{AnsiColor, Color, Style},
    ArgAction, Parser,
};
use std::path::PathBuf;
use tracing::Level;

const ABOUT: &str =
    "rt tracks code reviews of `r/` branches through state recorded in tracking branch names.";

/// The CLI application for `rt`.
#[derive(Parser, Debug, Clone, Eq, PartialEq)]
#[command(about = ABOUT, version, styles = cli_styles())]
pub struct Cli {
    /// Verbosity level (0-4)
    #[arg(short, action = ArgAction::Count, global = true)]
    v: u8,
    /// Run as if `rt` was started in the given path instead of the current directory.
    #[arg(short = 'C', value_name = "PATH", global = true)]
    path: Option<PathBuf>,
    /// The subcommand to run
    #[clap(subcommand)]
    subcommand: Option<Subcommands>,
}

impl Cli {
    /// Run the CLI application with the given arguments.
    pub fn run(self) -> Result<()> {
        let repository = match self.path.as_deref() {
            Some(path) => repository_at(path),
            None => active_repository(),
        }
        .ok_or_else(|| anyhow!("Not in a git repository."))?;
        let ctx = RtContext::load(repository)?;

        self.subcommand.unwrap_or_default().run(ctx)
    }

    /// Initializes the tracing subscriber
    ///
    /// ## Returns
    /// - `Result<Self>` - Ok if successful, Err otherwise.
    pub fn init_tracing_subscriber(self) -> Result<Self> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(match self.v {
                0 => Level::ERROR,
                1 => Level::WARN,
                2 => Level::INFO,
                3 => Level::DEBUG,
                _ => Level::TRACE,
            })
            .finish();

        tracing::subscriber::set_global_default(subscriber).map_err(|e| anyhow!(e))?;

        Ok(self)
    }
}

/// Styles for the CLI application.
const fn cli_styles() -> clap::builder::Styles {
    clap::builder::Styles::styled()
        .usage(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .header(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Green))))
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .underline()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::White))))
}

#[cfg(test)]
mod test {
    use super::Cli;
    use crate::subcommands::Subcommands;
    use clap::Parser;
    use std::path::Path;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rt",
            "mark",
            "ok-new-review",
            "r/master/topic",
            "--review-id",
            "3",
            "-y",
            "-C",
            "/tmp/repo",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.v, 2);
        assert_eq!(cli.path.as_deref(), Some(Path::new("/tmp/repo")));
        assert!(matches!(cli.subcommand, Some(Subcommands::Mark(_))));
    }

    #[test]
    fn status_aliases() {
        for alias in ["status", "s", "ls"] {
            let cli = Cli::try_parse_from(["rt", alias]).unwrap();
            assert_eq!(cli.subcommand.unwrap_or_default(), Subcommands::default());
        }
        assert_eq!(Cli::try_parse_from(["rt"]).unwrap().subcommand, None);
    }
}
