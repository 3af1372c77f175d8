//! `config` subcommand.

use crate::ctx::RtContext;
use anyhow::Result;
use clap::Args;
use nu_ansi_term::Color;

/// CLI arguments for the `config` subcommand.
#[derive(Debug, Clone, Eq, PartialEq, Args)]
pub struct ConfigCmd;

impl ConfigCmd {
    /// Run the `config` subcommand.
    pub fn run(self, ctx: RtContext) -> Result<()> {
        if !ctx.config_path.exists() {
            ctx.config.write(&ctx.config_path)?;
            println!(
                "Configuration initialized at: {}",
                Color::Blue.paint(ctx.config_path.display().to_string())
            );
        } else {
            println!(
                "Configuration loaded from: {}",
                Color::Blue.paint(ctx.config_path.display().to_string())
            );
        }

        print!("{}", toml::to_string_pretty(&ctx.config)?);
        Ok(())
    }
}
