use anyhow::Result;
use clap::Parser;
use rt::cli::Cli;

fn main() -> Result<()> {
    Cli::parse().init_tracing_subscriber()?.run()
}
