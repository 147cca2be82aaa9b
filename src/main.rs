use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = keydesk::cli::Cli::parse();
    cli.run()
}
