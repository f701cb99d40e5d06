use clap::Parser;
use noor_search::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve => cli::serve::run().await,
        Command::Warmup(args) => cli::warmup::run(args).await,
    }
}
