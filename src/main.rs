use clap::Parser;
use keyhub::cli::{self, Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(args) => cli::serve::run(args).await,
        Command::Migrate => cli::migrate::run().await,
        Command::Bootstrap(args) => cli::bootstrap::run(args).await,
    }
}
