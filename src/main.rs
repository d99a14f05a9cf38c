use anyhow::Result;
use clap::Parser;
use tallyroom::cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    cli.init_tracing();
    cli.run().await
}
