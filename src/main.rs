// src/main.rs

use clap::Parser;
use taskrunner::cli::CliArgs;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    taskrunner::run(args).await
}
