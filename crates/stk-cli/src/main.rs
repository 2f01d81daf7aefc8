use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::IsTerminal;

mod commands;
mod source;

#[derive(Parser)]
#[command(name = "stk")]
#[command(about = "Store/supplier stock feed merger", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge supplier stock into the store feed
    Merge(commands::merge::MergeArgs),
}

fn init_tracing() {
    // stdout may carry the merged XML; keep logs on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Missing .env.local is fine; real env vars always win.
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();

    match cli.cmd {
        Commands::Merge(args) => commands::merge::run(args).await?,
    }

    Ok(())
}
