//! Tagbridge CLI - inspect tag visibility against a control-plane snapshot.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tagbridge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get(args) => commands::get::run(&cli.target, &args).await,
        Commands::Tags => commands::tags::run(&cli.target).await,
        Commands::Lookup(args) => commands::lookup::run(&cli.target, &args).await,
        Commands::Tag(args) => commands::tag::run(&cli.target, &args).await,
        Commands::Untag(args) => commands::untag::run(&cli.target, &args).await,
        Commands::Version => {
            println!("tagbridge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}
