//! Get command implementation.

use anyhow::Result;
use clap::Args;
use tagbridge_core::{Context, Descriptor, TagService};
use tracing::info;

use super::{print_json, OutputFormat, Session, TargetArgs};

/// Arguments for the get command.
#[derive(Args)]
pub struct GetArgs {
    /// Tag to resolve
    pub tag: String,
}

/// Runs the get command.
pub async fn run(target: &TargetArgs, args: &GetArgs) -> Result<()> {
    let session = Session::open(target)?;
    info!(tag = %args.tag, "Resolving tag");

    let descriptor = get(&session, &args.tag).await?;
    match target.format {
        OutputFormat::Text => println!("{}", descriptor.digest),
        OutputFormat::Json => print_json(&descriptor)?,
    }
    Ok(())
}

async fn get(session: &Session, tag: &str) -> Result<Descriptor> {
    Ok(session.service().get(&Context::new(), tag).await?)
}
