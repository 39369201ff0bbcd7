//! Tag command implementation.

use anyhow::Result;
use clap::Args;
use tagbridge_core::{Context, Descriptor, Digest, MediaType, TagService};

use super::{print_json, OutputFormat, Session, TargetArgs};

/// Arguments for the tag command.
#[derive(Args)]
pub struct TagArgs {
    /// Tag name
    pub name: String,

    /// Digest the tag should point at (algorithm:hex)
    pub digest: Digest,

    /// Manifest size in bytes
    #[arg(long)]
    pub size: Option<u64>,

    /// Manifest media type
    #[arg(long)]
    pub media_type: Option<String>,

    /// Save the updated local tags back into the snapshot file
    #[arg(long)]
    pub write: bool,
}

impl TagArgs {
    fn descriptor(&self) -> Descriptor {
        let mut descriptor = Descriptor::for_digest(self.digest.clone());
        descriptor.size = self.size;
        descriptor.media_type = self.media_type.as_deref().map(MediaType::new);
        descriptor
    }
}

/// Runs the tag command.
pub async fn run(target: &TargetArgs, args: &TagArgs) -> Result<()> {
    let mut session = Session::open(target)?;
    let descriptor = args.descriptor();
    session
        .service()
        .tag(&Context::new(), &args.name, descriptor.clone())
        .await?;

    if args.write {
        session.persist()?;
    }

    match target.format {
        OutputFormat::Text => println!("Tagged {} -> {}", args.name, descriptor.digest),
        OutputFormat::Json => print_json(&descriptor)?,
    }
    Ok(())
}
