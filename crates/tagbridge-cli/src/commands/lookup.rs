//! Lookup command implementation.

use anyhow::Result;
use clap::Args;
use tagbridge_core::{Context, Descriptor, Digest, TagService};
use tracing::info;

use super::tags::print_tags;
use super::{Session, TargetArgs};

/// Arguments for the lookup command.
#[derive(Args)]
pub struct LookupArgs {
    /// Digest to search for (algorithm:hex)
    pub digest: Digest,
}

/// Runs the lookup command.
pub async fn run(target: &TargetArgs, args: &LookupArgs) -> Result<()> {
    let session = Session::open(target)?;
    let descriptor = Descriptor::for_digest(args.digest.clone());
    let tags = session.service().lookup(&Context::new(), &descriptor).await?;
    info!(digest = %args.digest, count = tags.len(), "Looked up tags by digest");
    print_tags(target.format, &tags)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{Cli, Commands};
    use super::*;
    use clap::Parser;

    #[test]
    fn test_lookup_rejects_malformed_digest() {
        assert!(Cli::try_parse_from(["tagbridge", "lookup", "sha256:xyz"]).is_err());

        let cli = Cli::try_parse_from(["tagbridge", "lookup", MANAGED]).unwrap();
        assert!(matches!(cli.command, Commands::Lookup(ref args) if args.digest.as_str() == MANAGED));
    }

    #[tokio::test]
    async fn test_lookup_by_digest() {
        let file = snapshot_file(false);
        let session = Session::open(&target(&file, "user/app")).unwrap();
        let ctx = Context::new();

        let managed = Descriptor::for_digest(MANAGED.parse().unwrap());
        let tags = session.service().lookup(&ctx, &managed).await.unwrap();
        assert_eq!(tags, ["latest", "stable"]);

        let mirrored = Descriptor::for_digest(MIRRORED.parse().unwrap());
        assert!(session.service().lookup(&ctx, &mirrored).await.unwrap().is_empty());
    }
}
