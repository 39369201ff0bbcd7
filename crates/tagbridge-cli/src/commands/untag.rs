//! Untag command implementation.

use anyhow::Result;
use clap::Args;
use serde_json::json;
use tagbridge_core::{Context, TagService};

use super::{print_json, OutputFormat, Session, TargetArgs};

/// Arguments for the untag command.
#[derive(Args)]
pub struct UntagArgs {
    /// Tag name
    pub name: String,

    /// Save the updated local tags back into the snapshot file
    #[arg(long)]
    pub write: bool,
}

/// Runs the untag command.
pub async fn run(target: &TargetArgs, args: &UntagArgs) -> Result<()> {
    let mut session = Session::open(target)?;
    session.service().untag(&Context::new(), &args.name).await?;

    if args.write {
        session.persist()?;
    }

    match target.format {
        OutputFormat::Text => println!("Untagged {}", args.name),
        OutputFormat::Json => print_json(&json!({ "untagged": args.name }))?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::super::test_support::*;
    use super::*;
    use tagbridge_registry::RegistrySnapshot;

    #[tokio::test]
    async fn test_untag_removes_local_tag() {
        let mut file = snapshot_file(false);
        writeln!(file, "localTags:\n  user/app:\n    latest: {MANAGED}").unwrap();
        let args = UntagArgs {
            name: "latest".to_string(),
            write: true,
        };

        run(&target(&file, "user/app"), &args).await.unwrap();

        let snapshot = RegistrySnapshot::load(file.path()).unwrap();
        assert!(snapshot.local_tags.is_empty());
    }

    #[tokio::test]
    async fn test_untag_hidden_tag_fails() {
        let file = snapshot_file(false);
        let args = UntagArgs {
            name: "mirror".to_string(),
            write: false,
        };
        assert!(run(&target(&file, "user/app"), &args).await.is_err());
    }
}
