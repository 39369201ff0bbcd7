//! Tags command implementation.

use anyhow::Result;
use tagbridge_core::{Context, TagService};
use tracing::info;

use super::{print_json, OutputFormat, Session, TargetArgs};

/// Runs the tags command.
pub async fn run(target: &TargetArgs) -> Result<()> {
    let session = Session::open(target)?;
    let tags = session.service().all(&Context::new()).await?;
    info!(count = tags.len(), "Listed visible tags");
    print_tags(target.format, &tags)
}

/// Prints tag names, one per line or as a JSON array.
pub fn print_tags(format: OutputFormat, tags: &[String]) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for tag in tags {
                println!("{tag}");
            }
        }
        OutputFormat::Json => print_json(&tags)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_all_respects_pullthrough() {
        let file = snapshot_file(false);
        let session = Session::open(&target(&file, "user/app")).unwrap();
        let tags = session.service().all(&Context::new()).await.unwrap();
        assert_eq!(tags, ["latest", "stable"]);

        let file = snapshot_file(true);
        let session = Session::open(&target(&file, "user/app")).unwrap();
        let tags = session.service().all(&Context::new()).await.unwrap();
        assert_eq!(tags, ["latest", "mirror", "stable"]);
    }
}
