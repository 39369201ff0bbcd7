//! CLI commands and argument parsing.

pub mod get;
pub mod lookup;
pub mod tag;
pub mod tags;
pub mod untag;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tagbridge_core::RepositoryRef;
use tagbridge_registry::{
    InMemoryTagStore, PullthroughTagService, RegistrySnapshot, TagServiceConfig,
};

/// Tagbridge - pullthrough-aware tag resolution
#[derive(Parser)]
#[command(name = "tagbridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a tag to its descriptor
    Get(get::GetArgs),

    /// List visible tags
    Tags,

    /// List visible tags pointing at a digest
    Lookup(lookup::LookupArgs),

    /// Write a tag into the local tag store
    Tag(tag::TagArgs),

    /// Remove a tag
    Untag(untag::UntagArgs),

    /// Print version information
    Version,
}

/// Snapshot and repository the commands operate on.
#[derive(Args, Clone, Debug)]
pub struct TargetArgs {
    /// Control-plane snapshot file (YAML, or JSON by extension)
    #[arg(long, global = true, env = "TAGBRIDGE_SNAPSHOT")]
    pub snapshot: Option<PathBuf>,

    /// Repository as namespace/name
    #[arg(short, long, global = true, env = "TAGBRIDGE_REPOSITORY")]
    pub repository: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

/// Output format for command results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A loaded snapshot wired into a tag service for one repository.
pub struct Session {
    path: PathBuf,
    snapshot: RegistrySnapshot,
    repository: RepositoryRef,
    local: InMemoryTagStore,
    service: PullthroughTagService,
}

impl Session {
    /// Loads the snapshot named by `target` and builds the tag service.
    pub fn open(target: &TargetArgs) -> Result<Self> {
        let path = target
            .snapshot
            .clone()
            .context("no snapshot given (use --snapshot or TAGBRIDGE_SNAPSHOT)")?;
        let repository = target
            .repository
            .as_deref()
            .context("no repository given (use --repository or TAGBRIDGE_REPOSITORY)")?;
        let repository = RepositoryRef::parse(repository)?;

        let snapshot = RegistrySnapshot::load(&path)
            .with_context(|| format!("failed to load snapshot {}", path.display()))?;
        let config = TagServiceConfig::default().with_process_env()?;

        let plane = Arc::new(snapshot.to_control_plane());
        let local = snapshot.local_store(&repository);
        let service = PullthroughTagService::new(
            repository.clone(),
            plane.clone(),
            plane.clone(),
            plane,
            Arc::new(local.clone()),
        )
        .with_config(config);

        tracing::debug!(%repository, path = %path.display(), "Opened snapshot");
        Ok(Self {
            path,
            snapshot,
            repository,
            local,
            service,
        })
    }

    /// Returns the tag service.
    pub const fn service(&self) -> &PullthroughTagService {
        &self.service
    }

    /// Returns the local tag store backing writes.
    pub const fn local(&self) -> &InMemoryTagStore {
        &self.local
    }

    /// Writes the local tag store back into the snapshot file.
    pub fn persist(&mut self) -> Result<()> {
        self.snapshot.set_local_tags(&self.repository, &self.local);
        self.snapshot.save(&self.path)?;
        tracing::info!(path = %self.path.display(), "Snapshot updated");
        Ok(())
    }
}

/// Prints `value` as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_cli_parses_global_target() {
        let cli = Cli::try_parse_from([
            "tagbridge",
            "--snapshot",
            "state.yaml",
            "get",
            "latest",
            "--repository",
            "user/app",
            "--format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.target.snapshot, Some(PathBuf::from("state.yaml")));
        assert_eq!(cli.target.repository.as_deref(), Some("user/app"));
        assert_eq!(cli.target.format, OutputFormat::Json);
        assert!(matches!(cli.command, Commands::Get(ref args) if args.tag == "latest"));
    }

    #[test]
    fn test_open_requires_snapshot() {
        let target = TargetArgs {
            snapshot: None,
            repository: Some("user/app".to_string()),
            format: OutputFormat::Text,
        };
        let err = Session::open(&target).err().unwrap();
        assert!(err.to_string().contains("no snapshot"));
    }

    #[test]
    fn test_open_rejects_bad_repository() {
        let file = snapshot_file(false);
        assert!(Session::open(&target(&file, "app")).is_err());
    }

    #[test]
    fn test_open_unknown_repository_still_opens() {
        let file = snapshot_file(false);
        let session = Session::open(&target(&file, "user/other")).unwrap();
        assert!(session.local().is_empty());
    }
}
