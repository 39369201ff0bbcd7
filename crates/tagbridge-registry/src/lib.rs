//! # Tagbridge Registry
//!
//! Tag resolution for a registry that hosts images directly ("managed") and
//! mirrors others from upstream registries on demand ("pullthrough").
//!
//! [`PullthroughTagService`] answers the five tag operations for one
//! repository. Reads come from the control-plane image stream and image
//! metadata; writes go to a wrapped local tag store.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use tagbridge_core::{Context, Digest, ImageMetadata, RepositoryRef, TagService};
//! use tagbridge_registry::{InMemoryControlPlane, InMemoryTagStore, PullthroughTagService};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let repo = RepositoryRef::new("user", "app");
//! let digest = Digest::sha256_of(b"manifest");
//!
//! let plane = InMemoryControlPlane::new();
//! plane.upsert_stream(repo.clone(), false);
//! plane.set_tag(&repo, "latest", digest.clone());
//! plane.put_image(ImageMetadata::managed(digest.clone()));
//!
//! let service = PullthroughTagService::new(
//!     repo,
//!     Arc::new(plane.clone()),
//!     Arc::new(plane.clone()),
//!     Arc::new(plane),
//!     Arc::new(InMemoryTagStore::new()),
//! );
//!
//! let desc = service.get(&Context::new(), "latest").await.unwrap();
//! assert_eq!(desc.digest, digest);
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    PullthroughTagService                     │
//! │  resolve ─▶ image stream index ─▶ image metadata ─▶ policy   │
//! └──────────────────────────────────────────────────────────────┘
//!         │ reads                                  │ writes
//!         ▼                                        ▼
//! ┌──────────────────────────────┐     ┌─────────────────────────┐
//! │ Control plane (streams,      │     │ Local tag store         │
//! │ images)                      │     │                         │
//! └──────────────────────────────┘     └─────────────────────────┘
//! ```

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod config;
mod error;
mod memory;
mod service;

pub use config::{
    ImageSnapshot, RegistrySnapshot, RepositorySnapshot, TagServiceConfig, ENV_UNTAG_LOCAL,
};
pub use error::ConfigError;
pub use memory::{InMemoryControlPlane, InMemoryTagStore};
pub use service::PullthroughTagService;
