//! # Tagbridge Core
//!
//! Core types and contracts for resolving tags in a registry that serves both
//! managed images and images mirrored from upstream registries (pullthrough).
//!
//! This crate provides:
//!
//! - [`Digest`], [`Descriptor`], [`RepositoryRef`] - the data model
//! - [`Error`] - the closed error taxonomy surfaced to request handlers
//! - [`Context`] - request-scoped cancellation and correlation
//! - [`RepositoryContextResolver`], [`ImageStreamReader`], [`ImageMetadataStore`] -
//!   read-side collaborator contracts
//! - [`TagService`] - the general tag-service surface
//! - [`policy`] - the single visibility decision
//!
//! ## Example
//!
//! ```rust
//! use tagbridge_core::policy::{visible, Visibility};
//!
//! assert!(visible(true, false));
//! assert_eq!(Visibility::decide(false, false), Visibility::Hidden);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod context;
pub mod descriptor;
pub mod digest;
pub mod error;
pub mod image;
pub mod imagestream;
pub mod policy;
pub mod reference;
pub mod tags;


pub use context::Context;
pub use descriptor::{Descriptor, MediaType};
pub use digest::Digest;
pub use error::{Error, LookupError, Result};
pub use image::{ImageMetadata, ImageMetadataStore, MANAGED_ANNOTATION};
pub use imagestream::{ImageStreamReader, RepositoryContextResolver, RepositoryHandle, TagEntry};
pub use policy::Visibility;
pub use reference::RepositoryRef;
pub use tags::TagService;
