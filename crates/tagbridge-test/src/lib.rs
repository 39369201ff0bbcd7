//! # Tagbridge Test
//!
//! Test support for the tagbridge tag service.
//!
//! This crate provides:
//!
//! - [`RegistryFixture`] - a ready-made repository, control plane and local store
//! - [`Recording`] and [`CallLog`] - collaborator wrappers that count calls
//! - [`FailingImageStore`], [`FailingIndex`], [`FailingResolver`] and
//!   [`FailingTagStore`] - fault injection
//! - Assertion helpers for the error taxonomy
//!
//! ## Example
//!
//! ```rust
//! use tagbridge_core::{Context, TagService};
//! use tagbridge_test::{assert_tag_unknown, RegistryFixture};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let fixture = RegistryFixture::new().with_managed(false);
//! let service = fixture.service();
//!
//! let result = service.get(&Context::new(), "latest").await;
//! assert_tag_unknown(&result, "latest");
//! # }
//! ```

pub mod faults;
pub mod fixtures;
pub mod recording;
pub mod test_utils;

pub use faults::{FailingImageStore, FailingIndex, FailingResolver, FailingTagStore, IndexCall};
pub use fixtures::{digest_of, RegistryFixture, DEFAULT_TAG};
pub use recording::{CallLog, Recording};
pub use test_utils::{assert_repository_unknown, assert_tag_unknown};
