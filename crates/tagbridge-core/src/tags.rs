//! The general tag-service surface.

use async_trait::async_trait;

use crate::context::Context;
use crate::descriptor::Descriptor;
use crate::error::Result;

/// Tag operations on a single repository.
///
/// Implemented by plain tag stores and by the pullthrough-aware service that
/// wraps one, so the request-handling layer never needs to know which it holds.
#[async_trait]
pub trait TagService: Send + Sync {
    /// Resolves a tag to a descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TagUnknown`] if the tag does not resolve.
    async fn get(&self, ctx: &Context, tag: &str) -> Result<Descriptor>;

    /// Points `tag` at the given descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be written.
    async fn tag(&self, ctx: &Context, tag: &str, descriptor: Descriptor) -> Result<()>;

    /// Removes a tag.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TagUnknown`] if the tag does not resolve.
    async fn untag(&self, ctx: &Context, tag: &str) -> Result<()>;

    /// Lists every tag. Order is not significant.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags cannot be listed.
    async fn all(&self, ctx: &Context) -> Result<Vec<String>>;

    /// Lists the tags pointing at the descriptor's digest.
    ///
    /// # Errors
    ///
    /// Returns an error if the tags cannot be listed.
    async fn lookup(&self, ctx: &Context, descriptor: &Descriptor) -> Result<Vec<String>>;
}
