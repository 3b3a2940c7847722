//! Contracts for the external services the enrichment pipeline talks to.
//!
//! Concrete HTTP clients live in `tijdmachine-services`; tests substitute
//! in-process fakes.

use async_trait::async_trait;

use crate::error::Result;

/// Stateless request/response text completion.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Complete `user_text` under `system_instruction`.
    ///
    /// `temperature` overrides the client's default when set. Implementations
    /// do not retry.
    async fn complete(
        &self,
        system_instruction: &str,
        user_text: &str,
        temperature: Option<f32>,
    ) -> Result<String>;
}

/// Encyclopedic lookup by term.
#[async_trait]
pub trait KnowledgeLookup: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Prose about `term`, or `None` when nothing was found.
    async fn lookup(&self, term: &str) -> Result<Option<String>>;
}
