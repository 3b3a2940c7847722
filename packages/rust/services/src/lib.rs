//! HTTP clients for the external services behind the enrichment pipeline.
//!
//! - [`OpenAiClient`] implements [`tijdmachine_shared::TextGenerator`]
//! - [`WikipediaClient`] implements [`tijdmachine_shared::KnowledgeLookup`]

mod openai;
mod wikipedia;

pub use openai::OpenAiClient;
pub use wikipedia::WikipediaClient;

/// User-Agent string for outgoing requests.
const USER_AGENT: &str = concat!("Tijdmachine/", env!("CARGO_PKG_VERSION"));
