//! Core domain logic for Tijdmachine.
//!
//! Ties the article store and the external text/knowledge services together:
//! [`resolver::Resolver`] picks an article for a day of the year, and
//! [`enrichment::EnrichmentPipeline`] turns its text into a summary,
//! keywords and translated encyclopedic context.

pub mod enrichment;
pub mod guard;
pub mod keywords;
mod prompts;
pub mod resolver;

pub use enrichment::{EnrichmentPipeline, EnrichmentProgress, SilentEnrichmentProgress};
pub use resolver::{MatchKind, Resolution, Resolver};
