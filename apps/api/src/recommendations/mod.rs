// Job recommendations: candidate profile + active corpus → external scoring
// service → identifier validation → enrichment from the job store.
// All scoring calls go through scoring_client; all reads go through store.rs.

pub mod handlers;
pub mod id_filter;
pub mod models;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use id_filter::{HexIdValidator, IdValidator};
pub use service::RecommendationService;
pub use store::{CandidateStore, JobStore, PgCandidateStore, PgJobStore};
