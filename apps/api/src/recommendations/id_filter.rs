//! Identifier-shape validation for scoring output.
//!
//! The scoring service emits positional placeholders such as `job_19` when it
//! lacks real identifiers. Those never reach the job store.

use tracing::{debug, info};

use super::models::RankedRecommendation;

/// Predicate over job identifiers. Must change together with the job
/// store's key scheme.
pub trait IdValidator: Send + Sync {
    fn is_valid(&self, id: &str) -> bool;
}

/// Accepts fixed-length hexadecimal identifiers, either case.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HexIdValidator {
    pub length: usize,
}

impl HexIdValidator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }
}

impl Default for HexIdValidator {
    fn default() -> Self {
        Self { length: 24 }
    }
}

impl IdValidator for HexIdValidator {
    fn is_valid(&self, id: &str) -> bool {
        id.len() == self.length && id.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

/// Keeps the recommendations whose identifier passes `validator`, in their
/// original order. Duplicates are kept.
pub fn retain_valid(
    recommendations: &[RankedRecommendation],
    validator: &dyn IdValidator,
) -> Vec<RankedRecommendation> {
    let valid: Vec<RankedRecommendation> = recommendations
        .iter()
        .filter(|rec| {
            let ok = validator.is_valid(&rec.job_id);
            if !ok {
                debug!("Skipping invalid job id: {}", rec.job_id);
            }
            ok
        })
        .cloned()
        .collect();

    info!(
        "{} of {} recommendations have valid job ids",
        valid.len(),
        recommendations.len()
    );
    valid
}
