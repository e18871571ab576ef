//! Recommendation Orchestrator.
//!
//! Flow: load candidate → scoring health → active corpus → train →
//!       recommend → validate ids → batched job lookup → merge.
//!
//! Stateless: one instance is built at startup and shared by all requests.
//! Every step before enrichment aborts the whole request on failure.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use super::id_filter::{retain_valid, IdValidator};
use super::models::{
    EnrichedRecommendation, JobSummary, RankedRecommendation, RecommendationResponse,
};
use super::store::{CandidateStore, JobStore};
use crate::errors::AppError;
use crate::models::job::{JobDetails, JobStatus};
use crate::scoring_client::{ScoringService, ServiceHealth};

pub const DEFAULT_TOP_N: usize = 5;

/// Absent or non-positive → `DEFAULT_TOP_N`; larger than `max` → `max`.
pub fn resolve_top_n(requested: Option<i64>, max: usize) -> usize {
    let max = max.max(1);
    match requested {
        Some(n) if n > 0 => usize::try_from(n).unwrap_or(max).min(max),
        _ => DEFAULT_TOP_N.min(max),
    }
}

pub struct RecommendationService {
    candidates: Arc<dyn CandidateStore>,
    jobs: Arc<dyn JobStore>,
    scoring: Arc<dyn ScoringService>,
    id_validator: Arc<dyn IdValidator>,
}

impl RecommendationService {
    pub fn new(
        candidates: Arc<dyn CandidateStore>,
        jobs: Arc<dyn JobStore>,
        scoring: Arc<dyn ScoringService>,
        id_validator: Arc<dyn IdValidator>,
    ) -> Self {
        Self {
            candidates,
            jobs,
            scoring,
            id_validator,
        }
    }

    pub async fn get_recommendations(
        &self,
        candidate_id: &str,
        top_n: usize,
    ) -> Result<RecommendationResponse, AppError> {
        info!("Starting recommendation flow for candidate {candidate_id} (top_n={top_n})");

        let candidate = self
            .candidates
            .find_candidate(candidate_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if candidate.skills.is_empty() {
            return Err(AppError::Validation(
                "Please complete your profile with at least one skill".to_string(),
            ));
        }
        info!(
            "Candidate {} has {} skills",
            candidate.name,
            candidate.skills.len()
        );

        // Step 1: health
        if self.scoring.health().await != ServiceHealth::Healthy {
            return Err(AppError::ServiceUnavailable(
                "AI recommendation service is unavailable".to_string(),
            ));
        }

        // Step 2: corpus
        let jobs = self.jobs.find_by_status(JobStatus::Active).await?;
        info!("Found {} active jobs", jobs.len());
        if jobs.is_empty() {
            return Ok(RecommendationResponse::no_jobs());
        }

        // Step 3: train
        let corpus: Vec<JobSummary> = jobs.iter().map(JobSummary::from).collect();
        self.scoring
            .train(&corpus)
            .await
            .map_err(|e| AppError::Upstream(format!("Model training failed: {e}")))?;

        // Step 4: recommend. Order from here on is the scoring service's.
        let ranked = self
            .scoring
            .recommend(&candidate, top_n)
            .await
            .map_err(|e| AppError::Upstream(format!("Recommendation request failed: {e}")))?;
        info!("Scoring service returned {} recommendations", ranked.len());

        // Step 5: validate ids
        let valid = retain_valid(&ranked, self.id_validator.as_ref());

        // Step 6: every id was malformed. Return the raw scoring output,
        // flagged with `enriched: false`.
        if valid.is_empty() && !ranked.is_empty() {
            warn!("No valid job ids in scoring output, returning recommendations as-is");
            return Ok(RecommendationResponse::unenriched(ranked));
        }

        // Step 7: enrich
        let enriched = self.enrich(valid).await?;
        info!("Returning {} enriched recommendations", enriched.len());
        Ok(RecommendationResponse::enriched(enriched))
    }

    async fn enrich(
        &self,
        valid: Vec<RankedRecommendation>,
    ) -> Result<Vec<EnrichedRecommendation>, AppError> {
        if valid.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = valid.iter().map(|r| r.job_id.clone()).collect();
        let details = self.jobs.find_by_ids(&ids).await?;
        info!("Found {} of {} recommended jobs", details.len(), ids.len());

        Ok(merge_details(valid, details))
    }
}

/// Attaches each recommendation's job, keeping recommendation order. A job
/// missing from `details` (deleted since training) yields `None`.
pub fn merge_details(
    valid: Vec<RankedRecommendation>,
    details: Vec<JobDetails>,
) -> Vec<EnrichedRecommendation> {
    let by_id: HashMap<String, JobDetails> = details
        .into_iter()
        .map(|d| (d.job.id.clone(), d))
        .collect();

    valid
        .into_iter()
        .map(|ranked| {
            let job_details = by_id.get(&ranked.job_id).cloned();
            if job_details.is_none() {
                warn!("Recommended job {} no longer exists", ranked.job_id);
            }
            EnrichedRecommendation {
                ranked,
                job_details,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::models::job::fixtures;
    use crate::recommendations::models::RecommendationList;
    use crate::recommendations::test_support::*;

    const JOB_A: &str = "65f000000000000000000001";
    const JOB_B: &str = "65f000000000000000000002";
    const JOB_C: &str = "65f000000000000000000003";

    fn enriched(response: &RecommendationResponse) -> &[EnrichedRecommendation] {
        match &response.recommendations {
            RecommendationList::Enriched(items) => items,
            RecommendationList::Unenriched(_) => panic!("expected enriched output"),
        }
    }

    #[tokio::test]
    async fn test_empty_skills_fail_before_any_scoring_call() {
        let harness = Harness::new()
            .with_candidate(candidate(vec![]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")]);

        let err = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(harness.scoring.total_calls(), 0);
        assert_eq!(harness.jobs.status_queries.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unknown_candidate_is_not_found() {
        let harness = Harness::new();
        let err = harness
            .service()
            .get_recommendations("65f0000000000000000000ff", 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(harness.scoring.total_calls(), 0);
    }

    #[tokio::test]
    async fn test_unhealthy_service_is_unavailable_and_never_trains() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")])
            .with_health(ServiceHealth::Unhealthy);

        let err = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::ServiceUnavailable(_)));
        assert_eq!(harness.scoring.health_calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.scoring.train_calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.scoring.recommend_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_corpus_is_empty_success() {
        let harness = Harness::new().with_candidate(candidate(vec!["React"]));

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        assert_eq!(response.count, 0);
        assert!(response.recommendations.is_empty());
        assert_eq!(harness.scoring.train_calls.load(Ordering::SeqCst), 0);
        assert_eq!(harness.scoring.recommend_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_training_batch_covers_every_active_job() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![
                fixtures::job(JOB_A, "Frontend Engineer"),
                fixtures::job(JOB_B, "Backend Engineer"),
            ])
            .with_ranked(vec![]);

        harness
            .service()
            .get_recommendations(CANDIDATE_ID, 3)
            .await
            .unwrap();

        let trained = harness.scoring.trained.lock().unwrap().clone();
        let ids: Vec<&str> = trained.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec![JOB_A, JOB_B]);
        assert_eq!(*harness.scoring.last_top_n.lock().unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_mixed_ids_keep_only_valid_in_order() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![
                fixtures::job(JOB_A, "Frontend Engineer"),
                fixtures::job(JOB_B, "Backend Engineer"),
                fixtures::job(JOB_C, "Data Engineer"),
            ])
            .with_ranked(vec![
                ranked(JOB_C, 0.9),
                ranked("job_19", 0.8),
                ranked(JOB_A, 0.7),
                ranked("not-an-id", 0.6),
                ranked(JOB_B, 0.5),
            ]);

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        let items = enriched(&response);
        let ids: Vec<&str> = items.iter().map(|r| r.ranked.job_id.as_str()).collect();
        assert_eq!(ids, vec![JOB_C, JOB_A, JOB_B]);
        assert_eq!(response.count, 3);
        assert!(response.enriched);
        assert!(items.iter().all(|r| r.job_details.is_some()));

        // Exactly the valid subset reaches the store.
        let lookups = harness.jobs.id_lookups.lock().unwrap().clone();
        assert_eq!(
            lookups,
            vec![vec![JOB_C.to_string(), JOB_A.to_string(), JOB_B.to_string()]]
        );
    }

    #[tokio::test]
    async fn test_all_malformed_ids_return_raw_output() {
        let raw = vec![ranked("job_1", 0.9), ranked("job_2", 0.3)];
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")])
            .with_ranked(raw.clone());

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        assert_eq!(response.recommendations, RecommendationList::Unenriched(raw));
        assert_eq!(response.count, 2);
        assert!(!response.enriched);
        assert!(harness.jobs.id_lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_scoring_output_is_empty_enriched_list() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")])
            .with_ranked(vec![]);

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        assert_eq!(response.count, 0);
        assert!(response.enriched);
        assert!(harness.jobs.id_lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deleted_job_keeps_position_with_null_details() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![
                fixtures::job(JOB_A, "Frontend Engineer"),
                fixtures::job(JOB_B, "Backend Engineer"),
            ])
            .with_deleted_after_corpus_load(JOB_A)
            .with_ranked(vec![ranked(JOB_A, 0.9), ranked(JOB_B, 0.4)]);

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        let items = enriched(&response);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ranked.job_id, JOB_A);
        assert!(items[0].job_details.is_none());
        assert_eq!(items[1].ranked.job_id, JOB_B);
        assert!(items[1].job_details.is_some());
    }

    #[tokio::test]
    async fn test_train_failure_is_upstream_and_skips_recommend() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")])
            .with_train_failure();

        let err = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(harness.scoring.train_calls.load(Ordering::SeqCst), 1);
        assert_eq!(harness.scoring.recommend_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_recommend_failure_is_upstream() {
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React"]))
            .with_jobs(vec![fixtures::job(JOB_A, "Frontend Engineer")])
            .with_recommend_failure();

        let err = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upstream(_)));
        assert!(harness.jobs.id_lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_end_to_end_single_job() {
        let job = fixtures::job(JOB_A, "Full Stack Developer");
        let harness = Harness::new()
            .with_candidate(candidate(vec!["React", "Node.js"]))
            .with_jobs(vec![job.clone()])
            .with_ranked(vec![RankedRecommendation {
                job_id: JOB_A.to_string(),
                similarity_score: 0.82,
                skills_match: 75.0,
            }]);

        let response = harness
            .service()
            .get_recommendations(CANDIDATE_ID, 5)
            .await
            .unwrap();

        assert_eq!(response.count, 1);
        let items = enriched(&response);
        assert_eq!(items[0].ranked.similarity_score, 0.82);
        assert_eq!(items[0].ranked.skills_match, 75.0);
        assert_eq!(items[0].job_details.as_ref().unwrap().job, job);

        let sent = harness.scoring.last_candidate.lock().unwrap().clone().unwrap();
        assert_eq!(sent.skills, vec!["React".to_string(), "Node.js".to_string()]);
        assert_eq!(sent.experience, 2);
        assert_eq!(sent.location, "Remote");
    }

    #[test]
    fn test_merge_details_ignores_store_order_and_repeats_duplicates() {
        let details = vec![
            JobDetails::from(fixtures::job(JOB_B, "Backend Engineer")),
            JobDetails::from(fixtures::job(JOB_A, "Frontend Engineer")),
        ];
        let merged = merge_details(
            vec![ranked(JOB_A, 0.9), ranked(JOB_B, 0.8), ranked(JOB_A, 0.7)],
            details,
        );

        let titles: Vec<&str> = merged
            .iter()
            .map(|m| m.job_details.as_ref().unwrap().job.title.as_str())
            .collect();
        assert_eq!(
            titles,
            vec!["Frontend Engineer", "Backend Engineer", "Frontend Engineer"]
        );
    }

    #[test]
    fn test_resolve_top_n() {
        assert_eq!(resolve_top_n(None, 50), 5);
        assert_eq!(resolve_top_n(Some(0), 50), 5);
        assert_eq!(resolve_top_n(Some(-2), 50), 5);
        assert_eq!(resolve_top_n(Some(12), 50), 12);
        assert_eq!(resolve_top_n(Some(500), 50), 50);
        assert_eq!(resolve_top_n(None, 3), 3);
    }
}
