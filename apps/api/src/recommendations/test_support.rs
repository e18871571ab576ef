//! In-memory doubles for the recommendation collaborators, with call
//! counters so tests can assert which external calls happened.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::id_filter::HexIdValidator;
use super::models::{CandidateProfile, JobSummary, RankedRecommendation};
use super::service::RecommendationService;
use super::store::{CandidateStore, JobStore};
use crate::errors::AppError;
use crate::models::job::{JobDetails, JobRow, JobStatus};
use crate::scoring_client::{ScoringError, ScoringService, ServiceHealth};

pub const CANDIDATE_ID: &str = "65f0c0ffee0000000000beef";

pub fn candidate(skills: Vec<&str>) -> CandidateProfile {
    CandidateProfile {
        id: CANDIDATE_ID.to_string(),
        name: "Asha".to_string(),
        skills: skills.into_iter().map(str::to_string).collect(),
        experience: 2,
        location: "Remote".to_string(),
    }
}

pub fn ranked(id: &str, similarity: f64) -> RankedRecommendation {
    RankedRecommendation {
        job_id: id.to_string(),
        similarity_score: similarity,
        skills_match: (similarity * 100.0).round(),
    }
}

#[derive(Default)]
pub struct MemoryCandidates {
    profiles: Mutex<HashMap<String, CandidateProfile>>,
}

#[async_trait]
impl CandidateStore for MemoryCandidates {
    async fn find_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, AppError> {
        Ok(self.profiles.lock().unwrap().get(id).cloned())
    }
}

#[derive(Default)]
pub struct MemoryJobs {
    jobs: Mutex<Vec<JobRow>>,
    /// Visible to the corpus load but gone by enrichment time.
    deleted: Mutex<HashSet<String>>,
    pub status_queries: AtomicUsize,
    pub id_lookups: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl JobStore for MemoryJobs {
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<JobRow>, AppError> {
        self.status_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.status == status)
            .cloned()
            .collect())
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<JobDetails>, AppError> {
        self.id_lookups.lock().unwrap().push(ids.to_vec());
        let deleted = self.deleted.lock().unwrap();
        // Reverse so callers cannot rely on store order.
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|j| ids.contains(&j.id) && !deleted.contains(&j.id))
            .cloned()
            .map(JobDetails::from)
            .collect())
    }
}

pub struct FakeScoring {
    health: Mutex<ServiceHealth>,
    ranked: Mutex<Vec<RankedRecommendation>>,
    fail_train: AtomicBool,
    fail_recommend: AtomicBool,
    pub health_calls: AtomicUsize,
    pub train_calls: AtomicUsize,
    pub recommend_calls: AtomicUsize,
    pub trained: Mutex<Vec<JobSummary>>,
    pub last_top_n: Mutex<Option<usize>>,
    pub last_candidate: Mutex<Option<CandidateProfile>>,
}

impl Default for FakeScoring {
    fn default() -> Self {
        FakeScoring {
            health: Mutex::new(ServiceHealth::Healthy),
            ranked: Mutex::new(Vec::new()),
            fail_train: AtomicBool::new(false),
            fail_recommend: AtomicBool::new(false),
            health_calls: AtomicUsize::new(0),
            train_calls: AtomicUsize::new(0),
            recommend_calls: AtomicUsize::new(0),
            trained: Mutex::new(Vec::new()),
            last_top_n: Mutex::new(None),
            last_candidate: Mutex::new(None),
        }
    }
}

impl FakeScoring {
    pub fn total_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
            + self.train_calls.load(Ordering::SeqCst)
            + self.recommend_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScoringService for FakeScoring {
    async fn health(&self) -> ServiceHealth {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        *self.health.lock().unwrap()
    }

    async fn train(&self, jobs: &[JobSummary]) -> Result<(), ScoringError> {
        self.train_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_train.load(Ordering::SeqCst) {
            return Err(ScoringError::Api {
                status: 500,
                message: "training exploded".to_string(),
            });
        }
        *self.trained.lock().unwrap() = jobs.to_vec();
        Ok(())
    }

    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        top_n: usize,
    ) -> Result<Vec<RankedRecommendation>, ScoringError> {
        self.recommend_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_top_n.lock().unwrap() = Some(top_n);
        *self.last_candidate.lock().unwrap() = Some(candidate.clone());
        if self.fail_recommend.load(Ordering::SeqCst) {
            return Err(ScoringError::Api {
                status: 400,
                message: "Engine not trained. Call /train first.".to_string(),
            });
        }
        Ok(self.ranked.lock().unwrap().clone())
    }
}

/// Wires the three doubles into a `RecommendationService`.
#[derive(Default)]
pub struct Harness {
    pub candidates: Arc<MemoryCandidates>,
    pub jobs: Arc<MemoryJobs>,
    pub scoring: Arc<FakeScoring>,
}

impl Harness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidate(self, profile: CandidateProfile) -> Self {
        self.candidates
            .profiles
            .lock()
            .unwrap()
            .insert(profile.id.clone(), profile);
        self
    }

    pub fn with_jobs(self, jobs: Vec<JobRow>) -> Self {
        self.jobs.jobs.lock().unwrap().extend(jobs);
        self
    }

    pub fn with_deleted_after_corpus_load(self, job_id: &str) -> Self {
        self.jobs.deleted.lock().unwrap().insert(job_id.to_string());
        self
    }

    pub fn with_health(self, health: ServiceHealth) -> Self {
        *self.scoring.health.lock().unwrap() = health;
        self
    }

    pub fn with_ranked(self, ranked: Vec<RankedRecommendation>) -> Self {
        *self.scoring.ranked.lock().unwrap() = ranked;
        self
    }

    pub fn with_train_failure(self) -> Self {
        self.scoring.fail_train.store(true, Ordering::SeqCst);
        self
    }

    pub fn with_recommend_failure(self) -> Self {
        self.scoring.fail_recommend.store(true, Ordering::SeqCst);
        self
    }

    pub fn service(&self) -> RecommendationService {
        RecommendationService::new(
            self.candidates.clone(),
            self.jobs.clone(),
            self.scoring.clone(),
            Arc::new(HexIdValidator::default()),
        )
    }
}
