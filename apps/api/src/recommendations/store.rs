use async_trait::async_trait;
use sqlx::PgPool;

use super::models::CandidateProfile;
use crate::errors::AppError;
use crate::jobs::repository as jobs_repo;
use crate::models::job::{JobDetails, JobRow, JobStatus};
use crate::users::repository as users_repo;

/// Read access to candidate profiles.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    async fn find_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, AppError>;
}

/// Read access to the authoritative job postings.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<JobRow>, AppError>;

    /// Jobs whose id is in `ids`, in no particular order. Unknown ids are
    /// simply absent from the result.
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<JobDetails>, AppError>;
}

#[derive(Clone)]
pub struct PgCandidateStore {
    pool: PgPool,
}

impl PgCandidateStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CandidateStore for PgCandidateStore {
    async fn find_candidate(&self, id: &str) -> Result<Option<CandidateProfile>, AppError> {
        let user = users_repo::find_user_by_id(&self.pool, id).await?;
        Ok(user.as_ref().map(CandidateProfile::from))
    }
}

#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn find_by_status(&self, status: JobStatus) -> Result<Vec<JobRow>, AppError> {
        jobs_repo::find_jobs_by_status(&self.pool, status).await
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<JobDetails>, AppError> {
        jobs_repo::find_job_details_by_ids(&self.pool, ids).await
    }
}
