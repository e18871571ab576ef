use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::repository::{self, JobFilter};
use super::validation::{validate_job_patch, validate_new_job, CreateJobRequest, UpdateJobRequest};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::job::{JobDetails, JobRow, JobStatus, JobType};
use crate::models::pagination::{PageQuery, Pagination};
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub location: Option<String>,
    pub job_type: Option<String>,
    /// Comma-separated; a job matches if it requires any of them.
    pub skills: Option<String>,
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecruiterJobsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<JobDetails>,
    pub pagination: Pagination,
}

impl JobListQuery {
    /// Builds the public filter. Status defaults to `active`; pending
    /// postings are only visible to their recruiter and admins.
    pub fn to_filter(&self) -> Result<JobFilter, AppError> {
        let status = match non_empty(&self.status) {
            None => JobStatus::Active,
            Some(raw) => raw.parse::<JobStatus>().map_err(AppError::Validation)?,
        };
        if status == JobStatus::Pending {
            return Err(AppError::Validation(
                "Pending jobs are not publicly listed".to_string(),
            ));
        }

        let job_type = match non_empty(&self.job_type) {
            None => None,
            Some(raw) => Some(
                raw.parse::<JobType>()
                    .map_err(AppError::Validation)?
                    .as_str()
                    .to_string(),
            ),
        };

        Ok(JobFilter {
            status: Some(status),
            recruiter_id: None,
            location: non_empty(&self.location).map(str::to_string),
            job_type,
            skills: split_skills(self.skills.as_deref()),
            search: non_empty(&self.search).map(str::to_string),
        })
    }

    fn page(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            limit: self.limit,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn split_skills(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Fails with 403 unless the caller owns `job` or is an admin.
pub(crate) fn ensure_can_manage(user: &AuthUser, job: &JobRow) -> Result<(), AppError> {
    if user.is_admin() || (user.role == Role::Recruiter && job.recruiter_id == user.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "You can only manage your own job postings".to_string(),
        ))
    }
}

pub(crate) async fn load_job(state: &AppState, id: &str) -> Result<JobRow, AppError> {
    repository::find_job_by_id(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))
}

/// GET /api/v1/jobs
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    let filter = query.to_filter()?;
    let page = query.page();
    let (jobs, total) = repository::list_jobs(&state.db, &filter, &page).await?;

    Ok(Json(JobListResponse {
        jobs,
        pagination: page.meta(total),
    }))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobDetails>, AppError> {
    let job = repository::find_job_details(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    Ok(Json(job))
}

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    user.require_role(&[Role::Recruiter])?;

    let new_job = validate_new_job(req)?;
    let job = repository::insert_job(&state.db, &user.id, &new_job).await?;
    info!(job_id = %job.id, recruiter_id = %user.id, "Job posted for moderation");

    Ok((StatusCode::CREATED, Json(job)))
}

/// PUT /api/v1/jobs/:id
pub async fn handle_update_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    let job = load_job(&state, &id).await?;
    ensure_can_manage(&user, &job)?;

    let patch = validate_job_patch(req, (job.salary_min, job.salary_max))?;
    let updated = repository::update_job(&state.db, &id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(updated))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let job = load_job(&state, &id).await?;
    ensure_can_manage(&user, &job)?;

    repository::delete_job(&state.db, &id).await?;
    info!(job_id = %id, deleted_by = %user.id, "Job deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/jobs/recruiter/mine
pub async fn handle_recruiter_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RecruiterJobsQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    user.require_role(&[Role::Recruiter])?;

    let status = non_empty(&query.status)
        .map(|raw| raw.parse::<JobStatus>().map_err(AppError::Validation))
        .transpose()?;
    let filter = JobFilter {
        status,
        recruiter_id: Some(user.id.clone()),
        ..JobFilter::default()
    };
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (jobs, total) = repository::list_jobs(&state.db, &filter, &page).await?;

    Ok(Json(JobListResponse {
        jobs,
        pagination: page.meta(total),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::fixtures;

    fn user(id: &str, role: Role) -> AuthUser {
        AuthUser {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn test_public_filter_defaults_to_active() {
        let filter = JobListQuery::default().to_filter().unwrap();
        assert_eq!(filter.status, Some(JobStatus::Active));
        assert!(filter.skills.is_empty());
    }

    #[test]
    fn test_public_filter_rejects_pending() {
        let query = JobListQuery {
            status: Some("pending".to_string()),
            ..JobListQuery::default()
        };
        assert!(matches!(query.to_filter(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_public_filter_parses_skills_and_type() {
        let query = JobListQuery {
            skills: Some("React, Node.js,,".to_string()),
            job_type: Some("contract".to_string()),
            location: Some("  ".to_string()),
            ..JobListQuery::default()
        };
        let filter = query.to_filter().unwrap();
        assert_eq!(filter.skills, vec!["React", "Node.js"]);
        assert_eq!(filter.job_type.as_deref(), Some("Contract"));
        assert_eq!(filter.location, None);
    }

    #[test]
    fn test_owner_and_admin_can_manage() {
        let job = fixtures::job("65f0000000000000000000a1", "Backend Engineer");
        assert!(ensure_can_manage(&user(&job.recruiter_id, Role::Recruiter), &job).is_ok());
        assert!(ensure_can_manage(&user("someone-else", Role::Admin), &job).is_ok());
    }

    #[test]
    fn test_other_recruiter_cannot_manage() {
        let job = fixtures::job("65f0000000000000000000a1", "Backend Engineer");
        let result = ensure_can_manage(&user("65f0000000000000000000ff", Role::Recruiter), &job);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }

    #[test]
    fn test_candidate_with_matching_id_cannot_manage() {
        let job = fixtures::job("65f0000000000000000000a1", "Backend Engineer");
        let result = ensure_can_manage(&user(&job.recruiter_id, Role::Candidate), &job);
        assert!(matches!(result, Err(AppError::Forbidden(_))));
    }
}
