use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::applications::repository as applications_repo;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::handlers::JobListResponse;
use crate::jobs::repository::{self as jobs_repo, JobFilter};
use crate::models::application::ApplicationStatus;
use crate::models::job::{JobRow, JobStatus};
use crate::models::pagination::{PageQuery, Pagination};
use crate::models::user::{Role, UserRow};
use crate::state::AppState;
use crate::users::repository as users_repo;

#[derive(Debug, Serialize, PartialEq)]
pub struct UserCounts {
    pub total: i64,
    pub candidates: i64,
    pub recruiters: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct JobCounts {
    pub total: i64,
    pub active: i64,
    pub pending: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ApplicationCounts {
    pub total: i64,
    pub pending: i64,
    pub shortlisted: i64,
    pub rejected: i64,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct Overview {
    pub users: UserCounts,
    pub jobs: JobCounts,
    pub applications: ApplicationCounts,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<UserRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: String,
}

/// GET /api/v1/admin/overview
pub async fn handle_overview(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Overview>, AppError> {
    user.require_role(&[Role::Admin])?;
    let db = &state.db;

    let (users_total, candidates, recruiters) = tokio::try_join!(
        users_repo::count_users(db, None),
        users_repo::count_users(db, Some(Role::Candidate.as_str())),
        users_repo::count_users(db, Some(Role::Recruiter.as_str())),
    )?;
    let (jobs_total, active, pending_jobs) = tokio::try_join!(
        jobs_repo::count_jobs(db, None),
        jobs_repo::count_jobs(db, Some(JobStatus::Active)),
        jobs_repo::count_jobs(db, Some(JobStatus::Pending)),
    )?;
    let (applications_total, pending, shortlisted, rejected) = tokio::try_join!(
        applications_repo::count_applications(db, None),
        applications_repo::count_applications(db, Some(ApplicationStatus::Pending)),
        applications_repo::count_applications(db, Some(ApplicationStatus::Shortlisted)),
        applications_repo::count_applications(db, Some(ApplicationStatus::Rejected)),
    )?;

    Ok(Json(Overview {
        users: UserCounts {
            total: users_total,
            candidates,
            recruiters,
        },
        jobs: JobCounts {
            total: jobs_total,
            active,
            pending: pending_jobs,
        },
        applications: ApplicationCounts {
            total: applications_total,
            pending,
            shortlisted,
            rejected,
        },
    }))
}

/// GET /api/v1/admin/users?role=recruiter
pub async fn handle_list_users(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<UserListQuery>,
) -> Result<Json<UserListResponse>, AppError> {
    user.require_role(&[Role::Admin])?;

    let role = query
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(|r| r.parse::<Role>().map_err(AppError::Validation))
        .transpose()?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };
    let (users, total) = users_repo::list_users(&state.db, role, &page).await?;

    Ok(Json(UserListResponse {
        users,
        pagination: page.meta(total),
    }))
}

/// DELETE /api/v1/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    user.require_role(&[Role::Admin])?;
    if id == user.id {
        return Err(AppError::Validation(
            "Admins cannot delete their own account".to_string(),
        ));
    }

    let deleted = users_repo::delete_user(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    for key in [deleted.resume_key, deleted.profile_image_key].into_iter().flatten() {
        if let Err(e) = state.storage.delete(&key).await {
            warn!(key = %key, "Could not delete stored object: {e}");
        }
    }
    info!(user_id = %id, deleted_by = %user.id, "User deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/admin/users/:id/role
pub async fn handle_update_role(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<RoleUpdateRequest>,
) -> Result<Json<UserRow>, AppError> {
    user.require_role(&[Role::Admin])?;
    let role = req.role.parse::<Role>().map_err(AppError::Validation)?;

    let updated = users_repo::set_user_role(&state.db, &id, role)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;
    info!(user_id = %id, role = %role, changed_by = %user.id, "User role changed");

    Ok(Json(updated))
}

/// GET /api/v1/admin/jobs/pending
pub async fn handle_pending_jobs(
    State(state): State<AppState>,
    user: AuthUser,
    Query(page): Query<PageQuery>,
) -> Result<Json<JobListResponse>, AppError> {
    user.require_role(&[Role::Admin])?;

    let filter = JobFilter {
        status: Some(JobStatus::Pending),
        ..JobFilter::default()
    };
    let (jobs, total) = jobs_repo::list_jobs(&state.db, &filter, &page).await?;

    Ok(Json(JobListResponse {
        jobs,
        pagination: page.meta(total),
    }))
}

/// PUT /api/v1/admin/jobs/:id/approve
pub async fn handle_approve_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JobRow>, AppError> {
    moderate_job(&state, &user, &id, JobStatus::Active).await.map(Json)
}

/// PUT /api/v1/admin/jobs/:id/reject
pub async fn handle_reject_job(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<JobRow>, AppError> {
    moderate_job(&state, &user, &id, JobStatus::Closed).await.map(Json)
}

async fn moderate_job(
    state: &AppState,
    user: &AuthUser,
    id: &str,
    status: JobStatus,
) -> Result<JobRow, AppError> {
    user.require_role(&[Role::Admin])?;

    let job = jobs_repo::set_job_status(&state.db, id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;
    info!(job_id = %id, status = %status, moderator = %user.id, "Job moderated");

    Ok(job)
}
