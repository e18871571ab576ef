use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::repository;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::handlers::{ensure_can_manage, load_job};
use crate::models::application::{
    ApplicationRow, ApplicationStatus, CandidateApplicationRow, JobApplicantRow,
};
use crate::models::job::{JobRow, JobStatus};
use crate::models::pagination::{PageQuery, Pagination};
use crate::models::user::Role;
use crate::state::AppState;

pub const COVER_LETTER_MAX_CHARS: usize = 5000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    #[serde(default)]
    pub job_id: String,
    pub cover_letter: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyApplicationsQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CandidateApplicationsResponse {
    pub applications: Vec<CandidateApplicationRow>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct JobApplicantsResponse {
    pub applications: Vec<JobApplicantRow>,
    pub pagination: Pagination,
}

/// Trims the cover letter and rejects oversize text. Blank becomes `None`.
pub fn normalize_cover_letter(raw: Option<String>) -> Result<Option<String>, AppError> {
    let Some(text) = raw.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) else {
        return Ok(None);
    };
    if text.chars().count() > COVER_LETTER_MAX_CHARS {
        return Err(AppError::Validation(format!(
            "coverLetter cannot exceed {COVER_LETTER_MAX_CHARS} characters"
        )));
    }
    Ok(Some(text))
}

/// Only `active` postings take applications.
pub fn ensure_accepting_applications(job: &JobRow) -> Result<(), AppError> {
    if job.status == JobStatus::Active {
        Ok(())
    } else {
        Err(AppError::Validation(
            "This job is not accepting applications".to_string(),
        ))
    }
}

/// POST /api/v1/applications
pub async fn handle_apply(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    user.require_role(&[Role::Candidate])?;

    let job_id = req.job_id.trim();
    if job_id.is_empty() {
        return Err(AppError::Validation("jobId is required".to_string()));
    }
    let cover_letter = normalize_cover_letter(req.cover_letter)?;

    let job = load_job(&state, job_id).await?;
    ensure_accepting_applications(&job)?;

    let application =
        repository::insert_application(&state.db, &user.id, job_id, cover_letter.as_deref())
            .await?;
    info!(application_id = %application.id, job_id, user_id = %user.id, "Application submitted");

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications/mine
pub async fn handle_my_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<MyApplicationsQuery>,
) -> Result<Json<CandidateApplicationsResponse>, AppError> {
    user.require_role(&[Role::Candidate])?;

    let status = query
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<ApplicationStatus>().map_err(AppError::Validation))
        .transpose()?;
    let page = PageQuery {
        page: query.page,
        limit: query.limit,
    };

    let (applications, total) =
        repository::list_for_candidate(&state.db, &user.id, status, &page).await?;

    Ok(Json(CandidateApplicationsResponse {
        applications,
        pagination: page.meta(total),
    }))
}

/// GET /api/v1/applications/job/:jobId
pub async fn handle_job_applications(
    State(state): State<AppState>,
    user: AuthUser,
    Path(job_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<JobApplicantsResponse>, AppError> {
    let job = load_job(&state, &job_id).await?;
    ensure_can_manage(&user, &job)?;

    let (applications, total) = repository::list_for_job(&state.db, &job_id, &page).await?;

    Ok(Json(JobApplicantsResponse {
        applications,
        pagination: page.meta(total),
    }))
}

/// PUT /api/v1/applications/:id/status
pub async fn handle_update_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<StatusUpdateRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    let status = req
        .status
        .parse::<ApplicationStatus>()
        .map_err(AppError::Validation)?;

    let application = repository::find_application(&state.db, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    let job = load_job(&state, &application.job_id).await?;
    ensure_can_manage(&user, &job)?;

    let updated = repository::set_application_status(&state.db, &id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    info!(application_id = %id, status = status.as_str(), reviewer = %user.id, "Application reviewed");

    Ok(Json(updated))
}
