use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::application::{
    ApplicationRow, ApplicationStatus, CandidateApplicationRow, JobApplicantRow,
};
use crate::models::new_object_id;
use crate::models::pagination::PageQuery;

/// Records an application and bumps the job's counter atomically.
/// A second application by the same candidate to the same job is a conflict.
pub async fn insert_application(
    pool: &PgPool,
    user_id: &str,
    job_id: &str,
    cover_letter: Option<&str>,
) -> Result<ApplicationRow, AppError> {
    let mut tx = pool.begin().await?;

    let application = sqlx::query_as::<_, ApplicationRow>(
        r#"
        INSERT INTO applications (id, user_id, job_id, status, cover_letter)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(new_object_id())
    .bind(user_id)
    .bind(job_id)
    .bind(ApplicationStatus::Pending.as_str())
    .bind(cover_letter)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("You have already applied to this job".to_string())
        }
        _ => AppError::from(e),
    })?;

    sqlx::query(
        "UPDATE jobs SET applications_count = applications_count + 1, updated_at = NOW() WHERE id = $1",
    )
    .bind(job_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(application)
}

pub async fn find_application(pool: &PgPool, id: &str) -> Result<Option<ApplicationRow>, AppError> {
    Ok(
        sqlx::query_as::<_, ApplicationRow>("SELECT * FROM applications WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// A candidate's applications, newest first, with job summary columns.
pub async fn list_for_candidate(
    pool: &PgPool,
    user_id: &str,
    status: Option<ApplicationStatus>,
    page: &PageQuery,
) -> Result<(Vec<CandidateApplicationRow>, i64), AppError> {
    let status = status.map(|s| s.as_str());

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE user_id = $1 AND ($2::TEXT IS NULL OR status = $2)",
    )
    .bind(user_id)
    .bind(status)
    .fetch_one(pool)
    .await?;

    let rows = sqlx::query_as::<_, CandidateApplicationRow>(
        r#"
        SELECT a.*,
               j.title AS job_title,
               j.company_name AS job_company_name,
               j.location AS job_location,
               j.job_type AS job_type,
               j.salary_min AS job_salary_min,
               j.salary_max AS job_salary_max
        FROM applications a
        LEFT JOIN jobs j ON j.id = a.job_id
        WHERE a.user_id = $1 AND ($2::TEXT IS NULL OR a.status = $2)
        ORDER BY a.applied_on DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(status)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

/// Applicants to one job, newest first.
pub async fn list_for_job(
    pool: &PgPool,
    job_id: &str,
    page: &PageQuery,
) -> Result<(Vec<JobApplicantRow>, i64), AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM applications WHERE job_id = $1")
        .bind(job_id)
        .fetch_one(pool)
        .await?;

    let rows = sqlx::query_as::<_, JobApplicantRow>(
        r#"
        SELECT a.*,
               u.name AS applicant_name,
               u.email AS applicant_email,
               u.skills AS applicant_skills,
               u.resume_url AS applicant_resume_url
        FROM applications a
        JOIN users u ON u.id = a.user_id
        WHERE a.job_id = $1
        ORDER BY a.applied_on DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(job_id)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((rows, total))
}

pub async fn set_application_status(
    pool: &PgPool,
    id: &str,
    status: ApplicationStatus,
) -> Result<Option<ApplicationRow>, AppError> {
    Ok(sqlx::query_as::<_, ApplicationRow>(
        r#"
        UPDATE applications
        SET status = $2, reviewed_on = NOW(), updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?)
}

pub async fn count_applications(
    pool: &PgPool,
    status: Option<ApplicationStatus>,
) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM applications WHERE ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?)
}
