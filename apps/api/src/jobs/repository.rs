use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::errors::AppError;
use crate::models::job::{JobDetails, JobRow, JobStatus, JobWithRecruiterRow};
use crate::models::new_object_id;
use crate::models::pagination::PageQuery;

const JOB_DETAILS_SELECT: &str = r#"
    SELECT j.*,
           u.name AS recruiter_name,
           u.email AS recruiter_email,
           u.company_name AS recruiter_company
    FROM jobs j
    LEFT JOIN users u ON u.id = j.recruiter_id
"#;

/// Validated fields for a new posting.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJob {
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub job_type: String,
    pub experience_required: i32,
    pub company_name: Option<String>,
}

/// Validated partial update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub skills_required: Option<Vec<String>>,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub job_type: Option<String>,
    pub experience_required: Option<i32>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub recruiter_id: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    /// Matches jobs requiring any of these skills.
    pub skills: Vec<String>,
    /// Substring of title, description or company name.
    pub search: Option<String>,
}

/// Every job with the given status, newest first.
pub async fn find_jobs_by_status(pool: &PgPool, status: JobStatus) -> Result<Vec<JobRow>, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        "SELECT * FROM jobs WHERE status = $1 ORDER BY posted_on DESC",
    )
    .bind(status.as_str())
    .fetch_all(pool)
    .await?)
}

/// Jobs whose id is in `ids`, with recruiter display fields.
pub async fn find_job_details_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<JobDetails>, AppError> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, JobWithRecruiterRow>(&format!(
        "{JOB_DETAILS_SELECT} WHERE j.id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(JobDetails::from).collect())
}

pub async fn find_job_by_id(pool: &PgPool, id: &str) -> Result<Option<JobRow>, AppError> {
    Ok(sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn find_job_details(pool: &PgPool, id: &str) -> Result<Option<JobDetails>, AppError> {
    let row = sqlx::query_as::<_, JobWithRecruiterRow>(&format!(
        "{JOB_DETAILS_SELECT} WHERE j.id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(JobDetails::from))
}

/// One page of jobs matching `filter`, newest first, plus the total match count.
pub async fn list_jobs(
    pool: &PgPool,
    filter: &JobFilter,
    page: &PageQuery,
) -> Result<(Vec<JobDetails>, i64), AppError> {
    let mut count_query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM jobs j");
    push_filters(&mut count_query, filter);
    let total: i64 = count_query
        .build_query_scalar::<i64>()
        .fetch_one(pool)
        .await?;

    let mut select = QueryBuilder::<Postgres>::new(JOB_DETAILS_SELECT);
    push_filters(&mut select, filter);
    select
        .push(" ORDER BY j.posted_on DESC LIMIT ")
        .push_bind(page.limit())
        .push(" OFFSET ")
        .push_bind(page.offset());

    let rows = select
        .build_query_as::<JobWithRecruiterRow>()
        .fetch_all(pool)
        .await?;

    Ok((rows.into_iter().map(JobDetails::from).collect(), total))
}

fn push_filters(query: &mut QueryBuilder<'_, Postgres>, filter: &JobFilter) {
    query.push(" WHERE TRUE");

    if let Some(status) = filter.status {
        query.push(" AND j.status = ").push_bind(status.as_str());
    }
    if let Some(recruiter_id) = &filter.recruiter_id {
        query.push(" AND j.recruiter_id = ").push_bind(recruiter_id.clone());
    }
    if let Some(location) = &filter.location {
        query
            .push(" AND j.location ILIKE ")
            .push_bind(contains_pattern(location));
    }
    if let Some(job_type) = &filter.job_type {
        query.push(" AND j.job_type = ").push_bind(job_type.clone());
    }
    if !filter.skills.is_empty() {
        query
            .push(" AND j.skills_required && ")
            .push_bind(filter.skills.clone());
    }
    if let Some(search) = &filter.search {
        let pattern = contains_pattern(search);
        query
            .push(" AND (j.title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR j.company_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// `%term%` with LIKE metacharacters in `term` escaped.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

pub async fn insert_job(pool: &PgPool, recruiter_id: &str, job: &NewJob) -> Result<JobRow, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs
            (id, title, description, skills_required, location, salary_min, salary_max,
             job_type, experience_required, company_name, recruiter_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        RETURNING *
        "#,
    )
    .bind(new_object_id())
    .bind(&job.title)
    .bind(&job.description)
    .bind(&job.skills_required)
    .bind(&job.location)
    .bind(job.salary_min)
    .bind(job.salary_max)
    .bind(&job.job_type)
    .bind(job.experience_required)
    .bind(&job.company_name)
    .bind(recruiter_id)
    .bind(JobStatus::Pending.as_str())
    .fetch_one(pool)
    .await?)
}

pub async fn update_job(pool: &PgPool, id: &str, patch: &JobPatch) -> Result<Option<JobRow>, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        r#"
        UPDATE jobs SET
            title = COALESCE($2, title),
            description = COALESCE($3, description),
            skills_required = COALESCE($4, skills_required),
            location = COALESCE($5, location),
            salary_min = COALESCE($6, salary_min),
            salary_max = COALESCE($7, salary_max),
            job_type = COALESCE($8, job_type),
            experience_required = COALESCE($9, experience_required),
            company_name = COALESCE($10, company_name),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.title)
    .bind(&patch.description)
    .bind(&patch.skills_required)
    .bind(&patch.location)
    .bind(patch.salary_min)
    .bind(patch.salary_max)
    .bind(&patch.job_type)
    .bind(patch.experience_required)
    .bind(&patch.company_name)
    .fetch_optional(pool)
    .await?)
}

pub async fn set_job_status(
    pool: &PgPool,
    id: &str,
    status: JobStatus,
) -> Result<Option<JobRow>, AppError> {
    Ok(sqlx::query_as::<_, JobRow>(
        "UPDATE jobs SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(status.as_str())
    .fetch_optional(pool)
    .await?)
}

/// Returns `false` when no job had this id.
pub async fn delete_job(pool: &PgPool, id: &str) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn count_jobs(pool: &PgPool, status: Option<JobStatus>) -> Result<i64, AppError> {
    Ok(sqlx::query_scalar(
        "SELECT COUNT(*) FROM jobs WHERE ($1::TEXT IS NULL OR status = $1)",
    )
    .bind(status.map(|s| s.as_str()))
    .fetch_one(pool)
    .await?)
}
