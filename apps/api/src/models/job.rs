use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Active,
    Closed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Active => "active",
            JobStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(JobStatus::Pending),
            "active" => Ok(JobStatus::Active),
            "closed" => Ok(JobStatus::Closed),
            other => Err(format!("Invalid job status '{other}'")),
        }
    }
}

/// A `jobs.status` value outside the known set.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct UnknownJobStatus(String);

/// Row boundary conversion for the `status` TEXT column.
impl TryFrom<String> for JobStatus {
    type Error = UnknownJobStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map_err(UnknownJobStatus)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum JobType {
    #[serde(rename = "Full-time")]
    FullTime,
    #[serde(rename = "Part-time")]
    PartTime,
    Contract,
    Internship,
    Remote,
}

impl JobType {
    pub const DEFAULT: JobType = JobType::FullTime;

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::FullTime => "Full-time",
            JobType::PartTime => "Part-time",
            JobType::Contract => "Contract",
            JobType::Internship => "Internship",
            JobType::Remote => "Remote",
        }
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full-time" => Ok(JobType::FullTime),
            "part-time" => Ok(JobType::PartTime),
            "contract" => Ok(JobType::Contract),
            "internship" => Ok(JobType::Internship),
            "remote" => Ok(JobType::Remote),
            other => Err(format!("Invalid job type '{other}'")),
        }
    }
}

/// A row of the `jobs` table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    pub id: String,
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub salary_min: i64,
    pub salary_max: i64,
    pub job_type: String,
    pub experience_required: i32,
    pub company_name: Option<String>,
    pub recruiter_id: String,
    #[sqlx(try_from = "String")]
    pub status: JobStatus,
    pub posted_on: DateTime<Utc>,
    pub applications_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Recruiter display fields joined onto a job. Cosmetic only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecruiterSummary {
    pub name: String,
    pub email: String,
    pub company_name: Option<String>,
}

/// A job together with its recruiter's display fields, as returned by
/// every read endpoint and by recommendation enrichment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JobDetails {
    #[serde(flatten)]
    pub job: JobRow,
    pub recruiter: Option<RecruiterSummary>,
}

impl From<JobRow> for JobDetails {
    fn from(job: JobRow) -> Self {
        JobDetails {
            job,
            recruiter: None,
        }
    }
}

/// Flat SQL shape of a `jobs LEFT JOIN users` query.
#[derive(Debug, FromRow)]
pub struct JobWithRecruiterRow {
    #[sqlx(flatten)]
    pub job: JobRow,
    pub recruiter_name: Option<String>,
    pub recruiter_email: Option<String>,
    pub recruiter_company: Option<String>,
}

impl From<JobWithRecruiterRow> for JobDetails {
    fn from(row: JobWithRecruiterRow) -> Self {
        let recruiter = match (row.recruiter_name, row.recruiter_email) {
            (Some(name), Some(email)) => Some(RecruiterSummary {
                name,
                email,
                company_name: row.recruiter_company,
            }),
            _ => None,
        };
        JobDetails {
            job: row.job,
            recruiter,
        }
    }
}
