use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    Shortlisted,
    Rejected,
    Accepted,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::Rejected => "rejected",
            ApplicationStatus::Accepted => "accepted",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ApplicationStatus::Pending),
            "reviewed" => Ok(ApplicationStatus::Reviewed),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "rejected" => Ok(ApplicationStatus::Rejected),
            "accepted" => Ok(ApplicationStatus::Accepted),
            other => Err(format!("Invalid application status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRow {
    pub id: String,
    pub user_id: String,
    pub job_id: String,
    pub status: String,
    pub cover_letter: Option<String>,
    pub applied_on: DateTime<Utc>,
    pub reviewed_on: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A candidate's own application joined with the job's display fields.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateApplicationRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub job_title: Option<String>,
    pub job_company_name: Option<String>,
    pub job_location: Option<String>,
    pub job_type: Option<String>,
    pub job_salary_min: Option<i64>,
    pub job_salary_max: Option<i64>,
}

/// An application to a recruiter's job joined with the applicant's fields.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicantRow {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub application: ApplicationRow,
    pub applicant_name: String,
    pub applicant_email: String,
    pub applicant_skills: Vec<String>,
    pub applicant_resume_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_accepts_known_values() {
        assert_eq!(
            "Shortlisted".parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Shortlisted
        );
        assert_eq!(
            ApplicationStatus::Accepted.as_str().parse::<ApplicationStatus>().unwrap(),
            ApplicationStatus::Accepted
        );
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        let err = "hired".parse::<ApplicationStatus>().unwrap_err();
        assert!(err.contains("hired"));
    }
}
