use serde::{Deserialize, Serialize};

use crate::models::job::{JobDetails, JobRow, JobType};
use crate::models::user::UserRow;

pub const DEFAULT_LOCATION: &str = "Remote";
pub const DEFAULT_COMPANY: &str = "Unknown";

/// What the scoring service needs to know about a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateProfile {
    pub id: String,
    pub name: String,
    /// Blank entries are dropped when the profile is built.
    pub skills: Vec<String>,
    pub experience: i32,
    pub location: String,
}

impl From<&UserRow> for CandidateProfile {
    fn from(user: &UserRow) -> Self {
        CandidateProfile {
            id: user.id.clone(),
            name: user.name.clone(),
            skills: user
                .skills
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            experience: user.experience.max(0),
            location: non_blank(user.location.as_deref()).unwrap_or(DEFAULT_LOCATION).to_string(),
        }
    }
}

/// One job of the training batch. Derived per request, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct JobSummary {
    pub id: String,
    pub title: String,
    pub description: String,
    pub skills_required: Vec<String>,
    pub location: String,
    pub company_name: String,
    pub job_type: String,
}

impl From<&JobRow> for JobSummary {
    fn from(job: &JobRow) -> Self {
        JobSummary {
            id: job.id.clone(),
            title: job.title.clone(),
            description: job.description.clone(),
            skills_required: job.skills_required.clone(),
            location: non_blank(Some(&job.location)).unwrap_or(DEFAULT_LOCATION).to_string(),
            company_name: non_blank(job.company_name.as_deref())
                .unwrap_or(DEFAULT_COMPANY)
                .to_string(),
            job_type: non_blank(Some(&job.job_type))
                .unwrap_or(JobType::DEFAULT.as_str())
                .to_string(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One scored result from the scoring service. Untrusted: `job_id` may not
/// name a real job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedRecommendation {
    #[serde(rename = "jobId")]
    pub job_id: String,
    /// Expected in [0, 1].
    pub similarity_score: f64,
    /// Expected in [0, 100].
    pub skills_match: f64,
}

/// A ranked result merged with the authoritative job record, or `null`
/// details when the job no longer exists.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedRecommendation {
    #[serde(flatten)]
    pub ranked: RankedRecommendation,
    #[serde(rename = "jobDetails")]
    pub job_details: Option<JobDetails>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum RecommendationList {
    Enriched(Vec<EnrichedRecommendation>),
    /// Raw scoring output, returned only when every identifier failed
    /// validation. Consumers must handle both shapes.
    Unenriched(Vec<RankedRecommendation>),
}

impl RecommendationList {
    pub fn len(&self) -> usize {
        match self {
            RecommendationList::Enriched(items) => items.len(),
            RecommendationList::Unenriched(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecommendationResponse {
    pub recommendations: RecommendationList,
    pub count: usize,
    /// `false` on the fallback path where raw scoring output is returned.
    pub enriched: bool,
    pub message: String,
}

impl RecommendationResponse {
    pub fn no_jobs() -> Self {
        RecommendationResponse {
            recommendations: RecommendationList::Enriched(Vec::new()),
            count: 0,
            enriched: true,
            message: "No jobs available".to_string(),
        }
    }

    pub fn enriched(items: Vec<EnrichedRecommendation>) -> Self {
        RecommendationResponse {
            count: items.len(),
            recommendations: RecommendationList::Enriched(items),
            enriched: true,
            message: "Job recommendations retrieved successfully".to_string(),
        }
    }

    pub fn unenriched(items: Vec<RankedRecommendation>) -> Self {
        RecommendationResponse {
            count: items.len(),
            recommendations: RecommendationList::Unenriched(items),
            enriched: false,
            message: "Job recommendations retrieved successfully".to_string(),
        }
    }
}
