use serde::Deserialize;

use super::repository::{JobPatch, NewJob};
use crate::errors::AppError;
use crate::models::job::JobType;

pub const TITLE_MIN_CHARS: usize = 5;
pub const TITLE_MAX_CHARS: usize = 100;
pub const DESCRIPTION_MIN_CHARS: usize = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub skills_required: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub salary_min: i64,
    #[serde(default)]
    pub salary_max: i64,
    pub job_type: Option<String>,
    #[serde(default)]
    pub experience_required: i32,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
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

/// Checks a create request and normalises it into insertable fields.
/// All problems are reported together as one validation error.
pub fn validate_new_job(req: CreateJobRequest) -> Result<NewJob, AppError> {
    let mut errors = Vec::new();

    let title = req.title.trim().to_string();
    check_title(&title, &mut errors);

    let description = req.description.trim().to_string();
    check_description(&description, &mut errors);

    let location = req.location.trim().to_string();
    if location.is_empty() {
        errors.push("location is required".to_string());
    }

    check_salary(req.salary_min, req.salary_max, &mut errors);
    check_experience(req.experience_required, &mut errors);

    let job_type = match req.job_type.as_deref() {
        None => JobType::DEFAULT,
        Some(raw) => parse_job_type(raw, &mut errors).unwrap_or(JobType::DEFAULT),
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    Ok(NewJob {
        title,
        description,
        skills_required: clean_skills(req.skills_required),
        location,
        salary_min: req.salary_min,
        salary_max: req.salary_max,
        job_type: job_type.as_str().to_string(),
        experience_required: req.experience_required,
        company_name: non_blank(req.company_name),
    })
}

/// Checks the provided fields of an update. Salary bounds are checked
/// against `current` when only one side is supplied.
pub fn validate_job_patch(
    req: UpdateJobRequest,
    current_salary: (i64, i64),
) -> Result<JobPatch, AppError> {
    let mut errors = Vec::new();

    let title = req.title.map(|t| t.trim().to_string());
    if let Some(title) = &title {
        check_title(title, &mut errors);
    }

    let description = req.description.map(|d| d.trim().to_string());
    if let Some(description) = &description {
        check_description(description, &mut errors);
    }

    let location = req.location.map(|l| l.trim().to_string());
    if matches!(&location, Some(l) if l.is_empty()) {
        errors.push("location cannot be empty".to_string());
    }

    if req.salary_min.is_some() || req.salary_max.is_some() {
        check_salary(
            req.salary_min.unwrap_or(current_salary.0),
            req.salary_max.unwrap_or(current_salary.1),
            &mut errors,
        );
    }

    if let Some(experience) = req.experience_required {
        check_experience(experience, &mut errors);
    }

    let job_type = req
        .job_type
        .as_deref()
        .and_then(|raw| parse_job_type(raw, &mut errors))
        .map(|t| t.as_str().to_string());

    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    Ok(JobPatch {
        title,
        description,
        skills_required: req.skills_required.map(clean_skills),
        location,
        salary_min: req.salary_min,
        salary_max: req.salary_max,
        job_type,
        experience_required: req.experience_required,
        company_name: non_blank(req.company_name),
    })
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    let len = title.chars().count();
    if !(TITLE_MIN_CHARS..=TITLE_MAX_CHARS).contains(&len) {
        errors.push(format!(
            "title must be between {TITLE_MIN_CHARS} and {TITLE_MAX_CHARS} characters"
        ));
    }
}

fn check_description(description: &str, errors: &mut Vec<String>) {
    if description.chars().count() < DESCRIPTION_MIN_CHARS {
        errors.push(format!(
            "description must be at least {DESCRIPTION_MIN_CHARS} characters"
        ));
    }
}

fn check_salary(min: i64, max: i64, errors: &mut Vec<String>) {
    if min < 0 || max < 0 {
        errors.push("salary cannot be negative".to_string());
    }
    if min > max {
        errors.push("salaryMin cannot exceed salaryMax".to_string());
    }
}

fn check_experience(years: i32, errors: &mut Vec<String>) {
    if years < 0 {
        errors.push("experienceRequired cannot be negative".to_string());
    }
}

fn parse_job_type(raw: &str, errors: &mut Vec<String>) -> Option<JobType> {
    match raw.parse::<JobType>() {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Trims skills and drops blanks and case-insensitive duplicates, keeping first spelling.
pub(crate) fn clean_skills(skills: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    skills
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
