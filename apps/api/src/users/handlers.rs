use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Deserialize;
use tracing::info;

use super::files::{store_user_file, PgUserFileIndex};
use super::repository::{self, ProfilePatch};
use super::uploads::{UploadRule, PROFILE_IMAGE, RESUME};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::jobs::validation::clean_skills;
use crate::models::user::{Role, UserRow};
use crate::state::AppState;

pub const NAME_MAX_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<i32>,
    pub location: Option<String>,
    pub education: Option<String>,
}

/// Checks the provided profile fields. All problems are reported together.
pub fn validate_profile_patch(req: UpdateProfileRequest) -> Result<ProfilePatch, AppError> {
    let mut errors = Vec::new();

    let name = req.name.map(|n| n.trim().to_string());
    if let Some(name) = &name {
        if name.is_empty() || name.chars().count() > NAME_MAX_CHARS {
            errors.push(format!("name must be between 1 and {NAME_MAX_CHARS} characters"));
        }
    }

    let email = req.email.map(|e| e.trim().to_lowercase());
    if let Some(email) = &email {
        if !looks_like_email(email) {
            errors.push("email is not a valid address".to_string());
        }
    }

    if matches!(req.experience, Some(years) if years < 0) {
        errors.push("experience cannot be negative".to_string());
    }

    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    Ok(ProfilePatch {
        name,
        email,
        skills: req.skills.map(clean_skills),
        experience: req.experience,
        location: req.location.map(|l| l.trim().to_string()),
        education: req.education.map(|e| e.trim().to_string()),
    })
}

pub(crate) fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// GET /api/v1/users/profile
pub async fn handle_get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserRow>, AppError> {
    let profile = repository::find_user_by_id(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    Ok(Json(profile))
}

/// PUT /api/v1/users/profile
pub async fn handle_update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserRow>, AppError> {
    user.require_role(&[Role::Candidate])?;

    let patch = validate_profile_patch(req)?;
    let profile = repository::update_profile(&state.db, &user.id, &patch)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Profile updated");
    Ok(Json(profile))
}

/// POST /api/v1/users/resume
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<UserRow>, AppError> {
    user.require_role(&[Role::Candidate])?;
    store_upload(&state, &user, multipart, &RESUME).await.map(Json)
}

/// POST /api/v1/users/profile-image
pub async fn handle_upload_profile_image(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> Result<Json<UserRow>, AppError> {
    store_upload(&state, &user, multipart, &PROFILE_IMAGE).await.map(Json)
}

/// Reads and checks `rule.field` from the form, then hands it to `store_user_file`.
async fn store_upload(
    state: &AppState,
    user: &AuthUser,
    mut multipart: Multipart,
    rule: &UploadRule,
) -> Result<UserRow, AppError> {
    let mut data = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() == Some(rule.field) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read {}: {e}", rule.field)))?;
            data = Some(bytes);
            break;
        }
    }

    let data = data.ok_or_else(|| {
        AppError::Validation(format!("Multipart field '{}' is required", rule.field))
    })?;
    let upload = rule.validate(data)?;

    let key = rule.object_key(&user.id, upload.extension);
    let index = PgUserFileIndex::new(state.db.clone());
    store_user_file(state.storage.as_ref(), &index, &user.id, rule.target, &key, upload).await
}
