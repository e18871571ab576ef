use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::extractors::AuthUser;
use super::password::{check_password_strength, hash_password, verify_password};
use crate::errors::AppError;
use crate::models::user::{Role, UserRow};
use crate::state::AppState;
use crate::users::handlers::looks_like_email;
use crate::users::repository::{self, NewUser};

pub const USERNAME_MIN_CHARS: usize = 3;
pub const USERNAME_MAX_CHARS: usize = 30;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
}

/// Normalises a registration. Usernames and emails are lowercased; only
/// candidate and recruiter accounts can be self-registered.
pub fn validate_registration(req: &RegisterRequest) -> Result<NewUser, AppError> {
    let mut errors = Vec::new();

    let name = req.name.trim().to_string();
    if name.is_empty() {
        errors.push("name is required".to_string());
    }

    let username = req.username.trim().to_lowercase();
    let username_len = username.chars().count();
    if !(USERNAME_MIN_CHARS..=USERNAME_MAX_CHARS).contains(&username_len)
        || !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
    {
        errors.push(format!(
            "username must be {USERNAME_MIN_CHARS}-{USERNAME_MAX_CHARS} letters, digits, '.', '_' or '-'"
        ));
    }

    let email = req.email.trim().to_lowercase();
    if !looks_like_email(&email) {
        errors.push("email is not a valid address".to_string());
    }

    if let Err(e) = check_password_strength(&req.password) {
        errors.push(e);
    }

    let role = match req.role.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
        None => Role::Candidate,
        Some(raw) => match raw.parse::<Role>() {
            Ok(Role::Admin) => {
                errors.push("admin accounts cannot be self-registered".to_string());
                Role::Candidate
            }
            Ok(role) => role,
            Err(e) => {
                errors.push(e);
                Role::Candidate
            }
        },
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors.join("; ")));
    }

    Ok(NewUser {
        name,
        username,
        email,
        role,
        company_name: req
            .company_name
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string),
    })
}

pub fn validate_password_change(req: &ChangePasswordRequest) -> Result<(), AppError> {
    if req.old_password.is_empty() || req.new_password.is_empty() {
        return Err(AppError::Validation(
            "Old and new password are required".to_string(),
        ));
    }
    check_password_strength(&req.new_password).map_err(AppError::Validation)?;
    if req.old_password == req.new_password {
        return Err(AppError::Validation(
            "New password must differ from the old one".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/auth/register
pub async fn handle_register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    let new_user = validate_registration(&req)?;
    let password_hash = hash_password(req.password).await?;

    let user = repository::insert_user(&state.db, &new_user, &password_hash).await?;
    info!(user_id = %user.id, role = %new_user.role, "User registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// POST /api/v1/users/change-password
pub async fn handle_change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<Value>, AppError> {
    validate_password_change(&req)?;

    let stored = repository::find_password_hash(&state.db, &user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(req.old_password, stored).await? {
        warn!(user_id = %user.id, "Password change rejected: old password mismatch");
        return Err(AppError::Unauthorized("Old password is incorrect".to_string()));
    }

    let new_hash = hash_password(req.new_password).await?;
    if !repository::set_password_hash(&state.db, &user.id, &new_hash).await? {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    info!(user_id = %user.id, "Password changed");

    Ok(Json(json!({ "message": "Password changed successfully" })))
}
