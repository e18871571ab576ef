use sqlx::PgPool;

use crate::errors::AppError;
use crate::models::new_object_id;
use crate::models::pagination::PageQuery;
use crate::models::user::{Role, UserRow};

/// Validated profile update; `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<i32>,
    pub location: Option<String>,
    pub education: Option<String>,
}

/// Which stored file a user row points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFile {
    Resume,
    ProfileImage,
}

pub async fn find_user_by_id(pool: &PgPool, id: &str) -> Result<Option<UserRow>, AppError> {
    Ok(sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?)
}

pub async fn update_profile(
    pool: &PgPool,
    id: &str,
    patch: &ProfilePatch,
) -> Result<Option<UserRow>, AppError> {
    sqlx::query_as::<_, UserRow>(
        r#"
        UPDATE users SET
            name = COALESCE($2, name),
            email = COALESCE($3, email),
            skills = COALESCE($4, skills),
            experience = COALESCE($5, experience),
            location = COALESCE($6, location),
            education = COALESCE($7, education),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&patch.name)
    .bind(&patch.email)
    .bind(&patch.skills)
    .bind(patch.experience)
    .bind(&patch.location)
    .bind(&patch.education)
    .fetch_optional(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("Email is already in use".to_string())
        }
        _ => AppError::from(e),
    })
}

/// Points the user at a newly stored file. Returns the updated row
/// and the key of the object it replaced, if any.
pub async fn replace_user_file(
    pool: &PgPool,
    id: &str,
    file: UserFile,
    key: &str,
    url: &str,
) -> Result<Option<(UserRow, Option<String>)>, AppError> {
    let (key_col, url_col) = match file {
        UserFile::Resume => ("resume_key", "resume_url"),
        UserFile::ProfileImage => ("profile_image_key", "profile_image_url"),
    };

    let mut tx = pool.begin().await?;

    let previous: Option<Option<String>> = sqlx::query_scalar(&format!(
        "SELECT {key_col} FROM users WHERE id = $1 FOR UPDATE"
    ))
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(previous) = previous else {
        return Ok(None);
    };

    let user = sqlx::query_as::<_, UserRow>(&format!(
        "UPDATE users SET {key_col} = $2, {url_col} = $3, updated_at = NOW() WHERE id = $1 RETURNING *"
    ))
    .bind(id)
    .bind(key)
    .bind(url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(Some((user, previous)))
}

pub async fn list_users(
    pool: &PgPool,
    role: Option<Role>,
    page: &PageQuery,
) -> Result<(Vec<UserRow>, i64), AppError> {
    let role = role.map(|r| r.as_str());
    let total = count_users(pool, role).await?;

    let users = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT * FROM users
        WHERE ($1::TEXT IS NULL OR role = $1)
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(role)
    .bind(page.limit())
    .bind(page.offset())
    .fetch_all(pool)
    .await?;

    Ok((users, total))
}

pub async fn count_users(pool: &PgPool, role: Option<&str>) -> Result<i64, AppError> {
    Ok(
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE ($1::TEXT IS NULL OR role = $1)")
            .bind(role)
            .fetch_one(pool)
            .await?,
    )
}

pub async fn set_user_role(pool: &PgPool, id: &str, role: Role) -> Result<Option<UserRow>, AppError> {
    Ok(sqlx::query_as::<_, UserRow>(
        "UPDATE users SET role = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(role.as_str())
    .fetch_optional(pool)
    .await?)
}

/// Deletes the user; their jobs and applications cascade.
/// Returns the row as it was, so stored files can be cleaned up.
pub async fn delete_user(pool: &PgPool, id: &str) -> Result<Option<UserRow>, AppError> {
    Ok(
        sqlx::query_as::<_, UserRow>("DELETE FROM users WHERE id = $1 RETURNING *")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Validated registration fields.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub name: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub company_name: Option<String>,
}

/// Inserts a user with an already-hashed password.
pub async fn insert_user(
    pool: &PgPool,
    user: &NewUser,
    password_hash: &str,
) -> Result<UserRow, AppError> {
    sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (id, name, username, email, password_hash, role, company_name)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(new_object_id())
    .bind(&user.name)
    .bind(&user.username)
    .bind(&user.email)
    .bind(password_hash)
    .bind(user.role.as_str())
    .bind(&user.company_name)
    .fetch_one(pool)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict("User with email or username already exists".to_string())
        }
        _ => AppError::from(e),
    })
}

pub async fn find_password_hash(pool: &PgPool, id: &str) -> Result<Option<String>, AppError> {
    Ok(
        sqlx::query_scalar("SELECT password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Returns `false` when no user had this id.
pub async fn set_password_hash(pool: &PgPool, id: &str, password_hash: &str) -> Result<bool, AppError> {
    let result = sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(password_hash)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
