use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{info, warn};

use super::repository::{self, UserFile};
use super::uploads::ValidatedUpload;
use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::storage::FileStorage;

/// Records which stored object a user's resume or profile image points at.
#[async_trait]
pub trait UserFileIndex: Send + Sync {
    /// Points the user at `key`/`url`. Returns the updated row and the key
    /// it replaced, or `None` when the user does not exist.
    async fn repoint(
        &self,
        user_id: &str,
        file: UserFile,
        key: &str,
        url: &str,
    ) -> Result<Option<(UserRow, Option<String>)>, AppError>;
}

pub struct PgUserFileIndex {
    pool: PgPool,
}

impl PgUserFileIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserFileIndex for PgUserFileIndex {
    async fn repoint(
        &self,
        user_id: &str,
        file: UserFile,
        key: &str,
        url: &str,
    ) -> Result<Option<(UserRow, Option<String>)>, AppError> {
        repository::replace_user_file(&self.pool, user_id, file, key, url).await
    }
}

/// Stores `upload` under `key`, repoints the user at it, then removes the
/// object it replaced. If the user is gone the new object is removed instead.
pub async fn store_user_file(
    storage: &dyn FileStorage,
    index: &dyn UserFileIndex,
    user_id: &str,
    file: UserFile,
    key: &str,
    upload: ValidatedUpload,
) -> Result<UserRow, AppError> {
    let url = storage.put(key, upload.bytes, upload.content_type).await?;

    let Some((profile, previous)) = index.repoint(user_id, file, key, &url).await? else {
        discard(storage, key).await;
        return Err(AppError::NotFound("User not found".to_string()));
    };

    if let Some(previous) = previous.filter(|p| p != key) {
        discard(storage, &previous).await;
    }

    info!(user_id, key, "Stored {file:?}");
    Ok(profile)
}

/// Deletes a stored object; failures are logged, not returned.
async fn discard(storage: &dyn FileStorage, key: &str) {
    if let Err(e) = storage.delete(key).await {
        warn!(key, "Could not delete stored object: {e}");
    }
}
