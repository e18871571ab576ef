use bytes::Bytes;
use infer::Infer;

use super::repository::UserFile;
use crate::errors::AppError;
use crate::models::new_object_id;

const MIB: usize = 1024 * 1024;

/// Accepted shape of one kind of user upload.
#[derive(Debug)]
pub struct UploadRule {
    /// Multipart field carrying the file.
    pub field: &'static str,
    pub max_bytes: usize,
    /// Accepted MIME types and the extension stored for each.
    pub allowed: &'static [(&'static str, &'static str)],
    pub key_prefix: &'static str,
    pub target: UserFile,
}

pub const RESUME: UploadRule = UploadRule {
    field: "resume",
    max_bytes: 5 * MIB,
    allowed: &[
        ("application/pdf", "pdf"),
        ("application/msword", "doc"),
        (
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "docx",
        ),
    ],
    key_prefix: "resumes",
    target: UserFile::Resume,
};

pub const PROFILE_IMAGE: UploadRule = UploadRule {
    field: "profileImage",
    max_bytes: 2 * MIB,
    allowed: &[
        ("image/png", "png"),
        ("image/jpeg", "jpg"),
        ("image/webp", "webp"),
    ],
    key_prefix: "profile-images",
    target: UserFile::ProfileImage,
};

#[derive(Debug)]
pub struct ValidatedUpload {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub extension: &'static str,
}

impl UploadRule {
    fn accepted_types(&self) -> String {
        self.allowed
            .iter()
            .map(|(_, ext)| *ext)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Checks size and sniffs the content type from the file's magic bytes.
    /// The client-declared type is ignored.
    pub fn validate(&self, bytes: Bytes) -> Result<ValidatedUpload, AppError> {
        if bytes.is_empty() {
            return Err(AppError::Validation(format!("{} is empty", self.field)));
        }
        if bytes.len() > self.max_bytes {
            return Err(AppError::Validation(format!(
                "{} exceeds the {} MiB limit",
                self.field,
                self.max_bytes / MIB
            )));
        }

        let detected = Infer::new().get(&bytes).map(|kind| kind.mime_type());
        let (content_type, extension) = self
            .allowed
            .iter()
            .find(|(mime, _)| Some(*mime) == detected)
            .copied()
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "Unsupported {} file type. Accepted: {}",
                    self.field,
                    self.accepted_types()
                ))
            })?;

        Ok(ValidatedUpload {
            bytes,
            content_type,
            extension,
        })
    }

    /// Fresh object key, so replaced files never collide with cached URLs.
    pub fn object_key(&self, user_id: &str, extension: &str) -> String {
        format!(
            "{}/{}/{}.{}",
            self.key_prefix,
            user_id,
            new_object_id(),
            extension
        )
    }
}
