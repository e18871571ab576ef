use serde::{Deserialize, Serialize};

use crate::models::user::Role;

/// JWT claims accepted by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub exp: usize,
}

#[cfg(test)]
pub(crate) fn issue_test_token(secret: &str, user_id: &str, role: Role) -> String {
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    let claims = Claims {
        sub: user_id.to_string(),
        role,
        exp: (chrono::Utc::now().timestamp() + 3600) as usize,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("Failed to encode test token")
}
