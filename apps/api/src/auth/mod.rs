//! Registration, password changes, bearer-token verification and role checks.
//!
//! Tokens are issued elsewhere; this module only enforces the contract:
//! HS256, signed with `JWT_SECRET`, carrying `sub` (user id), `role` and `exp`.
//! Passwords are stored as Argon2id hashes.

pub mod extractors;
pub mod handlers;
pub mod models;
pub mod password;

pub use extractors::AuthUser;
pub use models::Claims;
