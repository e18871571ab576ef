pub mod application;
pub mod job;
pub mod pagination;
pub mod user;

use chrono::Utc;
use uuid::Uuid;

/// Issues a 24-character lowercase hex identifier: a 4-byte big-endian
/// seconds timestamp followed by 8 random bytes.
///
/// Every key in `users`, `jobs` and `applications` has this shape, which is
/// what `recommendations::id_filter::HexIdValidator` checks for by default.
pub fn new_object_id() -> String {
    let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
    let random = Uuid::new_v4();

    let mut id = String::with_capacity(24);
    for byte in seconds.to_be_bytes().iter().chain(&random.as_bytes()[..8]) {
        id.push_str(&format!("{byte:02x}"));
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_is_24_lowercase_hex() {
        let id = new_object_id();
        assert_eq!(id.len(), 24);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_object_ids_are_unique() {
        let a = new_object_id();
        let b = new_object_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_object_id_starts_with_timestamp() {
        let now = Utc::now().timestamp() as u32;
        let id = new_object_id();
        let prefix = u32::from_str_radix(&id[..8], 16).unwrap();
        assert!(prefix.abs_diff(now) <= 2);
    }
}
