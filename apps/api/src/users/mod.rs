// User profiles, resume and profile image uploads.

pub mod files;
pub mod handlers;
pub mod repository;
pub mod uploads;
