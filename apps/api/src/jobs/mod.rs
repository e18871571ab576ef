// Job postings: public browsing, recruiter management.
// Status changes (pending → active/closed) go through admin moderation only.

pub mod handlers;
pub mod repository;
pub mod validation;
