// Candidate applications to active job postings and recruiter review of them.

pub mod handlers;
pub mod repository;
