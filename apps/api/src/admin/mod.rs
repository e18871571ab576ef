// Platform moderation: overview counts, user management, job approval.

pub mod handlers;
