pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::admin::handlers as admin;
use crate::applications::handlers as applications;
use crate::auth::handlers as auth;
use crate::jobs::handlers as jobs;
use crate::recommendations::handlers as recommendations;
use crate::state::AppState;
use crate::users::handlers as users;

/// Room for the largest accepted upload plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = 6 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/register", post(auth::handle_register))
        .route(
            "/api/v1/users/change-password",
            post(auth::handle_change_password),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            get(jobs::handle_list_jobs).post(jobs::handle_create_job),
        )
        .route(
            "/api/v1/jobs/recruiter/mine",
            get(jobs::handle_recruiter_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Applications
        .route("/api/v1/applications", post(applications::handle_apply))
        .route(
            "/api/v1/applications/mine",
            get(applications::handle_my_applications),
        )
        .route(
            "/api/v1/applications/job/:job_id",
            get(applications::handle_job_applications),
        )
        .route(
            "/api/v1/applications/:id/status",
            put(applications::handle_update_status),
        )
        // Users
        .route(
            "/api/v1/users/profile",
            get(users::handle_get_profile).put(users::handle_update_profile),
        )
        .route(
            "/api/v1/users/resume",
            post(users::handle_upload_resume).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/api/v1/users/profile-image",
            post(users::handle_upload_profile_image)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        // Recommendations
        .route(
            "/api/v1/recommendations",
            get(recommendations::handle_get_recommendations),
        )
        // Admin
        .route("/api/v1/admin/overview", get(admin::handle_overview))
        .route("/api/v1/admin/users", get(admin::handle_list_users))
        .route("/api/v1/admin/users/:id", delete(admin::handle_delete_user))
        .route("/api/v1/admin/users/:id/role", put(admin::handle_update_role))
        .route("/api/v1/admin/jobs/pending", get(admin::handle_pending_jobs))
        .route("/api/v1/admin/jobs/:id/approve", put(admin::handle_approve_job))
        .route("/api/v1/admin/jobs/:id/reject", put(admin::handle_reject_job))
        .with_state(state)
}
