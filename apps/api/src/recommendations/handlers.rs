use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use super::models::RecommendationResponse;
use super::service::resolve_top_n;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::Role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    #[serde(rename = "topN", alias = "top_n")]
    pub top_n: Option<i64>,
}

/// GET /api/v1/recommendations?topN=5
///
/// Ranked job recommendations for the calling candidate.
pub async fn handle_get_recommendations(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<RecommendationResponse>, AppError> {
    user.require_role(&[Role::Candidate])?;

    let top_n = resolve_top_n(query.top_n, state.config.recommendation_max_top_n);
    let response = state
        .recommender
        .get_recommendations(&user.id, top_n)
        .await?;

    Ok(Json(response))
}
