//! Scoring Service client. The only module that talks to the external
//! similarity engine over HTTP.
//!
//! Contract:
//! - `GET  {base}/health`             → `{ "status": "healthy" | "unhealthy" }`
//! - `POST {base}/train`              → `{ "jobs": [TrainJob] }`
//! - `POST {base}/recommend?top_n=N`  → `{ "recommendations": [RankedRecommendation] }`
//!
//! Calls are never retried; a failure surfaces immediately to the caller.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::recommendations::models::{CandidateProfile, JobSummary, RankedRecommendation};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Scoring service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed scoring service response: {0}")]
    Parse(String),
}

/// Liveness as reported by `GET /health`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceHealth {
    Healthy,
    Unhealthy,
}

/// The scoring service seam. `RecommendationService` holds an
/// `Arc<dyn ScoringService>` so tests can substitute a double.
#[async_trait]
pub trait ScoringService: Send + Sync {
    /// Never fails: transport errors and unexpected payloads read as unhealthy.
    async fn health(&self) -> ServiceHealth;

    async fn train(&self, jobs: &[JobSummary]) -> Result<(), ScoringError>;

    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        top_n: usize,
    ) -> Result<Vec<RankedRecommendation>, ScoringError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Serialize)]
struct TrainRequest<'a> {
    jobs: Vec<TrainJob<'a>>,
}

/// The service keys jobs by `_id`; anything else makes it fall back to
/// positional `job_<n>` identifiers.
#[derive(Debug, Serialize)]
struct TrainJob<'a> {
    #[serde(rename = "_id")]
    id: &'a str,
    title: &'a str,
    description: &'a str,
    #[serde(rename = "skillsRequired")]
    skills_required: &'a [String],
    location: &'a str,
    #[serde(rename = "companyName")]
    company_name: &'a str,
}

impl<'a> From<&'a JobSummary> for TrainJob<'a> {
    fn from(job: &'a JobSummary) -> Self {
        TrainJob {
            id: &job.id,
            title: &job.title,
            description: &job.description,
            skills_required: &job.skills_required,
            location: &job.location,
            company_name: &job.company_name,
        }
    }
}

#[derive(Debug, Serialize)]
struct RecommendRequest<'a> {
    skills: &'a [String],
    experience: i32,
    location: &'a str,
}

#[derive(Debug, Deserialize)]
struct RecommendResponse {
    recommendations: Vec<RankedRecommendation>,
}

// ────────────────────────────────────────────────────────────────────────────
// HTTP implementation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct HttpScoringClient {
    client: Client,
    base_url: String,
}

impl HttpScoringClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ScoringError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }
}

#[async_trait]
impl ScoringService for HttpScoringClient {
    async fn health(&self) -> ServiceHealth {
        let response = match self.client.get(self.url("health")).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Scoring service health check failed: {e}");
                return ServiceHealth::Unhealthy;
            }
        };

        if !response.status().is_success() {
            warn!("Scoring service health check returned {}", response.status());
            return ServiceHealth::Unhealthy;
        }

        match response.json::<HealthResponse>().await {
            Ok(body) if body.status == "healthy" => ServiceHealth::Healthy,
            Ok(body) => {
                debug!("Scoring service reports status '{}'", body.status);
                ServiceHealth::Unhealthy
            }
            Err(e) => {
                warn!("Scoring service health payload unreadable: {e}");
                ServiceHealth::Unhealthy
            }
        }
    }

    async fn train(&self, jobs: &[JobSummary]) -> Result<(), ScoringError> {
        let body = TrainRequest {
            jobs: jobs.iter().map(TrainJob::from).collect(),
        };

        let response = self.client.post(self.url("train")).json(&body).send().await?;
        let response = ensure_success(response).await?;

        // The success payload is opaque; only log it.
        let text = response.text().await.unwrap_or_default();
        debug!("Scoring service trained on {} jobs: {}", jobs.len(), text);
        Ok(())
    }

    async fn recommend(
        &self,
        candidate: &CandidateProfile,
        top_n: usize,
    ) -> Result<Vec<RankedRecommendation>, ScoringError> {
        let body = RecommendRequest {
            skills: &candidate.skills,
            experience: candidate.experience,
            location: &candidate.location,
        };

        let response = self
            .client
            .post(self.url("recommend"))
            .query(&[("top_n", top_n)])
            .json(&body)
            .send()
            .await?;
        let response = ensure_success(response).await?;

        let text = response.text().await?;
        let parsed: RecommendResponse =
            serde_json::from_str(&text).map_err(|e| ScoringError::Parse(e.to_string()))?;

        debug!(
            "Scoring service returned {} recommendations",
            parsed.recommendations.len()
        );
        Ok(parsed.recommendations)
    }
}

/// Turns any non-2xx response into `ScoringError::Api`, preferring the
/// service's `detail` field for the message.
async fn ensure_success(response: Response) -> Result<Response, ScoringError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    #[derive(Deserialize)]
    struct ErrorBody {
        detail: String,
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&body)
        .map(|e| e.detail)
        .unwrap_or(body);
    warn!("Scoring service returned {status}: {message}");

    Err(ScoringError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};

    use super::*;

    #[derive(Clone, Default)]
    struct Captured {
        train_body: Arc<Mutex<Option<Value>>>,
        recommend_body: Arc<Mutex<Option<Value>>>,
        top_n: Arc<Mutex<Option<String>>>,
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn healthy_stub(captured: Captured, recommendations: Value) -> Router {
        Router::new()
            .route("/api/health", get(|| async { Json(json!({ "status": "healthy" })) }))
            .route(
                "/api/train",
                post(
                    |State(c): State<Captured>, Json(body): Json<Value>| async move {
                        *c.train_body.lock().unwrap() = Some(body);
                        Json(json!({ "success": true, "message": "Model trained" }))
                    },
                ),
            )
            .route(
                "/api/recommend",
                post(
                    move |State(c): State<Captured>,
                          Query(q): Query<std::collections::HashMap<String, String>>,
                          Json(body): Json<Value>| {
                        let recommendations = recommendations.clone();
                        async move {
                            *c.recommend_body.lock().unwrap() = Some(body);
                            *c.top_n.lock().unwrap() = q.get("top_n").cloned();
                            Json(json!({ "success": true, "recommendations": recommendations }))
                        }
                    },
                ),
            )
            .with_state(captured)
    }

    fn client(base: String) -> HttpScoringClient {
        HttpScoringClient::new(base, Duration::from_secs(5)).unwrap()
    }

    fn candidate() -> CandidateProfile {
        CandidateProfile {
            id: "65f0c0ffee0000000000beef".to_string(),
            name: "Asha".to_string(),
            skills: vec!["React".to_string(), "Node.js".to_string()],
            experience: 2,
            location: "Remote".to_string(),
        }
    }

    fn summary() -> JobSummary {
        JobSummary {
            id: "65f000000000000000000001".to_string(),
            title: "Frontend Engineer".to_string(),
            description: "Build UIs".to_string(),
            skills_required: vec!["React".to_string()],
            location: "Remote".to_string(),
            company_name: "Acme".to_string(),
            job_type: "Full-time".to_string(),
        }
    }

    #[tokio::test]
    async fn test_health_reports_healthy() {
        let base = spawn_stub(healthy_stub(Captured::default(), json!([]))).await;
        assert_eq!(client(base).health().await, ServiceHealth::Healthy);
    }

    #[tokio::test]
    async fn test_health_reports_unhealthy_status() {
        let router = Router::new().route(
            "/api/health",
            get(|| async { Json(json!({ "status": "unhealthy" })) }),
        );
        let base = spawn_stub(router).await;
        assert_eq!(client(base).health().await, ServiceHealth::Unhealthy);
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unhealthy() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(format!("http://{addr}/api"));
        assert_eq!(client.health().await, ServiceHealth::Unhealthy);
    }

    #[tokio::test]
    async fn test_train_sends_underscore_id_and_omits_job_type() {
        let captured = Captured::default();
        let base = spawn_stub(healthy_stub(captured.clone(), json!([]))).await;

        client(base).train(&[summary()]).await.unwrap();

        let body = captured.train_body.lock().unwrap().clone().unwrap();
        let job = &body["jobs"][0];
        assert_eq!(job["_id"], "65f000000000000000000001");
        assert_eq!(job["skillsRequired"], json!(["React"]));
        assert_eq!(job["companyName"], "Acme");
        assert!(job.get("jobType").is_none());
    }

    #[tokio::test]
    async fn test_recommend_passes_top_n_and_preserves_order() {
        let captured = Captured::default();
        let recs = json!([
            { "jobId": "65f000000000000000000002", "similarity_score": 0.9, "skills_match": 80 },
            { "jobId": "job_7", "similarity_score": 0.4, "skills_match": 10.5 }
        ]);
        let base = spawn_stub(healthy_stub(captured.clone(), recs)).await;

        let result = client(base).recommend(&candidate(), 7).await.unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].job_id, "65f000000000000000000002");
        assert_eq!(result[1].job_id, "job_7");
        assert_eq!(result[1].skills_match, 10.5);
        assert_eq!(captured.top_n.lock().unwrap().as_deref(), Some("7"));

        let body = captured.recommend_body.lock().unwrap().clone().unwrap();
        assert_eq!(body["skills"], json!(["React", "Node.js"]));
        assert_eq!(body["experience"], 2);
        assert_eq!(body["location"], "Remote");
    }

    #[tokio::test]
    async fn test_recommend_rejects_malformed_payload() {
        let router = Router::new().route(
            "/api/recommend",
            post(|| async { Json(json!({ "recommendations": [{ "jobId": 12 }] })) }),
        );
        let base = spawn_stub(router).await;

        let err = client(base).recommend(&candidate(), 5).await.unwrap_err();
        assert!(matches!(err, ScoringError::Parse(_)));
    }

    #[tokio::test]
    async fn test_non_success_status_carries_detail() {
        let router = Router::new().route(
            "/api/train",
            post(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "vectorizer exploded" })),
                )
            }),
        );
        let base = spawn_stub(router).await;

        match client(base).train(&[summary()]).await {
            Err(ScoringError::Api { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "vectorizer exploded");
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
