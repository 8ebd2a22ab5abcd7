//! HTTP routes and handlers

use axum::{
    extract::{MatchedPath, Path, Query, Request, State},
    http::{HeaderValue, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use reviewsense_classifiers::Classifier;
use reviewsense_core::{NewReview, Review, ReviewPatch, Sentiment, SentimentRequest, SentimentResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::error::AppError;
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/analyze-sentiment", post(analyze_sentiment))
        .route("/load-data", post(load_data))
        .route("/reviews", get(list_reviews).post(create_review))
        .route(
            "/reviews/:review_id",
            get(get_review).put(update_review).delete(delete_review),
        )
        .route("/update-stats", post(update_stats))
        .route("/sentiment-stats", get(sentiment_stats))
        .fallback(fallback)
        .layer(middleware::from_fn(track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for the configured origins
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}

async fn track_requests(request: Request, next: Next) -> Response {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| "unmatched".to_owned());

    metrics::counter!("reviewsense_requests_total", "route" => route).increment(1);
    next.run(request).await
}

async fn health_check() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<AppState>) -> String {
    state.metrics_handle.render()
}

async fn analyze_sentiment(
    State(state): State<AppState>,
    Json(req): Json<SentimentRequest>,
) -> Result<Json<SentimentResponse>, AppError> {
    let result = state.engine.classify(&req.text).await?;
    debug!(
        "Classified {} chars as {} ({:.3}) in {}us",
        req.text.len(),
        result.label,
        result.score,
        result.latency_us
    );

    metrics::counter!("reviewsense_predictions_total", "sentiment" => result.label.as_str())
        .increment(1);
    metrics::histogram!("reviewsense_inference_latency_us").record(result.latency_us as f64);

    Ok(Json(SentimentResponse {
        sentiment: result.label,
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoadDataResponse {
    pub message: String,
    pub rows_processed: usize,
    pub rows_skipped: usize,
}

async fn load_data(State(state): State<AppState>) -> Result<Json<LoadDataResponse>, AppError> {
    let loader = state.clone();
    let summary = tokio::task::spawn_blocking(move || loader.load_dataset())
        .await?
        .map_err(|e| AppError::InternalError(format!("Error loading data: {}", e)))?;

    Ok(Json(LoadDataResponse {
        message: "Data loaded successfully".to_string(),
        rows_processed: summary.rows_processed,
        rows_skipped: summary.rows_skipped,
    }))
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub skip: usize,

    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Json<Vec<Review>> {
    Json(state.reviews.list(page.skip, page.limit))
}

async fn get_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<Review>, AppError> {
    state
        .reviews
        .get(&review_id)
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Review not found.".to_string()))
}

async fn create_review(
    State(state): State<AppState>,
    Json(new): Json<NewReview>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    let review_id = new
        .review_id
        .clone()
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    let mut review = new.into_review(review_id)?;
    if review.at.is_none() {
        review.at = Some(chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string());
    }

    let review = state.reviews.insert(review)?;
    info!("Created review {}", review.review_id);
    Ok((StatusCode::CREATED, Json(review)))
}

async fn update_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
    Json(patch): Json<ReviewPatch>,
) -> Result<Json<Review>, AppError> {
    Ok(Json(state.reviews.update(&review_id, patch)?))
}

async fn delete_review(
    State(state): State<AppState>,
    Path(review_id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.reviews.delete(&review_id)?;
    Ok(Json(json!({ "message": "Review deleted successfully" })))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatsRequest {
    pub sentiment: Sentiment,
}

async fn update_stats(
    State(state): State<AppState>,
    Json(req): Json<UpdateStatsRequest>,
) -> Json<serde_json::Value> {
    let count = state.stats.increment(req.sentiment);
    Json(json!({
        "message": format!("Updated {} count to {}", req.sentiment, count)
    }))
}

async fn sentiment_stats(State(state): State<AppState>) -> Result<Json<BTreeMap<Sentiment, u64>>, AppError> {
    let stats = tokio::task::spawn_blocking(move || state.sentiment_stats()).await?;
    Ok(Json(stats))
}

async fn fallback() -> impl IntoResponse {
    AppError::NotFound("Not found".to_string())
}
