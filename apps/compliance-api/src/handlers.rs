//! HTTP handlers for the compliance API

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use compliance_engine::export::export_file_name;
use compliance_engine::DashboardSummary;
use shared_types::{Feature, FeatureInput};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

/// Upper bound on features per batch request
pub const MAX_BATCH: usize = 100;

/// Handler: GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "compliance-api",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Handler: GET /api/mode
pub async fn mode(State(state): State<Arc<AppState>>) -> Json<ModeResponse> {
    let mode = state.engine.mode();
    Json(ModeResponse {
        mode,
        label: mode.to_string(),
        clause_count: state.engine.knowledge_base().snapshot().len(),
        jargon_terms: state.engine.jargon().len(),
    })
}

/// Handler: POST /api/analyze
pub async fn analyze(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FeatureInput>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let feature = req.validate()?;
    let unknown_terms = state.engine.jargon().suggest_unknown_terms(&feature.full_text());

    let analysis = state.engine.analyze(&feature).await;
    tracing::info!(
        feature_id = %analysis.verdict.feature_id,
        score = analysis.verdict.risk_score,
        flagged = analysis.verdict.requires_geo_compliance,
        "Analyzed feature"
    );

    Ok(Json(AnalyzeResponse::new(analysis, unknown_terms)))
}

/// Handler: POST /api/analyze/batch
///
/// The whole batch is rejected if any item fails validation.
pub async fn analyze_batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    if req.features.is_empty() {
        return Err(ApiError::InvalidRequest("Batch contains no features".to_string()));
    }
    if req.features.len() > MAX_BATCH {
        return Err(ApiError::InvalidRequest(format!(
            "Batch exceeds {} features",
            MAX_BATCH
        )));
    }

    let features: Vec<Feature> = req
        .features
        .into_iter()
        .enumerate()
        .map(|(index, input)| {
            input
                .validate()
                .map_err(|source| ApiError::InvalidBatchItem { index, source })
        })
        .collect::<Result<_, _>>()?;

    let jargon = state.engine.jargon();
    let unknown: Vec<Vec<String>> = features
        .iter()
        .map(|f| jargon.suggest_unknown_terms(&f.full_text()))
        .collect();

    let analyses = state.engine.analyze_batch(&features).await;
    tracing::info!(count = analyses.len(), "Analyzed batch");

    let results: Vec<AnalyzeResponse> = analyses
        .into_iter()
        .zip(unknown)
        .map(|(analysis, terms)| AnalyzeResponse::new(analysis, terms))
        .collect();
    let count = results.len();

    Ok(Json(BatchResponse { results, count }))
}

/// Handler: GET /api/dashboard
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardSummary>, ApiError> {
    Ok(Json(state.engine.dashboard().await?))
}

/// Handler: GET /api/export.csv
pub async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let csv = state.engine.export_csv().await?;
    let disposition = format!("attachment; filename=\"{}\"", export_file_name());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// Handler: GET /api/regulations
pub async fn regulations(State(state): State<Arc<AppState>>) -> Json<RegulationsResponse> {
    let index = state.engine.knowledge_base().snapshot();
    Json(RegulationsResponse {
        regulations: index.regulations(),
        jurisdictions: index.jurisdictions(),
        clause_count: index.len(),
    })
}
