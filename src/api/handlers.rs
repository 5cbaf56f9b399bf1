//! Request handlers.

use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Multipart, Query, State};
use axum::Json;
use bytes::Bytes;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ApiError;
use super::AppState;
use crate::engine::{AnalysisStats, AttributeFilter, StoreSummary};
use crate::models::{DatasetKind, FeatureCollectionExport, GeoBounds, GeoPoint, MatchSet};

/// Name of the multipart field carrying the dataset
const UPLOAD_FIELD: &str = "file";

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    version: &'static str,
}

/// Liveness probe
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "online",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct UploadResponse {
    message: String,
    records_count: usize,
    file_type: DatasetKind,
    columns: Vec<String>,
}

pub async fn upload_parcels_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(state, DatasetKind::Parcels, multipart).await
}

pub async fn upload_properties_handler(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    upload(state, DatasetKind::Properties, multipart).await
}

/// Read the uploaded Parquet file into memory and load it
async fn upload(
    state: Arc<AppState>,
    kind: DatasetKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (file_name, data) = read_upload(&mut multipart).await?;

    info!("Received {} upload '{}' ({} bytes)", kind, file_name, data.len());

    let engine_state = Arc::clone(&state);
    let summary = tokio::task::spawn_blocking(move || {
        engine_state.engine.store().load_parquet(kind, data)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Load task failed: {}", e)))??;

    Ok(Json(UploadResponse {
        message: format!("{} loaded successfully", kind),
        records_count: summary.records_count,
        file_type: kind,
        columns: summary.columns,
    }))
}

/// Find the `file` field and buffer its content
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Bytes), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        if file_name.is_empty() {
            return Err(ApiError::BadRequest("No file selected".to_string()));
        }
        if !file_name.ends_with(".parquet") {
            return Err(ApiError::BadRequest(
                "File must be .parquet".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        return Ok((file_name, data));
    }

    Err(ApiError::BadRequest("No file uploaded".to_string()))
}

#[derive(Deserialize)]
pub struct AnalysisRequest {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_meters: Option<f64>,
    #[serde(default)]
    filters: Option<AttributeFilter>,
}

#[derive(Serialize)]
pub struct PointEcho {
    latitude: f64,
    longitude: f64,
}

#[derive(Serialize)]
pub struct AnalysisResponse {
    point: PointEcho,
    radius_meters: f64,
    #[serde(rename = "lotes_encontrados")]
    parcels_found: usize,
    #[serde(rename = "imoveis_encontrados")]
    properties_found: usize,
    #[serde(rename = "estatisticas")]
    stats: AnalysisStats,
    #[serde(flatten)]
    matches: MatchSet,
}

/// Radius analysis around a point
pub async fn analyze_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let (latitude, longitude) = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => (lat, lon),
        _ => {
            return Err(ApiError::BadRequest(
                "latitude and longitude are required".to_string(),
            ))
        }
    };

    let radius_meters = request
        .radius_meters
        .unwrap_or(state.server.default_radius_meters);
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(ApiError::BadRequest(
            "radius_meters must be a non-negative number".to_string(),
        ));
    }

    let filters = request.filters.unwrap_or_default();
    let matches = state.engine.query_radius(
        GeoPoint::new(latitude, longitude),
        radius_meters,
        &filters,
    );
    let stats = state.engine.aggregate(&matches);

    Ok(Json(AnalysisResponse {
        point: PointEcho {
            latitude,
            longitude,
        },
        radius_meters,
        parcels_found: matches.parcels.len(),
        properties_found: matches.properties.len(),
        stats,
        matches,
    }))
}

#[derive(Deserialize)]
pub struct ExportParams {
    bairro: Option<String>,
    limit: Option<usize>,
}

pub async fn parcels_geojson_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> Result<Json<FeatureCollectionExport>, ApiError> {
    export(&state, DatasetKind::Parcels, params)
}

pub async fn properties_geojson_handler(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> Result<Json<FeatureCollectionExport>, ApiError> {
    export(&state, DatasetKind::Properties, params)
}

fn export(
    state: &AppState,
    kind: DatasetKind,
    params: Result<Query<ExportParams>, QueryRejection>,
) -> Result<Json<FeatureCollectionExport>, ApiError> {
    let Query(params) = params.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let neighborhood = params.bairro.as_deref().filter(|b| !b.is_empty());
    let limit = params.limit.unwrap_or(state.server.export_limit);

    Ok(Json(state.engine.export(kind, neighborhood, limit)))
}

#[derive(Serialize)]
pub struct BoundsResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    bounds: Option<GeoBounds>,
}

/// Combined extent of everything loaded
pub async fn bounds_handler(State(state): State<Arc<AppState>>) -> Json<BoundsResponse> {
    let bounds = state.engine.bounds();
    Json(BoundsResponse {
        message: bounds.is_none().then_some("No data loaded yet"),
        bounds,
    })
}

/// Record counts per collection
pub async fn stats_handler(State(state): State<Arc<AppState>>) -> Json<StoreSummary> {
    Json(state.engine.summary())
}

pub async fn not_found_handler() -> ApiError {
    ApiError::NotFound
}
