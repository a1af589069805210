use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::geocode::{Destination, Geocoder};
use crate::map::{markers, MapMarker};
use crate::pipeline::{self, DistanceReport, PipelineError};
use crate::postcode::{PostcodeRecord, PostcodeTable};
use crate::routing::OsrmRouter;

use super::state::AppState;
use super::static_files;

// ─── Error response ──────────────────────────────────────────────

#[derive(Serialize)]
struct ApiErrorBody {
    error: String,
    code: u16,
}

pub(super) struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiErrorBody {
            error: self.1,
            code: self.0.as_u16(),
        };
        (self.0, Json(body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: impl Into<String>) -> ApiError {
    ApiError(status, msg.into())
}

fn pipeline_status(err: &PipelineError) -> StatusCode {
    match err {
        PipelineError::EmptyAddress | PipelineError::NoPostcodes => StatusCode::BAD_REQUEST,
        PipelineError::AddressNotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::Geocode(_) | PipelineError::Routing(_) => StatusCode::BAD_GATEWAY,
    }
}

// ─── Static file handlers ────────────────────────────────────────

pub async fn index() -> Html<&'static str> {
    Html(static_files::INDEX_HTML)
}

pub async fn style() -> Response {
    ([(header::CONTENT_TYPE, "text/css")], static_files::STYLE_CSS).into_response()
}

pub async fn script() -> Response {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        static_files::APP_JS,
    )
        .into_response()
}

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub address: Option<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub address: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

pub async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let address = params.address.as_deref().unwrap_or("").trim().to_string();
    if address.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'address' parameter"));
    }

    let resolved = {
        let mut geocoder = state.geocoder.lock().unwrap();
        geocoder.resolve(&address)
    };

    let destination = resolved.map_err(|e| {
        api_error(StatusCode::NOT_FOUND, format!("{}", e))
    })?;

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] GET /api/resolve address={} -> ({:.4}, {:.4}) ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        address,
        destination.coordinate.lat,
        destination.coordinate.lon,
        elapsed.as_secs_f64() * 1000.0,
    );

    Ok(Json(ResolveResponse {
        address: destination.address,
        lat: destination.coordinate.lat,
        lon: destination.coordinate.lon,
        display_name: destination.display_name,
    }))
}

// ─── POST /api/distances ─────────────────────────────────────────

#[derive(Deserialize)]
pub struct DistancesRequest {
    pub address: String,
    pub postcodes: Vec<String>,
    /// ISO country code for the reference table. Defaults to the
    /// server's configured country.
    pub country: Option<String>,
}

#[derive(Serialize)]
pub struct DistancesResponse {
    pub destination: Destination,
    pub rows: Vec<PostcodeRecord>,
    pub rejected: Vec<String>,
    pub total_km: f64,
    /// Total formatted to two decimal places, e.g. "643.27 km".
    pub total_label: String,
    pub markers: Vec<MapMarker>,
}

pub async fn distances(
    State(state): State<Arc<AppState>>,
    Json(request): Json<DistancesRequest>,
) -> Result<Json<DistancesResponse>, ApiError> {
    let start = Instant::now();

    let country = request
        .country
        .as_deref()
        .unwrap_or(&state.default_country)
        .to_string();
    let table = PostcodeTable::bundled(&country).ok_or_else(|| {
        api_error(
            StatusCode::BAD_REQUEST,
            format!(
                "No bundled postcode table for country '{}'. Available: {}",
                country,
                PostcodeTable::bundled_countries().join(", "),
            ),
        )
    })?;

    let router = OsrmRouter::with_base_url(&state.osrm_url);

    // Only the geocode step needs the shared rate limiter; release the
    // lock before the routing loop so one slow batch does not serialize
    // every other request.
    let destination = {
        let mut geocoder = state.geocoder.lock().unwrap();
        geocoder.resolve(&request.address)
    }
    .map_err(|e| {
        let e = PipelineError::from(e);
        api_error(pipeline_status(&e), format!("{}", e))
    })?;

    let report: DistanceReport =
        pipeline::run_resolved(&table, &router, destination, &request.postcodes)
            .map_err(|e| api_error(pipeline_status(&e), format!("{}", e)))?;

    let elapsed = start.elapsed();
    eprintln!(
        "[{}] POST /api/distances address={} codes={} rejected={} -> {} ({:.1}ms)",
        Utc::now().format("%H:%M:%S"),
        request.address,
        request.postcodes.len(),
        report.rejected.len(),
        report.total_line(),
        elapsed.as_secs_f64() * 1000.0,
    );

    let marks = markers(&report.destination, &report.rows);
    Ok(Json(DistancesResponse {
        total_label: report.total_line(),
        destination: report.destination,
        rows: report.rows,
        rejected: report.rejected,
        total_km: report.total_km,
        markers: marks,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_status_mapping() {
        assert_eq!(pipeline_status(&PipelineError::EmptyAddress), StatusCode::BAD_REQUEST);
        assert_eq!(pipeline_status(&PipelineError::NoPostcodes), StatusCode::BAD_REQUEST);
        assert_eq!(
            pipeline_status(&PipelineError::AddressNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            pipeline_status(&PipelineError::Routing(crate::routing::RoutingError::Http(500))),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_distances_request_deserializes() {
        let raw = r#"{"address": "72 Victoria Street West", "postcodes": ["1010", "6011"]}"#;
        let req: DistancesRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.postcodes.len(), 2);
        assert!(req.country.is_none());
    }
}
