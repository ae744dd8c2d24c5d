use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use crate::location::{city_list, CityInfo, LocationResolver, MatchStrategy, StoreStats};
use crate::plot::{to_geojson, PlotPlan};

use super::state::AppState;

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

// ─── GET /api/resolve ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ResolveQuery {
    pub name: Option<String>,
}

#[derive(Serialize)]
pub struct ResolveResponse {
    pub query: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub postcode: String,
    pub district: Option<String>,
    pub formatted_coords: String,
    pub matched_by: MatchStrategy,
}

pub(super) async fn resolve(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ResolveQuery>,
) -> Result<Json<ResolveResponse>, ApiError> {
    let start = Instant::now();

    let query = params.name.as_deref().unwrap_or("").trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "Missing 'name' parameter"));
    }

    let resolved = LocationResolver::new(&state.store)
        .resolve(query)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unrecognized place name: '{}'", query)))?;

    tracing::info!(
        query,
        city = %resolved.record.name_en,
        strategy = %resolved.matched_by,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "GET /api/resolve"
    );

    Ok(Json(ResolveResponse {
        query: query.to_string(),
        name: resolved.record.name_en.clone(),
        lat: resolved.coordinates.lat,
        lon: resolved.coordinates.lon,
        postcode: resolved.postcode_or_na().to_string(),
        district: state
            .store
            .district_by_id(resolved.record.district_id)
            .map(|d| d.name_en.clone()),
        formatted_coords: resolved.coordinates.to_string(),
        matched_by: resolved.matched_by,
    }))
}

// ─── GET /api/plot ───────────────────────────────────────────────

#[derive(Deserialize)]
pub struct PlotQuery {
    pub fragment: Option<String>,
}

fn plan_for(state: &AppState, params: &PlotQuery) -> PlotPlan {
    let start = Instant::now();
    let fragment = params.fragment.as_deref().unwrap_or("");
    let plan = PlotPlan::from_fragment(&LocationResolver::new(&state.store), fragment);

    tracing::info!(
        fragment,
        markers = plan.markers.len(),
        unresolved = plan.unresolved.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "plot"
    );
    plan
}

pub(super) async fn plot(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlotQuery>,
) -> Json<PlotPlan> {
    Json(plan_for(&state, &params))
}

pub(super) async fn plot_geojson(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PlotQuery>,
) -> Json<serde_json::Value> {
    Json(to_geojson(&plan_for(&state, &params)))
}

// ─── GET /api/cities ─────────────────────────────────────────────

pub(super) async fn cities(State(state): State<Arc<AppState>>) -> Json<Vec<CityInfo>> {
    Json(city_list(&state.store))
}

// ─── GET /api/stats ──────────────────────────────────────────────

pub(super) async fn stats(State(state): State<Arc<AppState>>) -> Json<StoreStats> {
    Json(state.store.stats())
}
