//! # API REST
//!
//! REST API for the EDCI congestion monitor.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, snapshot timestamps)
//!
//! Evaluation itself lives in `edci-core`; readings come from an `edci-provider` source.

#![warn(rust_2018_idioms)]

pub mod config;

use std::sync::Arc;

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use edci_core::{
    ranked_by_congestion, AlertKind, AlertReason, CongestionEngine, CycleReport,
    DataIntegrityError, DerivedMetrics, EdciSource, FacilityAssessment, FleetSummary,
    PatientFlow, RawReading, Staffing, Status, StatusCounts, TriageCounts, Workload,
};
use edci_provider::{ProviderResult, ReadingProvider};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A facility excluded from a cycle because its reading failed validation.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct RejectedFacility {
    pub facility_id: String,
    pub field: String,
    pub message: String,
}

impl From<&DataIntegrityError> for RejectedFacility {
    fn from(err: &DataIntegrityError) -> Self {
        Self {
            facility_id: err.facility_id().to_string(),
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

/// The most recently evaluated cycle.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    /// Number of cycles evaluated since start-up; 0 before the first refresh.
    pub cycle: u64,
    /// Facilities the provider reported, assessed or not.
    pub reported: usize,
    pub facilities: Vec<FacilityAssessment>,
    pub rejected: Vec<RejectedFacility>,
    pub summary: FleetSummary,
}

impl Snapshot {
    pub fn empty(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            cycle: 0,
            reported: 0,
            facilities: Vec::new(),
            rejected: Vec::new(),
            summary: FleetSummary::empty(),
        }
    }

    pub fn from_report(cycle: u64, report: CycleReport, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            cycle,
            reported: report.reported,
            rejected: report.rejected.iter().map(RejectedFacility::from).collect(),
            facilities: report.facilities,
            summary: report.summary,
        }
    }
}

/// Application state for the REST API server
///
/// The provider sits behind a mutex so refreshes run one at a time; readers only ever see a
/// complete snapshot.
#[derive(Clone)]
pub struct AppState {
    engine: CongestionEngine,
    provider: Arc<Mutex<Box<dyn ReadingProvider + Send>>>,
    snapshot: Arc<RwLock<Snapshot>>,
}

impl AppState {
    pub fn new(engine: CongestionEngine, provider: Box<dyn ReadingProvider + Send>) -> Self {
        Self {
            engine,
            provider: Arc::new(Mutex::new(provider)),
            snapshot: Arc::new(RwLock::new(Snapshot::empty(Utc::now()))),
        }
    }

    /// Pull one cycle from the provider, evaluate it and publish the result.
    ///
    /// # Errors
    ///
    /// Returns the provider's error; the previous snapshot stays in place.
    pub async fn refresh(&self) -> ProviderResult<Snapshot> {
        let mut provider = self.provider.lock().await;
        let records = provider.next_cycle()?;
        let report = self.engine.evaluate_cycle(&records);

        let mut current = self.snapshot.write().await;
        let next = Snapshot::from_report(current.cycle + 1, report, Utc::now());
        *current = next.clone();
        tracing::info!(
            "cycle {}: {} facilities assessed, {} rejected",
            next.cycle,
            next.facilities.len(),
            next.rejected.len()
        );
        Ok(next)
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        get_cycle,
        refresh_cycle,
        list_facilities,
        get_facility,
        get_summary,
    ),
    components(schemas(
        HealthRes,
        Snapshot,
        RejectedFacility,
        FacilityAssessment,
        RawReading,
        TriageCounts,
        Staffing,
        PatientFlow,
        Workload,
        DerivedMetrics,
        EdciSource,
        Status,
        AlertReason,
        AlertKind,
        FleetSummary,
        StatusCounts,
    ))
)]
pub struct ApiDoc;

/// Build the router with Swagger UI and permissive CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cycle", get(get_cycle))
        .route("/cycle/refresh", post(refresh_cycle))
        .route("/facilities", get(list_facilities))
        .route("/facilities/:id", get(get_facility))
        .route("/summary", get(get_summary))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "EDCI REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/cycle",
    responses(
        (status = 200, description = "Latest evaluated cycle", body = Snapshot)
    )
)]
/// Latest cycle snapshot
///
/// Returns the snapshot produced by the most recent refresh. Before the first refresh this is an
/// empty cycle numbered 0.
#[axum::debug_handler]
async fn get_cycle(State(state): State<AppState>) -> Json<Snapshot> {
    Json(state.snapshot().await)
}

#[utoipa::path(
    post,
    path = "/cycle/refresh",
    responses(
        (status = 200, description = "Newly evaluated cycle", body = Snapshot),
        (status = 502, description = "Reading provider failed")
    )
)]
/// Evaluate a new cycle
///
/// Pulls one batch of readings from the provider, evaluates it and replaces the snapshot.
///
/// # Errors
/// Returns `502 Bad Gateway` if the reading provider fails. The previous snapshot is kept.
#[axum::debug_handler]
async fn refresh_cycle(
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, (StatusCode, &'static str)> {
    match state.refresh().await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            tracing::error!("Refresh cycle error: {}", e);
            Err((StatusCode::BAD_GATEWAY, "Reading provider failed"))
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct FacilityQuery {
    /// Only return facilities with this status
    pub status: Option<Status>,
}

#[utoipa::path(
    get,
    path = "/facilities",
    params(FacilityQuery),
    responses(
        (status = 200, description = "Facilities ranked by EDCI, highest first", body = Vec<FacilityAssessment>),
        (status = 400, description = "Unknown status filter")
    )
)]
/// List facility assessments ranked by congestion
#[axum::debug_handler]
async fn list_facilities(
    State(state): State<AppState>,
    Query(query): Query<FacilityQuery>,
) -> Json<Vec<FacilityAssessment>> {
    let snapshot = state.snapshot.read().await;
    let facilities = ranked_by_congestion(&snapshot.facilities)
        .into_iter()
        .filter(|a| query.status.map_or(true, |s| a.status == s))
        .cloned()
        .collect();
    Json(facilities)
}

#[utoipa::path(
    get,
    path = "/facilities/{id}",
    params(
        ("id" = String, Path, description = "Facility id")
    ),
    responses(
        (status = 200, description = "Facility assessment", body = FacilityAssessment),
        (status = 404, description = "Facility not in the latest cycle")
    )
)]
/// Get one facility's assessment from the latest cycle
///
/// # Errors
/// Returns `404 Not Found` if the facility was not assessed in the latest cycle, including
/// facilities rejected for invalid readings.
#[axum::debug_handler]
async fn get_facility(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<FacilityAssessment>, (StatusCode, &'static str)> {
    let snapshot = state.snapshot.read().await;
    snapshot
        .facilities
        .iter()
        .find(|a| a.id() == id)
        .cloned()
        .map(Json)
        .ok_or((StatusCode::NOT_FOUND, "Facility not found"))
}

#[utoipa::path(
    get,
    path = "/summary",
    responses(
        (status = 200, description = "Fleet summary of the latest cycle", body = FleetSummary)
    )
)]
/// Fleet-wide summary of the latest cycle
#[axum::debug_handler]
async fn get_summary(State(state): State<AppState>) -> Json<FleetSummary> {
    Json(state.snapshot.read().await.summary)
}
