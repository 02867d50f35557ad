//! # API REST
//!
//! CDS Hooks REST API.
//!
//! Handles:
//! - CDS Hooks discovery and service endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS)
//!
//! Uses `api-shared` for wire types and `cds-core` for evaluation.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{rejection::JsonRejection, Path as AxumPath, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    CardDto, CardsRes, CdsHooksReq, CodingDto, ErrorRes, HealthRes, HealthService, IndicatorDto,
    ReferenceDto, ServiceDescriptorDto, ServicesRes, SourceDto,
};
use cds_core::{CdsError, CdsServiceRegistry, CoreConfig, ErrorKind, RuleSet};
use terminology::{CachingResolver, FhirTerminologyClient, TerminologyResolver};

/// Application state for the REST API server
///
/// Contains shared state that needs to be accessible to all request handlers.
/// The registry is read-only once built, so handlers share it without locking.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub registry: Arc<CdsServiceRegistry>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, list_services, call_service),
    components(schemas(
        HealthRes,
        ServicesRes,
        ServiceDescriptorDto,
        CdsHooksReq,
        CardsRes,
        CardDto,
        SourceDto,
        ReferenceDto,
        CodingDto,
        IndicatorDto,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Build the application state: terminology client, rule tables and service registry.
///
/// Blocks on the terminology server while rules are expanded. Call it outside the async
/// runtime, or from `spawn_blocking`.
///
/// # Errors
/// Returns an error if:
/// - the terminology client cannot be built,
/// - a rule table cannot be read or parsed, or
/// - a rule's value set cannot be expanded.
pub fn build_state(cfg: CoreConfig) -> anyhow::Result<AppState> {
    let client = FhirTerminologyClient::new(cfg.terminology_url(), cfg.terminology_timeout_secs())?;
    let terminology: Arc<dyn TerminologyResolver> = Arc::new(CachingResolver::new(client));

    let rules = RuleSet::load(&cfg, terminology.as_ref())?;
    let registry = CdsServiceRegistry::standard(&cfg, rules, terminology);

    Ok(AppState {
        cfg: Arc::new(cfg),
        registry: Arc::new(registry),
    })
}

/// Routes, Swagger UI and CORS over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/cds-services", get(list_services))
        .route("/cds-services/:id", post(call_service))
        .merge(
            SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the server stops.
///
/// # Errors
/// Returns an error if the address cannot be bound or the server fails while running.
pub async fn serve(addr: &str, state: AppState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;
    Ok(())
}

// ============================================================================
// Errors
// ============================================================================

/// An error response with a JSON [`ErrorRes`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<CdsError> for ApiError {
    fn from(err: CdsError) -> Self {
        match err.kind() {
            ErrorKind::Precondition => Self::new(StatusCode::PRECONDITION_FAILED, err.to_string()),
            ErrorKind::NotFound => Self::new(
                StatusCode::NOT_FOUND,
                "A service with this id was not found.",
            ),
            ErrorKind::RemoteDependency => {
                tracing::error!("Terminology server error: {}", err);
                Self::new(StatusCode::BAD_GATEWAY, err.to_string())
            }
            ErrorKind::Configuration | ErrorKind::Internal => {
                tracing::error!("CDS service error: {:?}", err);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorRes {
            status: self.status.as_u16(),
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Error")
                .to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

// ============================================================================
// Handlers
// ============================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// This endpoint is used for monitoring and load balancer health checks.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response containing service status
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/cds-services",
    responses(
        (status = 200, description = "CDS Hooks discovery", body = ServicesRes)
    )
)]
/// CDS Hooks discovery endpoint
///
/// Lists every registered service with its hook and prefetch templates.
#[axum::debug_handler]
async fn list_services(State(state): State<AppState>) -> Json<ServicesRes> {
    Json(ServicesRes {
        services: state.registry.descriptors().map(Into::into).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/cds-services/{id}",
    params(("id" = String, Path, description = "Service id from discovery")),
    request_body = CdsHooksReq,
    responses(
        (status = 200, description = "Cards for the request", body = CardsRes),
        (status = 400, description = "Body is not a CDS Hooks request", body = ErrorRes),
        (status = 404, description = "Unknown service id", body = ErrorRes),
        (status = 412, description = "Required prefetch data missing or invalid", body = ErrorRes),
        (status = 502, description = "Terminology server failed", body = ErrorRes),
        (status = 500, description = "Internal server error", body = ErrorRes)
    )
)]
/// Call a CDS service
///
/// Evaluates the request on a blocking thread since the engine calls the terminology server
/// synchronously.
///
/// # Arguments
/// * `id` - Service id, e.g. `medication-order-select`
/// * `body` - CDS Hooks request with `context` and `prefetch`
///
/// # Returns
/// * `Ok(Json<CardsRes>)` - Cards in rule order, dose cards last
///
/// # Errors
/// Returns:
/// - `400 Bad Request` if the body is not valid JSON for a CDS Hooks request,
/// - `404 Not Found` for an unknown service id,
/// - `412 Precondition Failed` if prefetch data is missing or cannot be evaluated,
/// - `502 Bad Gateway` if the terminology server fails, or
/// - `500 Internal Server Error` otherwise.
#[axum::debug_handler]
async fn call_service(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    body: Result<Json<CdsHooksReq>, JsonRejection>,
) -> Result<Json<CardsRes>, ApiError> {
    let Json(req) = body.map_err(|rejection| {
        tracing::debug!("Rejected CDS Hooks request: {}", rejection.body_text());
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    })?;

    let registry = state.registry.clone();
    let result = tokio::task::spawn_blocking(move || registry.call(&id, &req.into()))
        .await
        .map_err(|e| {
            tracing::error!("CDS evaluation task failed: {:?}", e);
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        })?;

    Ok(Json(result?.into()))
}
