//! HTTP request handlers
//!
//! Implements the REST API surface over the sensor store and ingestion
//! gateway.

use actix_web::{web, HttpRequest, HttpResponse, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::gateway::{IngestionGateway, RawSample};
use crate::models::{HealthCheck, SafeBand, SensorKind, SensorStatus};
use crate::query::{SensorFilter, SortKey};
use crate::store::SensorStore;
use crate::websocket::WsSession;

/// Configure all application routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Health check
            .route("/health", web::get().to(health_check))
            // Sensor lifecycle and queries
            .route("/sensors", web::post().to(register_sensor))
            .route("/sensors", web::get().to(list_sensors))
            .route("/sensors/{id}", web::get().to(get_sensor))
            .route("/sensors/{id}", web::delete().to(deregister_sensor))
            // Reading ingestion
            .route("/sensors/{id}/readings", web::post().to(ingest_reading))
            // Fleet-wide statistics
            .route("/fleet/stats", web::get().to(fleet_stats)),
    )
    // WebSocket endpoint
    .route("/ws", web::get().to(websocket_handler));
}

/// Health check endpoint
///
/// GET /api/health
///
/// Returns system health status including uptime and registered sensor count.
pub async fn health_check(
    store: web::Data<Arc<SensorStore>>,
) -> Result<HttpResponse, AppError> {
    let health = HealthCheck {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: store.uptime_seconds(),
        total_sensors: store.count().await,
    };

    Ok(HttpResponse::Ok().json(health))
}

/// Registration request body
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSensor {
    #[validate(length(min = 1, max = 64, message = "Sensor id must be 1-64 characters"))]
    pub id: String,

    #[validate(length(min = 1, max = 128, message = "Sensor name must be 1-128 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 128, message = "Location must be 1-128 characters"))]
    pub location: String,

    pub kind: SensorKind,

    /// Defaults to the configured band for the sensor kind when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safe_band: Option<SafeBand>,
}

/// Register a new sensor
///
/// POST /api/sensors
///
/// Fails with 409 when the id is already registered.
pub async fn register_sensor(
    store: web::Data<Arc<SensorStore>>,
    body: web::Json<RegisterSensor>,
) -> Result<HttpResponse, AppError> {
    let input = body.into_inner();
    validate_registration(&input)?;

    store
        .register(
            &input.id,
            &input.name,
            &input.location,
            input.kind,
            input.safe_band,
        )
        .await?;

    // Fresh registration; the snapshot exists unless a concurrent
    // deregister already raced us
    let snapshot = store
        .get(&input.id)
        .await
        .ok_or_else(|| AppError::InternalError("registered sensor vanished".to_string()))?;

    Ok(HttpResponse::Created().json(snapshot))
}

fn validate_registration(input: &RegisterSensor) -> AppResult<()> {
    if let Err(validation_errors) = input.validate() {
        let messages: Vec<String> = validation_errors
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let msgs: Vec<&str> = errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|c| c.as_ref()))
                    .collect();
                format!("{}: {}", field, msgs.join(", "))
            })
            .collect();
        return Err(AppError::ValidationError(messages.join("; ")));
    }

    if let Some(band) = &input.safe_band {
        if !band.low.is_finite() || !band.high.is_finite() {
            return Err(AppError::ValidationError(
                "Safe band bounds must be finite numbers".to_string(),
            ));
        }
        if band.low >= band.high {
            return Err(AppError::ValidationError(format!(
                "Safe band low {} must be below high {}",
                band.low, band.high
            )));
        }
    }

    Ok(())
}

/// Deregister a sensor
///
/// DELETE /api/sensors/{id}
pub async fn deregister_sensor(
    store: web::Data<Arc<SensorStore>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    store.deregister(&id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Ingest one reading for a sensor
///
/// POST /api/sensors/{id}/readings
///
/// Accepts raw samples from external transports; everything is validated
/// by the gateway before the store sees it.
pub async fn ingest_reading(
    gateway: web::Data<IngestionGateway>,
    path: web::Path<String>,
    body: web::Json<RawSample>,
    req: HttpRequest,
) -> Result<HttpResponse, AppError> {
    let sensor_id = path.into_inner();
    let correlation_id = extract_correlation_id(&req);

    info!(
        correlation_id = %correlation_id,
        sensor_id = %sensor_id,
        "Received reading ingestion request"
    );

    let reading = gateway.ingest(&sensor_id, body.into_inner()).await?;

    Ok(HttpResponse::Created().json(IngestResponse {
        success: true,
        sensor_id,
        timestamp: reading.timestamp,
        correlation_id,
    }))
}

#[derive(Serialize)]
struct IngestResponse {
    success: bool,
    sensor_id: String,
    timestamp: DateTime<Utc>,
    correlation_id: String,
}

/// Get one sensor's snapshot
///
/// GET /api/sensors/{id}
pub async fn get_sensor(
    store: web::Data<Arc<SensorStore>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    match store.get(&id).await {
        Some(snapshot) => Ok(HttpResponse::Ok().json(snapshot)),
        None => Err(crate::error::StoreError::NotFound(id).into()),
    }
}

/// Query parameters for sensor listings
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub status: Option<SensorStatus>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
}

/// List sensors with optional filter and sort
///
/// GET /api/sensors?status=online&search=server&sort=name
pub async fn list_sensors(
    store: web::Data<Arc<SensorStore>>,
    query: web::Query<ListQuery>,
) -> Result<HttpResponse, AppError> {
    let filter = SensorFilter {
        status: query.status,
        search: query.search.clone(),
    };
    let sort = query.sort.unwrap_or_default();

    let sensors = store.list_all(&filter, sort).await;

    Ok(HttpResponse::Ok().json(ListResponse {
        total: sensors.len(),
        data: sensors,
    }))
}

#[derive(Serialize)]
struct ListResponse<T> {
    total: usize,
    data: Vec<T>,
}

/// Fleet-wide statistics
///
/// GET /api/fleet/stats
pub async fn fleet_stats(
    store: web::Data<Arc<SensorStore>>,
) -> Result<HttpResponse, AppError> {
    let stats = store.fleet_stats().await;

    Ok(HttpResponse::Ok().json(stats))
}

/// WebSocket upgrade handler
///
/// GET /ws
pub async fn websocket_handler(
    req: HttpRequest,
    stream: web::Payload,
    store: web::Data<Arc<SensorStore>>,
) -> Result<HttpResponse, actix_web::Error> {
    let client_id = Uuid::new_v4().to_string();

    info!(client_id = %client_id, "WebSocket connection request");

    let ws_session = WsSession::new(client_id, store.get_ref().clone());

    actix_web_actors::ws::start(ws_session, &req, stream)
}

/// Extract or generate correlation ID from request headers
fn extract_correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get("X-Correlation-ID")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
