//! # Schema HTTP endpoint
//!
//! Read-only routes through which the viewer fetches record type
//! definitions. Validation is exposed too so the viewer can check a form
//! before writing to its store; storage and CRUD stay with the viewer.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::SchemaError;
use crate::registry::{DocumentEntry, SchemaRegistry};

/// Shared state handed to every handler
pub type SharedRegistry = Arc<SchemaRegistry>;

/// Build the router over a registry
pub fn router(registry: SharedRegistry) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/schema", get(list_schemas))
        .route("/schema/:name", get(get_schema))
        .route("/schema/:name/json-schema", get(get_json_schema))
        .route("/schema/:name/validate", post(validate_record))
        .layer(TraceLayer::new_for_http())
        .with_state(registry)
}

/// Bind and serve until the process is stopped
pub async fn serve(registry: SchemaRegistry, config: &ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind((config.host.as_str(), config.port)).await?;
    let addr = listener.local_addr()?;
    tracing::info!(%addr, record_types = registry.len(), "serving schemas");

    axum::serve(listener, router(Arc::new(registry))).await
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `GET /schema`: every record type, tagged with the registry fingerprint
async fn list_schemas(State(registry): State<SharedRegistry>, headers: HeaderMap) -> Response {
    let checksum = registry.checksum();
    let etag = HeaderValue::from_str(&checksum.etag()).ok();

    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| checksum.matches_etag(v));

    let mut response = if not_modified {
        StatusCode::NOT_MODIFIED.into_response()
    } else {
        Json(registry.describe()).into_response()
    };

    if let Some(etag) = etag {
        response.headers_mut().insert(header::ETAG, etag);
    }
    response
}

async fn get_schema(
    State(registry): State<SharedRegistry>,
    Path(name): Path<String>,
) -> Response {
    match registry.get_schema(&name) {
        Ok(record) => Json(DocumentEntry {
            collection: record.collection_name(),
            record: record.clone(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_json_schema(
    State(registry): State<SharedRegistry>,
    Path(name): Path<String>,
) -> Response {
    match registry.json_schema(&name) {
        Ok(schema) => Json(schema).into_response(),
        Err(e) => error_response(e),
    }
}

async fn validate_record(
    State(registry): State<SharedRegistry>,
    Path(name): Path<String>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    let Json(candidate) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                rejection.status(),
                Json(json!({ "error": "invalid_json", "message": rejection.body_text() })),
            )
                .into_response();
        }
    };

    match registry.validate(&name, &candidate) {
        Ok(record) => Json(record).into_response(),
        Err(e) => error_response(e),
    }
}

/// Map a registry error to its HTTP form
fn error_response(err: SchemaError) -> Response {
    match err {
        SchemaError::NotFound { name, suggestion } => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "record_type": name,
                "suggestion": suggestion,
            })),
        )
            .into_response(),
        SchemaError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": "validation_failed",
                "record_type": errors.record_type,
                "violations": errors.violations,
            })),
        )
            .into_response(),
        other => {
            tracing::error!(error = %other, "unexpected registry error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "internal", "message": other.to_string() })),
            )
                .into_response()
        }
    }
}
