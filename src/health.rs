//! Liveness and readiness probes.

use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;

/// Health status for a component or the overall system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Functioning but with degraded behavior
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    pub fn status_code(&self) -> StatusCode {
        match self {
            HealthStatus::Healthy => StatusCode::OK,
            HealthStatus::Degraded => StatusCode::OK, // Still serve traffic but indicate degradation
            HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Combines two health statuses, returning the worse of the two
    pub fn combine(self, other: Self) -> Self {
        match (self, other) {
            (HealthStatus::Unhealthy, _) | (_, HealthStatus::Unhealthy) => HealthStatus::Unhealthy,
            (HealthStatus::Degraded, _) | (_, HealthStatus::Degraded) => HealthStatus::Degraded,
            _ => HealthStatus::Healthy,
        }
    }
}

/// Health check result for a component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub component: String,
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ComponentHealth {
    pub fn healthy_with_details(component: impl Into<String>, details: serde_json::Value) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Healthy,
            error: None,
            timestamp: now(),
            details: Some(details),
        }
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            status: HealthStatus::Unhealthy,
            error: Some(error.into()),
            timestamp: now(),
            details: None,
        }
    }
}

/// Overall health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub version: String,
}

impl IntoResponse for HealthResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

/// Per-component health breakdown
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentsResponse {
    pub status: HealthStatus,
    pub timestamp: i64,
    pub components: HashMap<String, ComponentHealth>,
}

impl IntoResponse for ComponentsResponse {
    fn into_response(self) -> Response {
        let status = self.status.status_code();
        (status, Json(self)).into_response()
    }
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub status: HealthStatus,
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub not_ready: Vec<String>,
}

impl IntoResponse for ReadinessResponse {
    fn into_response(self) -> Response {
        let status = if self.ready {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(self)).into_response()
    }
}

/// Liveness: the process is up and answering.
pub fn liveness() -> HealthResponse {
    HealthResponse {
        status: HealthStatus::Healthy,
        timestamp: now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Detailed per-component health, for operators rather than orchestrators.
pub fn components(state: &AppState) -> ComponentsResponse {
    let components = check_all_components(state);
    let mut overall = HealthStatus::Healthy;
    for health in components.values() {
        overall = overall.combine(health.status);
    }
    ComponentsResponse {
        status: overall,
        timestamp: now(),
        components,
    }
}

/// Readiness: the store and session registry can serve requests.
pub fn readiness(state: &AppState) -> ReadinessResponse {
    let components = check_all_components(state);
    let mut overall = HealthStatus::Healthy;
    let mut not_ready = Vec::new();

    for (name, health) in &components {
        overall = overall.combine(health.status);
        if health.status == HealthStatus::Unhealthy {
            not_ready.push(name.clone());
        }
    }

    ReadinessResponse {
        ready: overall != HealthStatus::Unhealthy,
        status: overall,
        timestamp: now(),
        not_ready,
    }
}

fn check_all_components(state: &AppState) -> HashMap<String, ComponentHealth> {
    let mut components = HashMap::new();
    components.insert("store".to_string(), check_store(state));
    components.insert("sessions".to_string(), check_sessions(state));
    components
}

fn check_store(state: &AppState) -> ComponentHealth {
    let counts = state.store.read(|s| {
        serde_json::json!({
            "locations": s.locations.len(),
            "categories": s.categories.len(),
            "subcategories": s.subcategories.len(),
            "bookings": s.bookings.len(),
        })
    });

    match state.store.path() {
        Some(path) => {
            let parent = path.parent().unwrap_or_else(|| std::path::Path::new("."));
            if parent.is_dir() {
                ComponentHealth::healthy_with_details("store", counts)
            } else {
                ComponentHealth::unhealthy(
                    "store",
                    format!("data directory missing: {}", parent.display()),
                )
            }
        }
        None => ComponentHealth::healthy_with_details("store", counts),
    }
}

fn check_sessions(state: &AppState) -> ComponentHealth {
    let active = state.sessions.active_count();
    crate::metrics::METRICS.update_session_count(active);
    ComponentHealth::healthy_with_details("sessions", serde_json::json!({ "active": active }))
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Axum handler for liveness endpoint
pub async fn liveness_handler() -> impl IntoResponse {
    liveness()
}

/// Axum handler for readiness endpoint
pub async fn readiness_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    readiness(&state)
}

/// Axum handler for the per-component health endpoint
pub async fn components_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    components(&state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_combine() {
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Healthy),
            HealthStatus::Healthy
        );
        assert_eq!(
            HealthStatus::Healthy.combine(HealthStatus::Degraded),
            HealthStatus::Degraded
        );
        assert_eq!(
            HealthStatus::Degraded.combine(HealthStatus::Unhealthy),
            HealthStatus::Unhealthy
        );
    }

    #[test]
    fn health_status_codes() {
        assert_eq!(HealthStatus::Healthy.status_code(), StatusCode::OK);
        assert_eq!(HealthStatus::Degraded.status_code(), StatusCode::OK);
        assert_eq!(
            HealthStatus::Unhealthy.status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn readiness_with_in_memory_store_is_ready() {
        let state = crate::state::AppState::for_tests();
        let response = readiness(&state);
        assert!(response.ready);
        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(response.not_ready.is_empty());
    }

    #[test]
    fn components_reports_store_and_sessions() {
        let state = crate::state::AppState::for_tests();
        let response = components(&state);
        assert_eq!(response.status, HealthStatus::Healthy);
        assert!(response.components.contains_key("store"));
        assert!(response.components.contains_key("sessions"));
        let store = &response.components["store"];
        assert_eq!(store.status, HealthStatus::Healthy);
        assert!(store.details.is_some());
    }
}
