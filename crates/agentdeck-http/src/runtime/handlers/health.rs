//! Health check handler

use agentdeck_core::{Agent, Execution};
use axum::{extract::State, response::Json};
use std::sync::OnceLock;
use std::time::Instant;

use crate::runtime::state::AppState;

// Track service start time for uptime calculation
static START_TIME: OnceLock<Instant> = OnceLock::new();

/// Start the uptime clock; later calls have no effect.
pub fn mark_started() {
    START_TIME.get_or_init(Instant::now);
}

fn get_uptime_seconds() -> u64 {
    START_TIME.get_or_init(Instant::now).elapsed().as_secs()
}

/// GET /health - Liveness with version, uptime and record counts
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "agentdeck",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now(),
        "uptimeSeconds": get_uptime_seconds(),
        "remoteGateway": state.gateway.as_ref().map(|gateway| gateway.describe()),
        "simulationEnabled": state.config.simulation_enabled,
        "counts": {
            "agents": state.store.len::<Agent>(),
            "executions": state.store.len::<Execution>(),
            "liveStreams": state.hub.live_count(),
            "tools": state.tools.len(),
        },
    }))
}
