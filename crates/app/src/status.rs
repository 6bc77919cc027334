//! Liveness endpoint
//!
//! Read-only process status for deployment health checks: the hosting
//! platform polls this (and the self-ping loop hits it) to keep the process
//! alive and observable.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use muster_core::PartyService;

pub struct StatusState {
    pub service: Arc<PartyService>,
    pub started_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct StatusBody {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    started_at: DateTime<Utc>,
    uptime_secs: i64,
    parties_open: usize,
    parties_total: usize,
}

pub fn router(state: Arc<StatusState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<Arc<StatusState>>) -> Json<StatusBody> {
    let counts = state.service.counts();
    Json(StatusBody {
        status: "online",
        service: "muster",
        version: env!("CARGO_PKG_VERSION"),
        started_at: state.started_at,
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        parties_open: counts.open,
        parties_total: counts.total,
    })
}

/// Serve the endpoint until the process exits
pub async fn serve(port: u16, state: Arc<StatusState>) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "Status endpoint listening");
    axum::serve(listener, router(state)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_health_reports_party_counts() {
        let service = PartyService::new(Duration::from_secs(3600));
        let creator = Uuid::new_v4();
        service.create_party(Uuid::new_v4(), creator);
        let closed = service.create_party(Uuid::new_v4(), creator);
        service.request_close(closed, creator, false);

        let state = Arc::new(StatusState {
            service,
            started_at: Utc::now(),
        });

        let Json(body) = health(State(state)).await;
        assert_eq!(body.status, "online");
        assert_eq!(body.parties_open, 1);
        assert_eq!(body.parties_total, 2);
        assert!(body.uptime_secs >= 0);
    }
}
