// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP surface.

pub mod certificates;
pub mod deliveries;
pub mod error;
pub mod events;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::services::app_services::AppServices;

pub fn router(services: AppServices) -> Router {
    Router::new()
        .route("/health", get(events::health_check))
        .route("/api/v1/events", get(events::list_events))
        .route("/api/v1/certificates", post(certificates::issue_certificate))
        .route(
            "/api/v1/certificates/preview",
            post(certificates::preview_certificate),
        )
        .route("/api/v1/deliveries/:id", get(deliveries::delivery_status))
        .layer(TraceLayer::new_for_http())
        .with_state(services)
}
