// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Event listing and health check.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::services::app_services::AppServices;

#[derive(Debug, Serialize)]
pub struct EventSummary {
    pub key: String,
    pub display_name: String,
    pub tracks_quantity: bool,
}

/// Selectable events, in configured order.
pub async fn list_events(State(services): State<AppServices>) -> Json<Vec<EventSummary>> {
    Json(
        services
            .events()
            .iter()
            .map(|event| EventSummary {
                key: event.key.clone(),
                display_name: event.display_name.clone(),
                tracks_quantity: event.tracks_quantity,
            })
            .collect(),
    )
}

pub async fn health_check() -> &'static str {
    "ok"
}
