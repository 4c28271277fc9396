// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Delivery status lookup.

use axum::{
    Json,
    extract::{Path, State},
};
use certforge_core::types::{DeliveryId, DeliveryRecord};

use super::error::{ApiError, Result};
use crate::services::app_services::AppServices;

pub async fn delivery_status(
    State(services): State<AppServices>,
    Path(id): Path<String>,
) -> Result<Json<DeliveryRecord>> {
    let delivery_id: DeliveryId = id
        .parse()
        .map_err(|_| ApiError::BadDeliveryId(id.clone()))?;

    services
        .delivery_status(&delivery_id)?
        .map(Json)
        .ok_or(ApiError::DeliveryNotFound(id))
}
