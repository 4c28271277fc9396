// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Certificate submission and preview handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use certforge_core::error::CertError;
use certforge_core::types::Submission;
use serde::{Deserialize, Serialize};

use super::error::Result;
use crate::services::app_services::{AppServices, Issued};

#[derive(Debug, Deserialize)]
pub struct CertificateRequest {
    pub name: String,
    pub email: String,
    pub event: String,
}

impl From<CertificateRequest> for Submission {
    fn from(req: CertificateRequest) -> Self {
        Submission::new(req.name, req.email, req.event)
    }
}

/// A body that is not a complete `CertificateRequest` is invalid input, so it
/// gets the same JSON error shape as any other validation failure.
fn parse_request(
    payload: std::result::Result<Json<CertificateRequest>, JsonRejection>,
) -> Result<CertificateRequest> {
    let Json(req) = payload.map_err(|rejection| CertError::InputInvalid(rejection.body_text()))?;
    Ok(req)
}

#[derive(Debug, Serialize)]
pub struct QueuedResponse {
    pub delivery_id: String,
    pub status_url: String,
    pub message: String,
}

/// Issue a certificate. Download mode answers with the PDF itself; email
/// mode answers `202 Accepted` with a delivery id to poll.
pub async fn issue_certificate(
    State(services): State<AppServices>,
    payload: std::result::Result<Json<CertificateRequest>, JsonRejection>,
) -> Result<Response> {
    let req = parse_request(payload)?;
    tracing::info!(event = %req.event, "certificate request");

    match services.issue(req.into()).await? {
        Issued::Download(document) => Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/pdf".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", document.file_name),
                ),
            ],
            document.bytes,
        )
            .into_response()),
        Issued::Queued { document, ticket } => {
            let delivery_id = ticket.id;
            tracing::info!(
                %delivery_id,
                file_name = %document.file_name,
                "certificate queued for email"
            );
            let body = QueuedResponse {
                delivery_id: delivery_id.to_string(),
                status_url: format!("/api/v1/deliveries/{delivery_id}"),
                message: "Your certificate has been generated and will be emailed shortly."
                    .into(),
            };
            Ok((StatusCode::ACCEPTED, Json(body)).into_response())
        }
    }
}

/// Render the certificate image without packaging or sending it.
pub async fn preview_certificate(
    State(services): State<AppServices>,
    payload: std::result::Result<Json<CertificateRequest>, JsonRejection>,
) -> Result<impl IntoResponse> {
    let req = parse_request(payload)?;
    let png = services.preview(req.into()).await?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png))
}
