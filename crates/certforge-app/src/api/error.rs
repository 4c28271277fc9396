// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// HTTP error mapping. Every failure leaves the handler as JSON
// `{ error, message, suggestion, severity }`; nothing reaches the client as a
// bare 500 page.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use certforge_core::error::CertError;
use certforge_core::human_errors::{Severity, humanize_error};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Cert(#[from] CertError),

    #[error("'{0}' is not a delivery id")]
    BadDeliveryId(String),

    #[error("delivery {0} not found")]
    DeliveryNotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Cert(err) => match err {
                CertError::InputInvalid(_) => StatusCode::BAD_REQUEST,
                CertError::AttendeeNotFound { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                CertError::UnknownEvent(_) => StatusCode::NOT_FOUND,
                CertError::Delivery(_) => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::BadDeliveryId(_) => StatusCode::BAD_REQUEST,
            Self::DeliveryNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Cert(err) => match err {
                CertError::InputInvalid(_) => "InputInvalid",
                CertError::AttendeeNotFound { .. } => "AttendeeNotFound",
                CertError::UnknownEvent(_) => "UnknownEvent",
                CertError::RosterRead(_) => "RosterRead",
                CertError::Template(_) | CertError::Render(_) | CertError::Pdf(_) => {
                    "GenerationFailed"
                }
                CertError::Delivery(_) => "DeliveryFailed",
                _ => "InternalError",
            },
            Self::BadDeliveryId(_) => "InvalidRequest",
            Self::DeliveryNotFound(_) => "DeliveryNotFound",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, suggestion, severity) = match &self {
            Self::Cert(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                let human = humanize_error(err);
                (human.message, human.suggestion, human.severity)
            }
            other => (
                other.to_string(),
                "Check the delivery id from your submission response.".to_string(),
                Severity::Warning,
            ),
        };

        let body = Json(json!({
            "error": self.code(),
            "message": message,
            "suggestion": suggestion,
            "severity": severity,
        }));
        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
