use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use gateway_trust::MessageId;
use std::sync::Arc;
use tracing::debug;

use crate::models::*;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn internal_error(error: impl ToString, message_id: MessageId) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: error.to_string(),
            code: Some(message_id.to_string()),
        }),
    )
}

/// Southbound certificate chain as PEM text
///
/// Responds with an empty body when no key store is configured.
pub async fn get_certificates(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    debug!("Exporting southbound certificates");

    let pem = state
        .trust
        .certificates_in_pem_format()
        .map_err(|e| internal_error(e, MessageId::PemConversionFailed))?;

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        pem.into_string(),
    ))
}

/// Subject, issuer and validity of each certificate in the chain
pub async fn get_certificate_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CertificateSummaryList>, ApiError> {
    let certificates: Vec<_> = state
        .trust
        .certificate_info()
        .map_err(|e| internal_error(e, MessageId::CertificateInspectionFailed))?
        .into_iter()
        .enumerate()
        .map(|(index, info)| CertificateSummary::new(index, info))
        .collect();

    Ok(Json(CertificateSummaryList {
        total: certificates.len(),
        certificates,
    }))
}

/// Health check
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        certificates: state.trust.chain().len(),
    })
}
