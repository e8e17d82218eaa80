//! Axum route handlers for the facilitator service.
//!
//! Endpoints follow the facilitator HTTP protocol: logical verdicts travel
//! in the response body with a 200 status, so a rejected payment is
//! `{"isValid": false, ...}` rather than an HTTP error.

use std::sync::Arc;

use alloy_provider::DynProvider;
use axum::Json;
use axum::extract::State;
use s402::Facilitator;
use s402::proto::{SettleRequest, SettleResponse, SupportedResponse, VerifyRequest, VerifyResponse};
use s402_evm::facilitator::{RpcSignatureChecker, SessionFacilitator};
use s402_evm::provider::RelayChainProvider;

use crate::error::ApiError;

/// The engine instantiated with RPC-backed boundaries.
pub type AppEngine =
    SessionFacilitator<RpcSignatureChecker<DynProvider>, RelayChainProvider<DynProvider>>;

/// Shared application state.
pub type FacilitatorState = Arc<AppEngine>;

/// `GET /supported` — lists the payment kinds this facilitator accepts.
pub async fn get_supported(State(engine): State<FacilitatorState>) -> Json<SupportedResponse> {
    Json(engine.supported())
}

/// `POST /verify` — verifies a payment authorization.
///
/// # Errors
///
/// Returns an HTTP error only for transport-level failures; rejected
/// payments come back as `isValid: false`.
pub async fn post_verify(
    State(engine): State<FacilitatorState>,
    Json(body): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let response = Facilitator::verify(
        engine.as_ref(),
        &body.payment_header,
        &body.payment_requirements,
    )
    .await?;
    Ok(Json(response))
}

/// `POST /settle` — settles a payment authorization on-chain or via the
/// chain's upstream facilitator.
///
/// # Errors
///
/// Returns an HTTP error only for transport-level failures; failed
/// settlements come back as a failure event.
pub async fn post_settle(
    State(engine): State<FacilitatorState>,
    Json(body): Json<SettleRequest>,
) -> Result<Json<SettleResponse>, ApiError> {
    let response = Facilitator::settle(
        engine.as_ref(),
        &body.payment_header,
        &body.payment_requirements,
    )
    .await?;
    Ok(Json(response))
}

/// `GET /health` — liveness probe.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Builds the facilitator router over the given state.
pub fn facilitator_router(state: FacilitatorState) -> axum::Router {
    axum::Router::new()
        .route("/supported", axum::routing::get(get_supported))
        .route("/verify", axum::routing::post(post_verify))
        .route("/settle", axum::routing::post(post_settle))
        .route("/health", axum::routing::get(health))
        .with_state(state)
}
