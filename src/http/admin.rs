// 운영 조회 핸들러
//   GET /status   → 허브 상태 요약
//   GET /clients  → 등록된 client id 목록 (정렬)

use axum::{extract::State, response::{IntoResponse, Response}, Json};

use crate::utils::uptime_secs;

use super::dto::HubStatus;
use super::push::error_response;
use super::state::HttpState;

/// GET /status
pub async fn hub_status(State(state): State<HttpState>) -> Response {
    match state.registry.count().await {
        Ok(client_count) => Json(HubStatus {
            uptime_secs: uptime_secs(state.start_time_ms),
            client_count,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /clients
pub async fn list_clients(State(state): State<HttpState>) -> Response {
    match state.registry.ids().await {
        Ok(ids) => Json(ids).into_response(),
        Err(e)  => error_response(e),
    }
}
