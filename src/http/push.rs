// 발행자용 push / close 핸들러
//
// POST /message  {"id": "...", "data": "...", "event": "..."}: id 비면 broadcast
// POST /close    {"id": "..."}: 명시적 구독 종료

use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::core::{deliver, Message};
use crate::error::HubError;

use super::dto::{CloseRequest, PushRequest};
use super::state::HttpState;

/// HubError → text/plain 에러 응답
pub fn error_response(err: HubError) -> Response {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        format!("{}\n", err),
    )
        .into_response()
}

fn text_ok(body: &'static str) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
}

fn parse_body<T: DeserializeOwned>(method: &Method, body: &[u8]) -> Result<T, HubError> {
    if method != Method::POST {
        warn!("[push] Only POST request accepted (got {})", method);
        return Err(HubError::MethodNotAllowed(method.to_string()));
    }
    serde_json::from_slice(body).map_err(|e| {
        warn!("[push] Unable to decode json: {}", e);
        HubError::InvalidBody(e.to_string())
    })
}

/// /message (모든 메서드 수신, POST 외 403)
pub async fn push_message(State(state): State<HttpState>, method: Method, body: Bytes) -> Response {
    let req: PushRequest = match parse_body(&method, &body) {
        Ok(r)  => r,
        Err(e) => return error_response(e),
    };

    let mut message = Message::new(req.data);
    if let Some(event) = req.event {
        message = message.with_event(event);
    }

    match deliver(&state.registry, &req.id, message).await {
        Ok(n) => {
            info!("[push] Finished sending ({} target(s))", n);
            text_ok("Finished sending\n")
        }
        Err(e) => error_response(e),
    }
}

/// /close (모든 메서드 수신, POST 외 403)
pub async fn close_client(State(state): State<HttpState>, method: Method, body: Bytes) -> Response {
    let req: CloseRequest = match parse_body(&method, &body) {
        Ok(r)  => r,
        Err(e) => return error_response(e),
    };
    if req.id.is_empty() {
        return error_response(HubError::EmptyId);
    }

    let found = match state.registry.lookup(&req.id).await {
        Ok(mut entries) => entries.pop().and_then(|e| e.connection),
        Err(e) => return error_response(e),
    };

    let result = match found {
        Some(conn) => conn.close(),
        None => Err(HubError::ClientNotFound(req.id.clone())),
    };

    match result {
        Ok(()) => {
            info!("[push] close requested for {}", req.id);
            text_ok("Closed\n")
        }
        Err(e) => {
            warn!("[push] {}", e);
            error_response(e)
        }
    }
}
