// 내부 push API (발행자 전용 리스너)
//
// POST /message  → push / broadcast
// POST /close    → 명시적 구독 종료
// GET  /status   → 허브 상태
// GET  /clients  → 등록 id 목록

pub mod admin;
pub mod dto;
pub mod push;
pub mod state;

pub use state::HttpState;

use axum::{routing::{any, get}, Router};
use tower_http::cors::{Any, CorsLayer};

pub fn internal_router(state: HttpState) -> Router {
    // CORS: 운영 대시보드에서 status/clients 조회 허용
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/message", any(push::push_message))
        .route("/close",   any(push::close_client))
        .route("/status",  get(admin::hub_status))
        .route("/clients", get(admin::list_clients))
        .with_state(state)
        .layer(cors)
}
