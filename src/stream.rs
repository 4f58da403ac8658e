// 공개 스트리밍 엔드포인트
//
// axum을 거치지 않는 raw TCP accept 루프: 연결마다 소켓 전체를
// lifecycle 핸들러에 넘긴다 (HTTP 서버 쪽 응답 경로를 쓰지 않는 hijack).

pub mod framer;
pub mod lifecycle;
pub mod probe;
pub mod request;

pub use framer::{encode_frame, EventStreamSender};
pub use lifecycle::{serve_subscriber, StreamSettings, Termination};

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{trace, warn};

use crate::core::RegistryHandle;

pub async fn run_public_listener(
    listener: TcpListener,
    registry: RegistryHandle,
    settings: Arc<StreamSettings>,
) {
    loop {
        let (socket, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!("[stream] accept failed: {}", e);
                continue;
            }
        };

        // 프레임마다 flush하므로 Nagle 지연 제거
        if let Err(e) = socket.set_nodelay(true) {
            trace!("[stream] set_nodelay failed for {}: {}", peer, e);
        }
        trace!("[stream] accepted {}", peer);

        tokio::spawn(serve_subscriber(socket, registry.clone(), Arc::clone(&settings)));
    }
}
