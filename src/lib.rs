pub mod config;
pub mod core;
pub mod diagnostics;
pub mod error;
pub mod http;
pub mod logging;
pub mod stream;
pub mod utils;

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{bind_addr, HubConfig};
use crate::core::RegistryHandle;
use crate::error::{HubError, HubResult};
use crate::http::{internal_router, HttpState};
use crate::stream::{run_public_listener, StreamSettings};

/// 기동 완료된 허브: 두 리스너의 실제 주소와 레지스트리 핸들
pub struct Hub {
    pub registry:      RegistryHandle,
    pub public_addr:   SocketAddr,
    pub internal_addr: SocketAddr,
    internal_task:     JoinHandle<std::io::Result<()>>,
    public_task:       JoinHandle<()>,
}

impl Hub {
    /// 내부 API 서버가 끝날 때까지 대기
    pub async fn wait(self) -> HubResult<()> {
        let result = match self.internal_task.await {
            Ok(r)  => r.map_err(HubError::from),
            Err(e) => Err(HubError::Config(format!("internal server task failed: {}", e))),
        };
        self.public_task.abort();
        result
    }

    pub fn shutdown(self) {
        self.internal_task.abort();
        self.public_task.abort();
    }
}

/// 레지스트리 액터, 두 리스너, 진단 시그널 태스크를 띄운다.
/// 리스너 바인딩 실패만 치명적
pub async fn start_hub(config: HubConfig) -> HubResult<Hub> {
    config.validate()?;
    let registry = RegistryHandle::spawn();
    let settings = Arc::new(StreamSettings::from(&config));
    let http_state = HttpState::new(registry.clone());

    let public = TcpListener::bind(bind_addr(&config.listen_public)).await.map_err(|e| {
        HubError::Config(format!("unable to listen on {}: {}", config.listen_public, e))
    })?;
    let internal = TcpListener::bind(bind_addr(&config.listen_internal)).await.map_err(|e| {
        HubError::Config(format!("unable to listen on {}: {}", config.listen_internal, e))
    })?;
    let public_addr = public.local_addr()?;
    let internal_addr = internal.local_addr()?;

    let config = Arc::new(config);
    let diag_registry = registry.clone();
    let diag_start = http_state.start_time_ms;
    tokio::spawn(async move {
        if let Err(e) = diagnostics::run_signal_dumper(diag_registry, config, diag_start).await {
            warn!("[diag] signal dumper stopped: {}", e);
        }
    });

    let public_task = tokio::spawn(run_public_listener(public, registry.clone(), settings));

    let app = internal_router(http_state);
    let internal_task = tokio::spawn(async move { axum::serve(internal, app).await });

    info!("[sse-hub] Public stream endpoint on http://{}/<id>", public_addr);
    info!("[sse-hub] Internal push API on http://{}/message", internal_addr);

    Ok(Hub { registry, public_addr, internal_addr, internal_task, public_task })
}

pub async fn run_server(config: HubConfig) -> HubResult<()> {
    start_hub(config).await?.wait().await
}
