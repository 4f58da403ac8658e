// HttpState: 내부 API 핸들러 공유 상태

use crate::core::RegistryHandle;
use crate::utils::current_timestamp;

#[derive(Clone)]
pub struct HttpState {
    pub registry:      RegistryHandle,
    /// 서버 프로세스 시작 시각 (Unix millis): uptime 계산용
    pub start_time_ms: u64,
}

impl HttpState {
    pub fn new(registry: RegistryHandle) -> Self {
        Self { registry, start_time_ms: current_timestamp() }
    }
}
