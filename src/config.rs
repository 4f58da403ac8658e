// 매직 넘버를 배제하고 허브 전체의 동작과 한계를 제어하는 상수 + 런타임 설정입니다.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{HubError, HubResult};

/// 구독자용 공개 스트리밍 리스너
pub const DEFAULT_LISTEN_PUBLIC: &str = ":8888";

/// 발행자용 내부 push API 리스너
pub const DEFAULT_LISTEN_INTERNAL: &str = ":8889";

/// 로그 출력 대상: "stdout" | "stderr" | 파일 경로
pub const DEFAULT_LOG: &str = "stdout";

/// liveness 프로브 실행 주기 (10초)
pub const PROBE_INTERVAL_MS: u64 = 10_000;

/// 프로브 1바이트 읽기 데드라인.
/// 전송 지연은 없을 만큼 짧고, "데이터 없음"과 실제 에러를 구분할 만큼은 길어야 함
pub const PROBE_DEADLINE_MS: u64 = 10;

/// 연결별 inbox 큐 사이즈.
/// 꽉 차면 push 요청이 자리가 날 때까지 대기 (Drop 없음, Backpressure)
pub const INBOX_CAPACITY: usize = 16;

/// 구독 요청 헤더 최대 크기 (메모리 OOM 방어)
pub const MAX_REQUEST_HEAD_BYTES: usize = 8 * 1024;

/// 연결 후 요청 헤더를 다 받을 때까지의 제한 시간 (초과 시 408 후 종료)
pub const REQUEST_HEAD_TIMEOUT_MS: u64 = 5_000;

/// 레지스트리 액터 명령 큐 사이즈
pub const REGISTRY_QUEUE_SIZE: usize = 256;

// ----------------------------------------------------------------------------
// [HubConfig] 설정 파일 (JSON)
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HubConfig {
    #[serde(alias = "ListenPublic")]
    pub listen_public:     String,
    #[serde(alias = "ListenInternal")]
    pub listen_internal:   String,
    #[serde(alias = "Log")]
    pub log:               String,
    pub probe_interval_ms: u64,
    pub probe_deadline_ms: u64,
    pub inbox_capacity:    usize,
    /// true면 빈 줄 구분자 없는 구형 프레이밍을 그대로 재현
    pub legacy_framing:    bool,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            listen_public:     DEFAULT_LISTEN_PUBLIC.to_string(),
            listen_internal:   DEFAULT_LISTEN_INTERNAL.to_string(),
            log:               DEFAULT_LOG.to_string(),
            probe_interval_ms: PROBE_INTERVAL_MS,
            probe_deadline_ms: PROBE_DEADLINE_MS,
            inbox_capacity:    INBOX_CAPACITY,
            legacy_framing:    false,
        }
    }
}

impl HubConfig {
    pub fn from_file(path: impl AsRef<Path>) -> HubResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HubError::Config(format!("Error opening config {}: {}", path.display(), e)))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> HubResult<Self> {
        let cfg: Self = serde_json::from_str(raw)
            .map_err(|e| HubError::Config(format!("Error decoding config: {}", e)))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// 0 주기는 tokio interval이 패닉하므로 기동 전에 거절
    pub fn validate(&self) -> HubResult<()> {
        if self.probe_interval_ms == 0 {
            return Err(HubError::Config("probe_interval_ms must be greater than 0".to_string()));
        }
        Ok(())
    }

    /// 진단 덤프용 들여쓰기 JSON
    pub fn pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_millis(self.probe_interval_ms)
    }

    pub fn probe_deadline(&self) -> Duration {
        Duration::from_millis(self.probe_deadline_ms)
    }
}

/// ":8888" 처럼 호스트가 비어 있으면 전체 인터페이스로 바인딩
pub fn bind_addr(listen: &str) -> String {
    if listen.starts_with(':') {
        format!("0.0.0.0{}", listen)
    } else {
        listen.to_string()
    }
}
