use std::time::{SystemTime, UNIX_EPOCH};

/// 현재 시간을 밀리초 단위의 Unix Timestamp로 반환합니다.
/// 시계 오류 시 패닉 대신 0을 반환
pub fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// start_ms 이후 경과 초
pub fn uptime_secs(start_ms: u64) -> u64 {
    current_timestamp().saturating_sub(start_ms) / 1000
}
