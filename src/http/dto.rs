// 내부 API 요청/응답 DTO

use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// [요청]
// ----------------------------------------------------------------------------

/// POST /message: id가 비어 있으면 broadcast
#[derive(Debug, Deserialize)]
pub struct PushRequest {
    #[serde(default, alias = "Id")]
    pub id:    String,
    #[serde(default, alias = "Data")]
    pub data:  String,
    /// 이벤트 이름 (생략 시 이름 없는 이벤트)
    #[serde(default, alias = "Event")]
    pub event: Option<String>,
}

/// POST /close
#[derive(Debug, Deserialize)]
pub struct CloseRequest {
    #[serde(default, alias = "Id")]
    pub id: String,
}

// ----------------------------------------------------------------------------
// [응답]
// ----------------------------------------------------------------------------

/// GET /status
#[derive(Debug, Serialize)]
pub struct HubStatus {
    pub uptime_secs:  u64,
    pub client_count: usize,
    pub version:      String,
}
