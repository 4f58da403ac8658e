// Connection: 구독자 1명에 대응하는 메시지 수신함

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::trace;

use crate::error::{HubError, HubResult};

// ----------------------------------------------------------------------------
// [Message] push/broadcast 요청마다 1개 생성, 대상 전달 루프가 1회 소비
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// None 또는 빈 문자열이면 이름 없는 이벤트
    pub event_type: Option<String>,
    pub payload:    String,
}

impl Message {
    pub fn new(payload: impl Into<String>) -> Self {
        Self { event_type: None, payload: payload.into() }
    }

    pub fn with_event(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// 프레이밍에 실제로 쓰일 이벤트 이름 (빈 문자열은 없음으로 취급)
    pub fn event_name(&self) -> Option<&str> {
        self.event_type.as_deref().filter(|name| !name.is_empty())
    }
}

// ----------------------------------------------------------------------------
// [Connection] 레지스트리가 보관하는 송신 측 핸들
// ----------------------------------------------------------------------------

/// 생성 이후 불변. clone은 같은 수신함을 가리킨다.
#[derive(Debug, Clone)]
pub struct Connection {
    id:    String,
    inbox: mpsc::Sender<Message>,
    close: mpsc::Sender<()>,
}

/// 수신 측: 해당 연결의 lifecycle 핸들러만 소유
pub struct ConnectionInbox {
    pub messages: mpsc::Receiver<Message>,
    pub close:    mpsc::Receiver<()>,
}

impl Connection {
    pub fn new(id: impl Into<String>, capacity: usize) -> (Self, ConnectionInbox) {
        let (inbox_tx, inbox_rx) = mpsc::channel(capacity.max(1));
        // close는 1회성 신호: 용량 1이면 중복 요청은 자연스럽게 합쳐짐
        let (close_tx, close_rx) = mpsc::channel(1);

        let conn = Self { id: id.into(), inbox: inbox_tx, close: close_tx };
        trace!("Connection created: {}", conn.id);
        (conn, ConnectionInbox { messages: inbox_rx, close: close_rx })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// 수신함에 자리가 날 때까지 대기 후 전달.
    /// 전달 루프가 이미 종료됐다면 ClientNotFound
    pub async fn write(&self, msg: Message) -> HubResult<()> {
        self.inbox
            .send(msg)
            .await
            .map_err(|_| HubError::ClientNotFound(self.id.clone()))
    }

    /// 외부 API의 명시적 종료 요청
    pub fn close(&self) -> HubResult<()> {
        match self.close.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => Ok(()),
            Err(TrySendError::Closed(())) => Err(HubError::ClientNotFound(self.id.clone())),
        }
    }

    /// 전달 루프가 끝나 수신함이 닫혔는지
    pub fn is_gone(&self) -> bool {
        self.inbox.is_closed()
    }
}
