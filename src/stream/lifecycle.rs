// 구독자 1명의 연결 생명주기
//
//   요청 헤더 파싱 → id 추출 → 레지스트리 등록 → preamble 기록
//     → 프로브 spawn → 전달 루프(Streaming) → Terminated
//     → (무조건) 레지스트리 삭제 + transport 종료
//
// 전달 루프가 기다리는 이벤트:
//   inbox 메시지    → 프레임 기록, Streaming 유지
//   close 신호      → 프로브에 중단 통지 후 종료
//   프로브 peer_gone → 통지 없이 종료 (프로브는 이미 스스로 멈춤)

use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use axum::http::StatusCode;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::HubConfig;
use crate::core::{Connection, ConnectionInbox, RegistryHandle};
use crate::error::HubError;

use super::framer::EventStreamSender;
use super::probe::run_prober;
use super::request::{client_id, read_request_head};

// ----------------------------------------------------------------------------
// [설정]
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub probe_interval:  Duration,
    pub probe_deadline:  Duration,
    pub inbox_capacity:  usize,
    pub legacy_framing:  bool,
    pub max_head_bytes:  usize,
    pub head_timeout:    Duration,
}

impl From<&HubConfig> for StreamSettings {
    fn from(cfg: &HubConfig) -> Self {
        Self {
            probe_interval: cfg.probe_interval(),
            probe_deadline: cfg.probe_deadline(),
            inbox_capacity: cfg.inbox_capacity,
            legacy_framing: cfg.legacy_framing,
            max_head_bytes: crate::config::MAX_REQUEST_HEAD_BYTES,
            head_timeout:   Duration::from_millis(crate::config::REQUEST_HEAD_TIMEOUT_MS),
        }
    }
}

// ----------------------------------------------------------------------------
// [종료 사유]
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// 외부 API의 명시적 close
    ClosedByApi,
    /// 프로브가 EOF 감지
    PeerClosed,
    /// 프레임 쓰기 실패
    WriteFailed,
    /// 모든 송신 핸들이 사라짐
    InboxClosed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Termination::ClosedByApi => "closed by api",
            Termination::PeerClosed  => "closed by peer",
            Termination::WriteFailed => "write failed",
            Termination::InboxClosed => "inbox closed",
        };
        f.write_str(s)
    }
}

// ----------------------------------------------------------------------------
// [핵심] 구독 연결 처리: 소켓을 통째로 소유 (hijack)
// ----------------------------------------------------------------------------

pub async fn serve_subscriber<S>(stream: S, registry: RegistryHandle, settings: Arc<StreamSettings>)
where
    S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (read_half, mut write_half) = tokio::io::split(stream);
    let mut reader = BufReader::new(read_half);

    // 1. 요청 헤더 + id
    let parsed = match tokio::time::timeout(
        settings.head_timeout,
        read_request_head(&mut reader, settings.max_head_bytes),
    )
    .await
    {
        Ok(parsed) => parsed,
        Err(_elapsed) => Err(HubError::RequestTimeout),
    };
    let head = match parsed {
        Ok(h) => h,
        Err(e) => {
            warn!("[stream] {}", e);
            reject(&mut write_half, &e).await;
            return;
        }
    };

    let id = client_id(head.path());
    if id.is_empty() {
        warn!("[stream] no identifier provided");
        reject(&mut write_half, &HubError::EmptyId).await;
        return;
    }

    // 2~3. 중복 확인 + 등록 (원자적)
    let (connection, inbox) = Connection::new(id.clone(), settings.inbox_capacity);
    match registry.try_add(connection).await {
        Ok(true) => {}
        Ok(false) => {
            warn!("[stream] the client {} already exist. No overwriting", id);
            reject(&mut write_half, &HubError::DuplicateId(id)).await;
            return;
        }
        Err(e) => {
            warn!("[stream] {}", e);
            reject(&mut write_half, &e).await;
            return;
        }
    }
    info!("[stream] connected: {}", id);

    // 4. preamble
    let mut sender = EventStreamSender::new(write_half, settings.legacy_framing);
    let termination = match sender.write_preamble().await {
        Err(e) => {
            warn!("[stream] {} preamble write failed: {}", id, e);
            Termination::WriteFailed
        }
        Ok(()) => {
            // 5. 프로브: 읽기 측 소유권 이전
            let (stop_tx, stop_rx) = oneshot::channel();
            let (gone_tx, gone_rx) = oneshot::channel();
            let prober = tokio::spawn(run_prober(
                reader,
                id.clone(),
                settings.probe_interval,
                settings.probe_deadline,
                stop_rx,
                gone_tx,
            ));

            // 6. 전달 루프
            let termination = deliver_loop(&id, &mut sender, inbox, gone_rx).await;
            if termination != Termination::PeerClosed {
                let _ = stop_tx.send(());
            }
            let _ = prober.await;
            termination
        }
    };

    // 7. 무조건 정리
    if let Err(e) = registry.delete(&id).await {
        warn!("[stream] {} delete failed: {}", id, e);
    }
    sender.shutdown().await;
    info!("[stream] disconnected: {} ({})", id, termination);
}

/// Streaming 상태. 반환 = Terminated 전이 사유
pub async fn deliver_loop<W>(
    id:            &str,
    sender:        &mut EventStreamSender<W>,
    mut inbox:     ConnectionInbox,
    mut peer_gone: oneshot::Receiver<()>,
) -> Termination
where
    W: AsyncWrite + Unpin,
{
    loop {
        tokio::select! {
            msg = inbox.messages.recv() => match msg {
                Some(msg) => {
                    if let Err(e) = sender.send(&msg).await {
                        warn!("[stream] {} frame write failed: {}", id, e);
                        return Termination::WriteFailed;
                    }
                }
                None => return Termination::InboxClosed,
            },
            Some(()) = inbox.close.recv() => {
                info!("[stream] {} terminated by the outer api", id);
                return Termination::ClosedByApi;
            }
            _ = &mut peer_gone => {
                info!("[stream] {} terminated by liveness probe", id);
                return Termination::PeerClosed;
            }
        }
    }
}

/// 완결된 HTTP/1.1 에러 응답 후 연결 종료
async fn reject<W: AsyncWrite + Unpin>(writer: &mut W, err: &HubError) {
    let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let body = format!("{}\n", err);
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nX-Content-Type-Options: nosniff\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status.as_u16(),
        status.canonical_reason().unwrap_or(""),
        body.len(),
        body,
    );
    let _ = writer.write_all(response.as_bytes()).await;
    let _ = writer.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Message;
    use tokio::io::{AsyncBufReadExt, AsyncReadExt, DuplexStream};

    fn settings() -> Arc<StreamSettings> {
        Arc::new(StreamSettings {
            probe_interval: Duration::from_millis(30),
            probe_deadline: Duration::from_millis(5),
            inbox_capacity: 4,
            legacy_framing: false,
            max_head_bytes: 1024,
            head_timeout:   Duration::from_secs(2),
        })
    }

    /// 요청을 보내고 preamble까지 읽은 클라이언트 측
    async fn subscribe(registry: &RegistryHandle, path: &str) -> (BufReader<DuplexStream>, tokio::task::JoinHandle<()>) {
        let (mut client, server) = tokio::io::duplex(4096);
        let task = tokio::spawn(serve_subscriber(server, registry.clone(), settings()));
        client
            .write_all(format!("GET {} HTTP/1.1\r\nHost: test\r\n\r\n", path).as_bytes())
            .await
            .unwrap();
        (BufReader::new(client), task)
    }

    async fn read_line(client: &mut BufReader<DuplexStream>) -> String {
        let mut line = String::new();
        tokio::time::timeout(Duration::from_secs(2), client.read_line(&mut line))
            .await
            .unwrap()
            .unwrap();
        line
    }

    async fn wait_for_count(registry: &RegistryHandle, expected: usize) {
        for _ in 0..200 {
            if registry.count().await.unwrap() == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("registry count never reached {}", expected);
    }

    #[tokio::test]
    async fn empty_id_gets_404() {
        let registry = RegistryHandle::spawn();
        let (mut client, task) = subscribe(&registry, "/").await;
        assert!(read_line(&mut client).await.starts_with("HTTP/1.1 404"));
        task.await.unwrap();
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn streams_messages_then_cleans_up_on_close() {
        let registry = RegistryHandle::spawn();
        let (mut client, task) = subscribe(&registry, "/alice").await;
        assert_eq!(read_line(&mut client).await, "HTTP/1.1 200 OK\r\n");
        wait_for_count(&registry, 1).await;

        let conn = registry.lookup("alice").await.unwrap()[0].connection.clone().unwrap();
        conn.write(Message::new("hi").with_event("greet")).await.unwrap();

        // 헤더 나머지 건너뛰고 프레임 확인
        loop {
            if read_line(&mut client).await == "\r\n" {
                break;
            }
        }
        assert_eq!(read_line(&mut client).await, "event: greet\n");
        assert_eq!(read_line(&mut client).await, "data: hi\n");
        assert_eq!(read_line(&mut client).await, "\n");

        conn.close().unwrap();
        task.await.unwrap();
        assert_eq!(registry.count().await.unwrap(), 0);

        let mut rest = Vec::new();
        client.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_and_first_survives() {
        let registry = RegistryHandle::spawn();
        let (mut first, first_task) = subscribe(&registry, "/dup").await;
        read_line(&mut first).await;
        wait_for_count(&registry, 1).await;

        let (mut second, second_task) = subscribe(&registry, "/dup").await;
        assert!(read_line(&mut second).await.starts_with("HTTP/1.1 404"));
        second_task.await.unwrap();
        assert_eq!(registry.count().await.unwrap(), 1);

        let conn = registry.lookup("dup").await.unwrap()[0].connection.clone().unwrap();
        assert!(!conn.is_gone());
        conn.close().unwrap();
        first_task.await.unwrap();
    }

    #[tokio::test]
    async fn peer_disconnect_unregisters() {
        let registry = RegistryHandle::spawn();
        let (mut client, task) = subscribe(&registry, "/bob").await;
        read_line(&mut client).await;
        wait_for_count(&registry, 1).await;

        drop(client);
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(!registry.lookup("bob").await.unwrap()[0].is_present());
    }

    #[tokio::test]
    async fn silent_peer_is_dropped_after_head_timeout() {
        let registry = RegistryHandle::spawn();
        let (client, server) = tokio::io::duplex(1024);
        let settings = Arc::new(StreamSettings { head_timeout: Duration::from_millis(50), ..(*settings()).clone() });
        let task = tokio::spawn(serve_subscriber(server, registry.clone(), settings));

        // 요청을 보내지 않은 채 대기
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();

        let mut client = BufReader::new(client);
        assert!(read_line(&mut client).await.starts_with("HTTP/1.1 408"));
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn absolute_form_request_is_accepted() {
        let registry = RegistryHandle::spawn();
        let (mut client, task) = subscribe(&registry, "http://hub.example:8888/carol").await;
        assert_eq!(read_line(&mut client).await, "HTTP/1.1 200 OK\r\n");
        wait_for_count(&registry, 1).await;
        assert!(registry.lookup("carol").await.unwrap()[0].is_present());

        let conn = registry.lookup("carol").await.unwrap()[0].connection.clone().unwrap();
        conn.close().unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn deliver_loop_reports_peer_gone() {
        let (_client, server) = tokio::io::duplex(64);
        let mut sender = EventStreamSender::new(server, false);
        let (_conn, inbox) = Connection::new("x", 1);
        let (gone_tx, gone_rx) = oneshot::channel();
        gone_tx.send(()).unwrap();
        assert_eq!(deliver_loop("x", &mut sender, inbox, gone_rx).await, Termination::PeerClosed);
    }
}
