// liveness 프로브: 연결마다 1개, lifecycle 핸들러와 같은 transport의 읽기 측을 감시
//
// SSE는 서버 → 클라이언트 단방향이라 쓰기만으로는 정상 종료를 알 수 없다.
// 주기마다 짧은 데드라인으로 1바이트 읽기를 시도:
//   EOF          → 피어가 닫음. 핸들러에 종료 신호 후 프로브 종료
//   타임아웃/에러 → 살아 있음 (구독자는 보통 아무것도 보내지 않음)
//   데이터        → 로그만 남기고 살아 있음
//
// 종료 신호는 양방향 모두 oneshot: 상대가 이미 사라졌어도 send가 막히지 않는다.

use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 데드라인 내 데이터 없음 또는 EOF 외 에러
    Idle,
    /// 구독자가 예상 밖의 바이트를 보냄
    Data(usize),
    /// EOF: 피어가 연결을 닫음
    Closed,
}

pub async fn probe_once<R>(reader: &mut R, deadline: Duration) -> ProbeOutcome
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 1];
    match tokio::time::timeout(deadline, reader.read(&mut buf)).await {
        Err(_elapsed) => ProbeOutcome::Idle,
        Ok(Ok(0)) => ProbeOutcome::Closed,
        Ok(Ok(n)) => {
            info!("[probe] read: {} {:?}", n, &buf[..n]);
            ProbeOutcome::Data(n)
        }
        Ok(Err(e)) => {
            trace!("[probe] read error treated as alive: {}", e);
            ProbeOutcome::Idle
        }
    }
}

/// stop 수신(또는 핸들러 drop) 시 다음 프로브 없이 즉시 종료.
/// EOF 감지 시 peer_gone으로 알리고 종료: 핸들러가 없어도 send는 실패만 할 뿐
pub async fn run_prober<R>(
    mut reader:    R,
    client_id:     String,
    interval:      Duration,
    deadline:      Duration,
    mut stop:      oneshot::Receiver<()>,
    peer_gone:     oneshot::Sender<()>,
) where
    R: AsyncRead + Unpin,
{
    // 0 주기는 interval()이 패닉하므로 최소 1ms
    let mut timer = tokio::time::interval(interval.max(Duration::from_millis(1)));
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => {
                debug!("[probe] {} stopped by handler", client_id);
                return;
            }
            _ = timer.tick() => {}
        }

        if probe_once(&mut reader, deadline).await == ProbeOutcome::Closed {
            info!("[probe] {} closed by peer", client_id);
            let _ = peer_gone.send(());
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;

    const DEADLINE: Duration = Duration::from_millis(10);

    #[tokio::test]
    async fn idle_peer_is_alive() {
        let (_client, mut server) = tokio::io::duplex(64);
        assert_eq!(probe_once(&mut server, DEADLINE).await, ProbeOutcome::Idle);
    }

    #[tokio::test]
    async fn closed_peer_is_detected() {
        let (client, mut server) = tokio::io::duplex(64);
        drop(client);
        assert_eq!(probe_once(&mut server, DEADLINE).await, ProbeOutcome::Closed);
    }

    #[tokio::test]
    async fn unexpected_bytes_keep_connection_alive() {
        let (mut client, mut server) = tokio::io::duplex(64);
        client.write_all(b"x").await.unwrap();
        assert_eq!(probe_once(&mut server, DEADLINE).await, ProbeOutcome::Data(1));
    }

    #[tokio::test]
    async fn prober_signals_peer_gone() {
        let (client, server) = tokio::io::duplex(64);
        let (_stop_tx, stop_rx) = oneshot::channel();
        let (gone_tx, gone_rx) = oneshot::channel();

        let task = tokio::spawn(run_prober(
            server, "alice".into(), Duration::from_millis(20), DEADLINE, stop_rx, gone_tx,
        ));
        drop(client);

        tokio::time::timeout(Duration::from_secs(2), gone_rx).await.unwrap().unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn zero_interval_keeps_probing_idle_peer() {
        let (client, server) = tokio::io::duplex(64);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (gone_tx, mut gone_rx) = oneshot::channel();

        let task = tokio::spawn(run_prober(
            server, "alice".into(), Duration::ZERO, DEADLINE, stop_rx, gone_tx,
        ));
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished(), "idle peer must stay alive");
        assert!(matches!(gone_rx.try_recv(), Err(oneshot::error::TryRecvError::Empty)));

        stop_tx.send(()).unwrap();
        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        drop(client);
    }

    #[tokio::test]
    async fn prober_exits_on_stop_without_signal() {
        let (_client, server) = tokio::io::duplex(64);
        let (stop_tx, stop_rx) = oneshot::channel();
        let (gone_tx, mut gone_rx) = oneshot::channel();

        let task = tokio::spawn(run_prober(
            server, "alice".into(), Duration::from_secs(3600), DEADLINE, stop_rx, gone_tx,
        ));
        stop_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        // 종료 신호 없이 sender만 drop
        assert!(matches!(gone_rx.try_recv(), Err(oneshot::error::TryRecvError::Closed)));
    }
}
