// push / broadcast 전달 프로토콜
//
// target_id 비어 있음 → 조회 시점의 전체 연결에 순서대로 전달
// target_id 있음      → 해당 연결 1개
//
// 도중에 사라진 대상을 만나면 그 자리에서 중단하고 ClientNotFound.
// 이미 전달된 대상은 되돌리지 않는다 (all-or-nothing 아님).

use tracing::{info, warn};

use crate::core::connection::Message;
use crate::core::registry::RegistryHandle;
use crate::error::{HubError, HubResult};

/// 전달에 성공한 대상 수 반환
pub async fn deliver(registry: &RegistryHandle, target_id: &str, message: Message) -> HubResult<usize> {
    let targets = registry.lookup(target_id).await?;
    let chars = message.payload.chars().count();
    let mut delivered = 0;

    for entry in targets {
        let Some(conn) = entry.connection else {
            warn!("[push] Client {} not found", entry.id);
            return Err(HubError::ClientNotFound(entry.id));
        };

        if let Err(e) = conn.write(message.clone()).await {
            warn!("[push] Client {} vanished during delivery", entry.id);
            return Err(e);
        }

        delivered += 1;
        info!("[push] sent {} characters to id {}", chars, entry.id);
    }

    Ok(delivered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection::Connection;

    #[tokio::test]
    async fn unknown_target_is_not_found() {
        let registry = RegistryHandle::spawn();
        match deliver(&registry, "ghost", Message::new("hi")).await {
            Err(HubError::ClientNotFound(id)) => assert_eq!(id, "ghost"),
            other => panic!("expected ClientNotFound, got {:?}", other),
        }
        assert_eq!(registry.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn push_reaches_single_target() {
        let registry = RegistryHandle::spawn();
        let (conn, mut inbox) = Connection::new("alice", 4);
        registry.add(conn).await.unwrap();

        let n = deliver(&registry, "alice", Message::new("hi").with_event("greet")).await.unwrap();
        assert_eq!(n, 1);

        let got = inbox.messages.recv().await.unwrap();
        assert_eq!(got.payload, "hi");
        assert_eq!(got.event_name(), Some("greet"));
    }

    #[tokio::test]
    async fn broadcast_to_empty_registry_succeeds() {
        let registry = RegistryHandle::spawn();
        assert_eq!(deliver(&registry, "", Message::new("nobody")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn broadcast_stops_at_vanished_target_without_rollback() {
        let registry = RegistryHandle::spawn();
        let (a, mut a_inbox) = Connection::new("a", 4);
        let (b, b_inbox) = Connection::new("b", 4);
        let (c, mut c_inbox) = Connection::new("c", 4);
        registry.add(a).await.unwrap();
        registry.add(b).await.unwrap();
        registry.add(c).await.unwrap();

        // b의 전달 루프가 종료된 상황 (레지스트리 삭제 전)
        drop(b_inbox);

        match deliver(&registry, "", Message::new("all")).await {
            Err(HubError::ClientNotFound(id)) => assert_eq!(id, "b"),
            other => panic!("expected ClientNotFound, got {:?}", other),
        }

        assert_eq!(a_inbox.messages.recv().await.unwrap().payload, "all");
        assert!(c_inbox.messages.try_recv().is_err());
    }
}
