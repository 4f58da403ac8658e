// Registry: id → Connection 라우팅 테이블을 단독 소유하는 액터
//
// 구조:
//   push 핸들러 / lifecycle 핸들러 / 진단 덤프
//       └── RegistryHandle (clone 가능, mpsc 송신자)
//               └── RegistryCommand 큐 (단일 직렬화 지점)
//                       └── run_registry(): HashMap을 소유한 유일한 태스크
//
// 조회/추가/삭제/카운트는 모두 한 큐를 거치므로 서로 전순서(total order)를 가진다.
// 응답이 필요한 명령은 oneshot 회신 채널을 같이 보낸다.

use std::collections::HashMap;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, trace, warn};

use crate::config;
use crate::core::connection::Connection;
use crate::error::{HubError, HubResult};

// ----------------------------------------------------------------------------
// [조회 결과]
// ----------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct LookupEntry {
    pub id:         String,
    /// None이면 미등록 (present = false)
    pub connection: Option<Connection>,
}

impl LookupEntry {
    pub fn is_present(&self) -> bool {
        self.connection.is_some()
    }
}

// ----------------------------------------------------------------------------
// [명령]
// ----------------------------------------------------------------------------

enum RegistryCommand {
    /// id가 비어 있으면 전체 목록, 아니면 단건
    Lookup { id: String, reply: oneshot::Sender<Vec<LookupEntry>> },
    /// 무조건 삽입 (중복 확인은 호출자 책임)
    Add(Connection),
    /// 원자적 check-and-add: 이미 있으면 false
    TryAdd { connection: Connection, reply: oneshot::Sender<bool> },
    Delete(String),
    Count(oneshot::Sender<usize>),
    Ids(oneshot::Sender<Vec<String>>),
}

// ----------------------------------------------------------------------------
// [RegistryHandle]
// ----------------------------------------------------------------------------

#[derive(Clone)]
pub struct RegistryHandle {
    tx: mpsc::Sender<RegistryCommand>,
}

impl RegistryHandle {
    /// 액터 태스크를 띄우고 핸들 반환.
    /// 모든 핸들이 drop되면 액터도 종료
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(config::REGISTRY_QUEUE_SIZE);
        tokio::spawn(run_registry(rx));
        Self { tx }
    }

    pub async fn lookup(&self, id: &str) -> HubResult<Vec<LookupEntry>> {
        let (reply, rx) = oneshot::channel();
        self.request(RegistryCommand::Lookup { id: id.to_string(), reply }, rx).await
    }

    pub async fn add(&self, connection: Connection) -> HubResult<()> {
        self.tx
            .send(RegistryCommand::Add(connection))
            .await
            .map_err(|_| HubError::RegistryClosed)
    }

    pub async fn try_add(&self, connection: Connection) -> HubResult<bool> {
        let (reply, rx) = oneshot::channel();
        self.request(RegistryCommand::TryAdd { connection, reply }, rx).await
    }

    pub async fn delete(&self, id: &str) -> HubResult<()> {
        self.tx
            .send(RegistryCommand::Delete(id.to_string()))
            .await
            .map_err(|_| HubError::RegistryClosed)
    }

    pub async fn count(&self) -> HubResult<usize> {
        let (reply, rx) = oneshot::channel();
        self.request(RegistryCommand::Count(reply), rx).await
    }

    /// 등록된 id 목록 (정렬)
    pub async fn ids(&self) -> HubResult<Vec<String>> {
        let (reply, rx) = oneshot::channel();
        self.request(RegistryCommand::Ids(reply), rx).await
    }

    async fn request<T>(&self, cmd: RegistryCommand, rx: oneshot::Receiver<T>) -> HubResult<T> {
        self.tx.send(cmd).await.map_err(|_| HubError::RegistryClosed)?;
        rx.await.map_err(|_| HubError::RegistryClosed)
    }
}

// ----------------------------------------------------------------------------
// [액터 루프]
// ----------------------------------------------------------------------------

async fn run_registry(mut rx: mpsc::Receiver<RegistryCommand>) {
    let mut clients: HashMap<String, Connection> = HashMap::new();
    info!("[registry] Started");

    while let Some(cmd) = rx.recv().await {
        match cmd {
            RegistryCommand::Lookup { id, reply } => {
                let _ = reply.send(lookup(&clients, id));
            }
            RegistryCommand::Add(connection) => {
                let id = connection.id().to_string();
                if clients.insert(id.clone(), connection).is_some() {
                    warn!("[registry] client {} overwritten by unconditional add", id);
                }
                trace!("[registry] added {} (total={})", id, clients.len());
            }
            RegistryCommand::TryAdd { connection, reply } => {
                let added = if clients.contains_key(connection.id()) {
                    false
                } else {
                    let id = connection.id().to_string();
                    clients.insert(id.clone(), connection);
                    trace!("[registry] added {} (total={})", id, clients.len());
                    true
                };
                let _ = reply.send(added);
            }
            RegistryCommand::Delete(id) => {
                if clients.remove(&id).is_some() {
                    trace!("[registry] deleted {} (total={})", id, clients.len());
                }
            }
            RegistryCommand::Count(reply) => {
                let _ = reply.send(clients.len());
            }
            RegistryCommand::Ids(reply) => {
                let mut ids: Vec<String> = clients.keys().cloned().collect();
                ids.sort_unstable();
                let _ = reply.send(ids);
            }
        }
    }

    info!("[registry] Stopped ({} client(s) left)", clients.len());
}

fn lookup(clients: &HashMap<String, Connection>, id: String) -> Vec<LookupEntry> {
    if !id.is_empty() {
        let connection = clients.get(&id).cloned();
        return vec![LookupEntry { id, connection }];
    }

    let mut all: Vec<LookupEntry> = clients
        .iter()
        .map(|(id, conn)| LookupEntry { id: id.clone(), connection: Some(conn.clone()) })
        .collect();
    all.sort_by(|a, b| a.id.cmp(&b.id));
    all
}
