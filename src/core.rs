// 네트워크 로직과 분리된 순수 상태 관리 모듈
//   connection: 구독자별 수신함 (Message / Connection)
//   registry: id → Connection 테이블 액터
//   delivery: push / broadcast 전달

pub mod connection;
pub mod delivery;
pub mod registry;

pub use connection::{Connection, ConnectionInbox, Message};
pub use delivery::deliver;
pub use registry::{LookupEntry, RegistryHandle};
