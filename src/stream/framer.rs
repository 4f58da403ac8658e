// EventStreamSender: Message를 event-stream 프레임으로 직렬화해 쓰고 즉시 flush
//
// 표준 모드 (기본):
//   event: <type>\n      (type이 있을 때만)
//   data: <line>\n       (payload 줄마다)
//   \n                   (레코드 구분 빈 줄)
//
// legacy 모드: 빈 줄 구분자 없이 event/data 한 줄씩: 기존 프로토콜 바이트 그대로

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use crate::core::Message;

const PREAMBLE_STANDARD: &str =
    "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nCache-Control: no-cache\r\nConnection: keep-alive\r\n\r\n";
const PREAMBLE_LEGACY: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\n";

pub fn preamble(legacy: bool) -> &'static str {
    if legacy { PREAMBLE_LEGACY } else { PREAMBLE_STANDARD }
}

pub fn encode_frame(msg: &Message, legacy: bool) -> Bytes {
    let mut buf = BytesMut::with_capacity(msg.payload.len() + 32);

    if legacy {
        if let Some(name) = msg.event_name() {
            put_field(&mut buf, "event", name);
        }
        put_field(&mut buf, "data", &msg.payload);
        return buf.freeze();
    }

    if let Some(name) = msg.event_name() {
        // 이벤트 이름 안의 개행은 레코드를 깨뜨림
        let name: String = name.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        put_field(&mut buf, "event", &name);
    }
    for line in msg.payload.split('\n') {
        put_field(&mut buf, "data", line.strip_suffix('\r').unwrap_or(line));
    }
    buf.put_u8(b'\n');
    buf.freeze()
}

fn put_field(buf: &mut BytesMut, field: &str, value: &str) {
    buf.put_slice(field.as_bytes());
    buf.put_slice(b": ");
    buf.put_slice(value.as_bytes());
    buf.put_u8(b'\n');
}

// ----------------------------------------------------------------------------
// [EventStreamSender]
// ----------------------------------------------------------------------------

pub struct EventStreamSender<W: AsyncWrite + Unpin> {
    writer: BufWriter<W>,
    legacy: bool,
}

impl<W: AsyncWrite + Unpin> EventStreamSender<W> {
    pub fn new(writer: W, legacy: bool) -> Self {
        Self { writer: BufWriter::new(writer), legacy }
    }

    /// 200 상태줄 + Content-Type: text/event-stream
    pub async fn write_preamble(&mut self) -> std::io::Result<()> {
        self.writer.write_all(preamble(self.legacy).as_bytes()).await?;
        self.writer.flush().await
    }

    pub async fn send(&mut self, msg: &Message) -> std::io::Result<()> {
        let frame = encode_frame(msg, self.legacy);
        self.writer.write_all(&frame).await?;
        self.writer.flush().await
    }

    /// 쓰기 방향 종료 (FIN): 에러는 무시
    pub async fn shutdown(&mut self) {
        let _ = self.writer.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn legacy_frame_matches_original_bytes() {
        let plain = encode_frame(&Message::new("hello"), true);
        assert_eq!(&plain[..], b"data: hello\n");

        let named = encode_frame(&Message::new("hello").with_event("greet"), true);
        assert_eq!(&named[..], b"event: greet\ndata: hello\n");
    }

    #[test]
    fn standard_frame_ends_with_blank_line() {
        let frame = encode_frame(&Message::new("hello").with_event("greet"), false);
        assert_eq!(&frame[..], b"event: greet\ndata: hello\n\n");
    }

    #[test]
    fn standard_frame_splits_multiline_payload() {
        let frame = encode_frame(&Message::new("a\r\nb\nc"), false);
        assert_eq!(&frame[..], b"data: a\ndata: b\ndata: c\n\n");
    }

    #[test]
    fn empty_event_type_writes_no_event_line() {
        let frame = encode_frame(&Message::new("x").with_event(""), false);
        assert_eq!(&frame[..], b"data: x\n\n");
    }

    #[test]
    fn legacy_preamble_has_no_header_terminator() {
        assert!(!preamble(true).ends_with("\r\n\r\n"));
        assert!(preamble(false).ends_with("\r\n\r\n"));
        assert!(preamble(false).contains("Content-Type: text/event-stream"));
    }

    #[tokio::test]
    async fn sender_flushes_every_frame() {
        let (client, server) = tokio::io::duplex(1024);
        let mut sender = EventStreamSender::new(server, false);
        sender.write_preamble().await.unwrap();
        sender.send(&Message::new("®þæù€")).await.unwrap();
        sender.shutdown().await;
        drop(sender);

        let mut out = String::new();
        let mut client = client;
        client.read_to_string(&mut out).await.unwrap();
        assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(out.ends_with("data: ®þæù€\n\n"));
    }
}
