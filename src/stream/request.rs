// 구독 요청 헤더 파싱 + 경로에서 client id 추출
//
// 헤더 블록(빈 줄까지)만 읽어 httparse로 해석한다. 빈 줄 뒤 바이트는 reader에 그대로 남는다.
// 요청 대상은 origin-form("/alice")과 프록시가 보내는 absolute-form("http://host/alice") 모두 허용

use axum::http::Uri;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

use crate::error::{HubError, HubResult};

/// 요청당 허용 헤더 수
const MAX_HEADERS: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestHead {
    pub method: String,
    pub uri:    Uri,
}

impl RequestHead {
    /// 스킴/authority/쿼리를 제외한 경로
    pub fn path(&self) -> &str {
        self.uri.path()
    }
}

/// 요청줄 + 헤더를 빈 줄까지 소비. 헤더 값은 쓰지 않는다.
/// max_bytes를 넘기거나 빈 줄 전에 EOF, 또는 문법 오류면 BadRequestHead
pub async fn read_request_head<R>(reader: &mut R, max_bytes: usize) -> HubResult<RequestHead>
where
    R: AsyncBufRead + Unpin,
{
    let mut limited = (&mut *reader).take(max_bytes as u64);
    let mut raw = Vec::with_capacity(512);

    loop {
        let start = raw.len();
        let n = limited
            .read_until(b'\n', &mut raw)
            .await
            .map_err(|e| HubError::BadRequestHead(e.to_string()))?;

        if n == 0 {
            return Err(HubError::BadRequestHead("incomplete request head".to_string()));
        }
        let line = &raw[start..];
        if line == b"\r\n" || line == b"\n" {
            break;
        }
    }

    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut req = httparse::Request::new(&mut headers);
    match req.parse(&raw) {
        Ok(httparse::Status::Complete(_)) => {}
        Ok(httparse::Status::Partial) => {
            return Err(HubError::BadRequestHead("incomplete request head".to_string()));
        }
        Err(e) => return Err(HubError::BadRequestHead(e.to_string())),
    }

    let method = req.method.unwrap_or_default().to_string();
    let target = req.path.unwrap_or_default();
    let uri = target
        .parse::<Uri>()
        .map_err(|e| HubError::BadRequestHead(format!("bad request target {}: {}", target, e)))?;

    Ok(RequestHead { method, uri })
}

/// 경로의 첫 번째 세그먼트 (선행 '/' 다음). 디코딩 후 분리하며 세그먼트가 없으면 빈 문자열.
///   "/123"          → "123"
///   "/abc/def"      → "abc"
///   "/%C2%AE%C3%BE" → "®þ"
///   "/"             → ""
pub fn client_id(path: &str) -> String {
    let decoded = urlencoding::decode(path)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| path.to_string());

    match decoded.strip_prefix('/') {
        Some(rest) => rest.split('/').next().unwrap_or("").to_string(),
        None => String::new(),
    }
}
