use std::fmt;

#[derive(Debug)]
pub enum HubError {
    EmptyId,
    DuplicateId(String),
    ClientNotFound(String),
    MethodNotAllowed(String),
    InvalidBody(String),
    BadRequestHead(String),
    RequestTimeout,
    RegistryClosed,
    Config(String),
    IoError(std::io::Error),
}

impl fmt::Display for HubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HubError::EmptyId               => write!(f, "no identifier provided"),
            HubError::DuplicateId(id)       => write!(f, "Client {} already exists", id),
            HubError::ClientNotFound(id)    => write!(f, "Client {} not found", id),
            HubError::MethodNotAllowed(m)   => write!(f, "Only POST request accepted (got {})", m),
            HubError::InvalidBody(msg)      => write!(f, "Unable to decode json: {}", msg),
            HubError::BadRequestHead(msg)   => write!(f, "Malformed request: {}", msg),
            HubError::RequestTimeout        => write!(f, "Request head not received in time"),
            HubError::RegistryClosed        => write!(f, "Client registry is not running"),
            HubError::Config(msg)           => write!(f, "{}", msg),
            HubError::IoError(err)          => write!(f, "Network I/O error: {}", err),
        }
    }
}

impl std::error::Error for HubError {}

impl From<std::io::Error> for HubError {
    fn from(err: std::io::Error) -> Self {
        HubError::IoError(err)
    }
}

impl HubError {
    /// HubError → HTTP 상태 코드
    /// 중복 id 구독도 기존 프로토콜대로 404로 응답
    pub fn status_code(&self) -> u16 {
        match self {
            HubError::EmptyId
            | HubError::DuplicateId(_)
            | HubError::ClientNotFound(_)   => 404,
            HubError::MethodNotAllowed(_)   => 403,
            HubError::InvalidBody(_)
            | HubError::BadRequestHead(_)   => 400,
            HubError::RequestTimeout        => 408,
            HubError::RegistryClosed
            | HubError::Config(_)
            | HubError::IoError(_)          => 500,
        }
    }
}

pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(HubError::EmptyId.status_code(), 404);
        assert_eq!(HubError::DuplicateId("a".into()).status_code(), 404);
        assert_eq!(HubError::ClientNotFound("a".into()).status_code(), 404);
        assert_eq!(HubError::MethodNotAllowed("GET".into()).status_code(), 403);
        assert_eq!(HubError::InvalidBody("eof".into()).status_code(), 400);
        assert_eq!(HubError::RequestTimeout.status_code(), 408);
        assert_eq!(HubError::RegistryClosed.status_code(), 500);
    }

    #[test]
    fn not_found_message_names_client() {
        assert_eq!(HubError::ClientNotFound("123".into()).to_string(), "Client 123 not found");
    }
}
