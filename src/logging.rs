// 로그 출력 대상 선택 + tracing 구독자 초기화
//
// "stdout" | "stderr" | 그 외는 파일 경로 (append)
// 레벨은 RUST_LOG로 조정, 기본 info

use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

use crate::error::{HubError, HubResult};

pub fn init_logging(destination: &str) -> HubResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match destination {
        "stdout" => builder.with_writer(std::io::stdout).try_init(),
        "stderr" => builder.with_writer(std::io::stderr).try_init(),
        path => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| HubError::Config(format!("Error opening log file {}: {}", path, e)))?;
            builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
        }
    };

    result.map_err(|e| HubError::Config(format!("Error installing logger: {}", e)))
}
