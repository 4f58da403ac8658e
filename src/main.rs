use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use sse_hub::config::HubConfig;
use sse_hub::logging::init_logging;
use sse_hub::run_server;

#[derive(Parser)]
#[command(name = "ssehub", about = "SSE broadcast hub", version)]
struct Cli {
    /// JSON 설정 파일 (생략 시 기본값)
    #[arg(long)]
    config: Option<PathBuf>,

    /// 구독자 스트리밍 리스너 (예: ":8888")
    #[arg(long)]
    listen_public: Option<String>,

    /// 내부 push API 리스너 (예: "127.0.0.1:8889")
    #[arg(long)]
    listen_internal: Option<String>,

    /// 로그 출력: stdout | stderr | 파일 경로
    #[arg(long)]
    log: Option<String>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match HubConfig::from_file(path) {
            Ok(c)  => c,
            Err(e) => {
                eprintln!("{}", e);
                std::process::exit(1);
            }
        },
        None => HubConfig::default(),
    };
    if let Some(addr) = cli.listen_public   { config.listen_public = addr; }
    if let Some(addr) = cli.listen_internal { config.listen_internal = addr; }
    if let Some(log) = cli.log              { config.log = log; }

    if let Err(e) = init_logging(&config.log) {
        eprintln!("{}", e);
        std::process::exit(1);
    }

    if let Err(e) = run_server(config).await {
        error!("[sse-hub] {}", e);
        std::process::exit(1);
    }
}
