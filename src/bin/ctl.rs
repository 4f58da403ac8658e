// ssectl: sse-hub 내부 API 운영 CLI
//
// 사용법:
//   ssectl [--host HOST] [--port PORT] <COMMAND>
//
// 조회 명령
//   ssectl status                              허브 상태 요약 (uptime, 구독자 수)
//   ssectl clients                             구독자 id 테이블
//
// 조작 명령
//   ssectl push --id ID --data TEXT [--event NAME]
//   ssectl broadcast --data TEXT [--event NAME]
//   ssectl close --id ID

use clap::{Parser, Subcommand};
use colored::Colorize;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tabled::{Table, Tabled};

// ----------------------------------------------------------------------------
// [CLI 정의]
// ----------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name    = "ssectl",
    about   = "sse-hub 운영 관리 CLI",
    version,
)]
struct Cli {
    /// 서버 호스트
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 내부 API 포트
    #[arg(long, default_value_t = 8889)]
    port: u16,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// 허브 상태 요약
    Status,

    /// 등록된 구독자 목록
    Clients,

    /// 구독자 1명에게 전송
    Push {
        #[arg(long)]
        id: String,
        #[arg(long)]
        data: String,
        /// 이벤트 이름
        #[arg(long)]
        event: Option<String>,
    },

    /// 전체 구독자에게 전송
    Broadcast {
        #[arg(long)]
        data: String,
        #[arg(long)]
        event: Option<String>,
    },

    /// 구독 강제 종료
    Close {
        #[arg(long)]
        id: String,
    },
}

// ----------------------------------------------------------------------------
// [응답 타입]: src/http/dto.rs 와 대응
// ----------------------------------------------------------------------------

#[derive(Deserialize)]
struct HubStatus {
    uptime_secs:  u64,
    client_count: usize,
    version:      String,
}

#[derive(Tabled)]
struct ClientRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "CLIENT ID")]
    id:    String,
}

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ----------------------------------------------------------------------------
// [main]
// ----------------------------------------------------------------------------

fn main() {
    let cli = Cli::parse();
    let base = format!("http://{}:{}", cli.host, cli.port);

    let result = match &cli.command {
        Command::Status                       => cmd_status(&base),
        Command::Clients                      => cmd_clients(&base),
        Command::Push { id, data, event }     => cmd_push(&base, id, data, event.as_deref()),
        Command::Broadcast { data, event }    => cmd_push(&base, "", data, event.as_deref()),
        Command::Close { id }                 => cmd_close(&base, id),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "ERROR:".red().bold(), e);
        std::process::exit(1);
    }
}

// ----------------------------------------------------------------------------
// [커맨드 구현]
// ----------------------------------------------------------------------------

fn cmd_status(base: &str) -> CmdResult {
    let s: HubStatus = get_json(&format!("{}/status", base))?;

    let hours   = s.uptime_secs / 3600;
    let minutes = (s.uptime_secs % 3600) / 60;
    let secs    = s.uptime_secs % 60;

    println!();
    println!("{}", format!("  sse-hub {} Status", s.version).bold().cyan());
    println!("  {}", "─".repeat(36).dimmed());
    println!("  {:16} {}",
        "Uptime:".bold(),
        format!("{}h {}m {}s", hours, minutes, secs).green()
    );
    println!("  {:16} {}", "Clients:".bold(), s.client_count.to_string().yellow());
    println!();
    Ok(())
}

fn cmd_clients(base: &str) -> CmdResult {
    let ids: Vec<String> = get_json(&format!("{}/clients", base))?;

    if ids.is_empty() {
        println!("{}", "  접속 중인 구독자 없음".dimmed());
        return Ok(());
    }

    let rows: Vec<ClientRow> = ids
        .into_iter()
        .enumerate()
        .map(|(i, id)| ClientRow { index: i + 1, id })
        .collect();

    println!();
    println!("{}", Table::new(&rows));
    println!("  {} client(s)", rows.len());
    println!();
    Ok(())
}

fn cmd_push(base: &str, id: &str, data: &str, event: Option<&str>) -> CmdResult {
    let body = json!({ "id": id, "data": data, "event": event });
    post_json(&format!("{}/message", base), &body)?;

    let target = if id.is_empty() { "all clients".to_string() } else { id.to_string() };
    println!("{} sent {} characters to {}", "✓".green(), data.chars().count(), target.bold());
    Ok(())
}

fn cmd_close(base: &str, id: &str) -> CmdResult {
    post_json(&format!("{}/close", base), &json!({ "id": id }))?;
    println!("{} close requested for {}", "✓".green(), id.bold());
    Ok(())
}

// ----------------------------------------------------------------------------
// [HTTP 유틸]
// ----------------------------------------------------------------------------

fn get_json<T: for<'de> Deserialize<'de>>(url: &str) -> Result<T, Box<dyn std::error::Error>> {
    let resp = Client::new().get(url).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {}: {}", status, resp.text().unwrap_or_default().trim()).into());
    }
    Ok(resp.json::<T>()?)
}

fn post_json(url: &str, body: &serde_json::Value) -> CmdResult {
    let resp = Client::new().post(url).json(body).send()?;
    let status = resp.status();
    if !status.is_success() {
        return Err(format!("HTTP {}: {}", status, resp.text().unwrap_or_default().trim()).into());
    }
    Ok(())
}
