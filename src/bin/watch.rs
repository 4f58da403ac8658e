// ssewatch: 공개 스트림에 구독자로 붙어 수신 이벤트를 출력하는 CLI
//
// 사용법:
//   ssewatch [--host HOST] [--port PORT] [--legacy] <CLIENT_ID>
//
// 예시:
//   ssewatch dashboard-1
//   ssewatch --host 192.168.1.10 --port 8888 "®þæù€"

use chrono::Local;
use clap::Parser;
use colored::Colorize;
use reqwest::blocking::Client;
use std::io::{BufRead, BufReader};

#[derive(Parser)]
#[command(
    name    = "ssewatch",
    about   = "sse-hub 구독 스트림 관찰",
    version,
)]
struct Cli {
    /// 서버 호스트
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// 공개 스트리밍 포트
    #[arg(long, default_value_t = 8888)]
    port: u16,

    /// 서버가 legacy_framing으로 동작 중 (레코드 구분 빈 줄 없음, data 한 줄 = 레코드 1개)
    #[arg(long)]
    legacy: bool,

    /// 구독에 사용할 client id
    client_id: String,
}

// ----------------------------------------------------------------------------
// [레코드 조립] event:/data: 줄을 빈 줄까지 모아 레코드 1개로
// ----------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
struct Record {
    event: Option<String>,
    data:  String,
}

#[derive(Default)]
struct RecordAssembler {
    legacy: bool,
    event:  Option<String>,
    data:   Vec<String>,
}

impl RecordAssembler {
    fn new(legacy: bool) -> Self {
        Self { legacy, ..Self::default() }
    }

    /// 줄 끝 개행이 제거된 한 줄을 넣고, 레코드가 완성되면 반환
    fn push_line(&mut self, line: &str) -> Option<Record> {
        if line.is_empty() {
            return self.finish();
        }
        if let Some(name) = line.strip_prefix("event:") {
            self.event = Some(name.strip_prefix(' ').unwrap_or(name).to_string());
        } else if let Some(data) = line.strip_prefix("data:") {
            self.data.push(data.strip_prefix(' ').unwrap_or(data).to_string());
            if self.legacy {
                return self.finish();
            }
        }
        // 주석(':'), id:, retry: 등은 무시
        None
    }

    /// 모인 data가 있으면 레코드로 내보냄. 없으면 event만 버림
    fn finish(&mut self) -> Option<Record> {
        if self.data.is_empty() {
            self.event = None;
            return None;
        }
        Some(Record {
            event: self.event.take(),
            data:  std::mem::take(&mut self.data).join("\n"),
        })
    }
}

fn main() {
    let cli = Cli::parse();
    let url = format!("http://{}:{}/{}", cli.host, cli.port, urlencoding::encode(&cli.client_id));

    println!("{}", "─".repeat(72).dimmed());
    println!("  {} {}  {}", "ssewatch".bold().cyan(), "▶".green(), url.dimmed());
    println!("{}", "─".repeat(72).dimmed());

    let client = Client::builder()
        .timeout(None) // 스트림이라 타임아웃 없음
        .build()
        .unwrap_or_else(|e| {
            eprintln!("{} reqwest client 생성 실패: {}", "✗".red(), e);
            std::process::exit(1);
        });

    let resp = match client.get(&url).header("Accept", "text/event-stream").send() {
        Ok(r)  => r,
        Err(e) => {
            eprintln!("{} 서버 연결 실패: {}", "✗".red(), e);
            eprintln!("  서버가 실행 중인지 확인하세요: {}", url.dimmed());
            std::process::exit(1);
        }
    };

    if !resp.status().is_success() {
        // 404: id 없음 또는 이미 사용 중
        eprintln!("{} HTTP {}", "✗".red(), resp.status());
        std::process::exit(1);
    }

    let reader = BufReader::new(resp);
    let mut assembler = RecordAssembler::new(cli.legacy);
    let mut record_count: u64 = 0;

    for line in reader.lines() {
        let line = match line {
            Ok(l)  => l,
            Err(e) => {
                eprintln!("{} 스트림 읽기 실패: {}", "✗".red(), e);
                break;
            }
        };

        if let Some(record) = assembler.push_line(&line) {
            print_record(&record);
            record_count += 1;
        }
    }
    // 빈 줄 없이 끊긴 마지막 레코드
    if let Some(record) = assembler.finish() {
        print_record(&record);
        record_count += 1;
    }

    println!("{}", "─".repeat(72).dimmed());
    println!("  스트림 종료 (총 {} 레코드)", record_count);
}

fn print_record(record: &Record) {
    let time_str = Local::now().format("%H:%M:%S%.3f").to_string();
    let event_str = match record.event.as_deref().filter(|name| !name.is_empty()) {
        Some(name) => format!("{:<16}", name).bright_yellow().to_string(),
        None       => format!("{:<16}", "message").dimmed().to_string(),
    };
    // 여러 줄 payload는 이어지는 줄을 들여써서 출력
    let indent = format!("\n{}", " ".repeat(32));
    println!("  {} {} {}", time_str.dimmed(), event_str, record.data.replace('\n', &indent));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(assembler: &mut RecordAssembler, lines: &[&str]) -> Vec<Record> {
        lines.iter().filter_map(|line| assembler.push_line(line)).collect()
    }

    #[test]
    fn multiline_payload_is_one_record() {
        let mut asm = RecordAssembler::new(false);
        let records = feed(&mut asm, &["event: greet", "data: a", "data: b", "data: c", "", "data: next", ""]);
        assert_eq!(records, vec![
            Record { event: Some("greet".into()), data: "a\nb\nc".into() },
            Record { event: None, data: "next".into() },
        ]);
    }

    #[test]
    fn legacy_data_line_is_a_record() {
        let mut asm = RecordAssembler::new(true);
        let records = feed(&mut asm, &["event: tick", "data: 1", "data: 2"]);
        assert_eq!(records, vec![
            Record { event: Some("tick".into()), data: "1".into() },
            Record { event: None, data: "2".into() },
        ]);
    }

    #[test]
    fn unterminated_record_is_flushed_at_end() {
        let mut asm = RecordAssembler::new(false);
        assert!(feed(&mut asm, &["data: tail"]).is_empty());
        assert_eq!(asm.finish(), Some(Record { event: None, data: "tail".into() }));
        assert_eq!(asm.finish(), None);
    }

    #[test]
    fn event_without_data_is_dropped() {
        let mut asm = RecordAssembler::new(false);
        let records = feed(&mut asm, &["event: lonely", "", ": comment", "data: x", ""]);
        assert_eq!(records, vec![Record { event: None, data: "x".into() }]);
    }
}
