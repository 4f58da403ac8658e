// 운영자 시그널(SIGUSR1 / SIGUSR2) 수신 시 허브 통계 덤프
//
// 레지스트리에서 쓰는 것은 count() 하나뿐이다.

use std::fmt::Write as _;
use std::sync::Arc;
use tracing::info;

use crate::config::HubConfig;
use crate::core::RegistryHandle;
use crate::error::HubResult;
use crate::utils::uptime_secs;

#[derive(Debug, Clone)]
pub struct HubStats {
    pub client_count: usize,
    pub uptime_secs:  u64,
    pub version:      &'static str,
    pub workers:      usize,
    pub alive_tasks:  usize,
}

pub async fn collect_stats(registry: &RegistryHandle, start_time_ms: u64) -> HubResult<HubStats> {
    let client_count = registry.count().await?;
    let metrics = tokio::runtime::Handle::current().metrics();
    Ok(HubStats {
        client_count,
        uptime_secs: uptime_secs(start_time_ms),
        version:     env!("CARGO_PKG_VERSION"),
        workers:     metrics.num_workers(),
        alive_tasks: metrics.num_alive_tasks(),
    })
}

pub fn render_stats(stats: &HubStats, config: &HubConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Clients count\t: {}", stats.client_count);
    let _ = writeln!(out, "Version\t\t: {}", stats.version);
    let _ = writeln!(out, "Uptime\t\t: {} s", stats.uptime_secs);
    let _ = writeln!(out, "Workers\t\t: {}", stats.workers);
    let _ = writeln!(out, "Alive tasks\t: {}", stats.alive_tasks);
    let _ = writeln!(out, "Config :\n{}", config.pretty());
    out
}

#[cfg(unix)]
pub async fn run_signal_dumper(
    registry:      RegistryHandle,
    config:        Arc<HubConfig>,
    start_time_ms: u64,
) -> HubResult<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    info!("[diag] Listening for SIGUSR1 / SIGUSR2");

    loop {
        let name = tokio::select! {
            _ = usr1.recv() => "SIGUSR1",
            _ = usr2.recv() => "SIGUSR2",
        };
        info!("[diag] Received signal: {}", name);

        let stats = collect_stats(&registry, start_time_ms).await?;
        info!("[diag] Stats : \n{}", render_stats(&stats, &config));
    }
}

#[cfg(not(unix))]
pub async fn run_signal_dumper(
    _registry:      RegistryHandle,
    _config:        Arc<HubConfig>,
    _start_time_ms: u64,
) -> HubResult<()> {
    Ok(())
}
