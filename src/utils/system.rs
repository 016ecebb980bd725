#[cfg(feature = "cli")]
use sysinfo::{CpuRefreshKind, RefreshKind, System};

/// 偵測本機可用的 CPU 數量
#[cfg(feature = "cli")]
pub fn available_cpus() -> usize {
    let system =
        System::new_with_specifics(RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()));

    let cpus = system.cpus().len();
    if cpus == 0 {
        tracing::debug!("sysinfo reported no CPUs, falling back to std");
        return fallback_cpus();
    }
    cpus
}

// 為非CLI環境提供 std 實現
#[cfg(not(feature = "cli"))]
pub fn available_cpus() -> usize {
    fallback_cpus()
}

fn fallback_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
