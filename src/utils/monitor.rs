#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
}

/// Logs memory and timing after each pipeline phase when enabled.
#[cfg(feature = "cli")]
pub struct RunMonitor {
    system: Option<System>,
    pid: Option<Pid>,
    start_time: Instant,
    phase_start: Instant,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            sysinfo::get_current_pid().ok()
        } else {
            None
        };
        if enabled && pid.is_none() {
            tracing::warn!("Could not determine current PID, monitoring disabled");
        }

        let now = Instant::now();
        Self {
            system: pid.map(|_| System::new()),
            pid,
            start_time: now,
            phase_start: now,
            peak_memory_mb: 0,
        }
    }

    fn sample(&mut self) -> Option<PhaseStats> {
        let pid = self.pid?;
        let system = self.system.as_mut()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        let memory_mb = system.process(pid)?.memory() / 1024 / 1024;
        self.peak_memory_mb = self.peak_memory_mb.max(memory_mb);

        let now = Instant::now();
        let stats = PhaseStats {
            memory_usage_mb: memory_mb,
            peak_memory_mb: self.peak_memory_mb,
            phase_time: now.duration_since(self.phase_start),
            elapsed_time: now.duration_since(self.start_time),
        };
        self.phase_start = now;
        Some(stats)
    }

    pub fn log_phase(&mut self, phase: &str) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 {} - Memory: {}MB, Peak: {}MB, Phase: {:?}, Total: {:?}",
                phase,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.phase_time,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&mut self) {
        if let Some(stats) = self.sample() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_some()
    }
}

// 為非CLI環境提供空實現
#[cfg(not(feature = "cli"))]
pub struct RunMonitor;

#[cfg(not(feature = "cli"))]
impl RunMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&mut self, _phase: &str) {}

    pub fn log_final_stats(&mut self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}
