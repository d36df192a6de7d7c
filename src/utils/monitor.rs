#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct PhaseStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub phase_time: Duration,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    last_phase: Instant,
    peak_memory_mb: u64,
}

/// Logs process resource usage at the end of each pipeline phase.
#[cfg(feature = "cli")]
pub struct RunMonitor {
    state: Option<Mutex<MonitorState>>,
    pid: Option<Pid>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
impl RunMonitor {
    pub fn new(enabled: bool) -> Self {
        let start_time = Instant::now();
        let pid = if enabled {
            match sysinfo::get_current_pid() {
                Ok(pid) => Some(pid),
                Err(e) => {
                    tracing::warn!("Run monitoring disabled: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let state = pid.map(|_| {
            Mutex::new(MonitorState {
                system: System::new(),
                last_phase: start_time,
                peak_memory_mb: 0,
            })
        });

        Self {
            state,
            pid,
            start_time,
        }
    }

    pub fn phase_stats(&self) -> Option<PhaseStats> {
        let pid = self.pid?;
        let mut state = self.state.as_ref()?.lock().ok()?;

        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        let process = state.system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;
        let cpu_usage = process.cpu_usage();

        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);
        let phase_time = state.last_phase.elapsed();
        state.last_phase = Instant::now();

        Some(PhaseStats {
            cpu_usage,
            memory_usage_mb: memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            phase_time,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.phase_stats() {
            tracing::info!(
                "{} took {:?} (CPU {:.1}%, memory {}MB, peak {}MB)",
                phase,
                stats.phase_time,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb
            );
        }
    }

    pub fn log_final(&self) {
        if let Some(stats) = self.phase_stats() {
            tracing::info!(
                "Run finished in {:?}, peak memory {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

#[cfg(feature = "cli")]
impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct RunMonitor;

#[cfg(not(feature = "cli"))]
impl RunMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_final(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = RunMonitor::new(false);
        assert!(!monitor.is_enabled());
        assert!(monitor.phase_stats().is_none());
    }

    #[test]
    fn test_enabled_monitor_tracks_peak_memory() {
        let monitor = RunMonitor::new(true);
        if let Some(stats) = monitor.phase_stats() {
            assert!(stats.peak_memory_mb >= stats.memory_usage_mb);
            assert!(stats.elapsed_time >= stats.phase_time);
        }
    }
}
