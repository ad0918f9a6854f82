//! Optional resource logging for `--monitor`: process memory and CPU at the
//! end of each pipeline phase, plus how long that phase took.

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy)]
pub struct PhaseStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub phase_time: Duration,
    pub total_time: Duration,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    peak_memory_mb: u64,
    last_checkpoint: Instant,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    label: String,
    pid: Option<Pid>,
    started: Instant,
    state: Option<Mutex<MonitorState>>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(label: &str, enabled: bool) -> Self {
        let pid = if enabled {
            sysinfo::get_current_pid()
                .map_err(|e| tracing::warn!("Resource monitoring unavailable: {}", e))
                .ok()
        } else {
            None
        };

        let started = Instant::now();
        let state = pid.map(|_| {
            Mutex::new(MonitorState {
                system: System::new(),
                peak_memory_mb: 0,
                last_checkpoint: started,
            })
        });

        Self {
            label: label.to_string(),
            pid,
            started,
            state,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }

    /// Samples this process and starts timing the next phase.
    pub fn checkpoint(&self) -> Option<PhaseStats> {
        let pid = self.pid?;
        let mut state = self.state.as_ref()?.lock().ok()?;

        state.system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory().with_cpu(),
        );
        let process = state.system.process(pid)?;
        let cpu_usage = process.cpu_usage();
        let memory_mb = process.memory() / 1024 / 1024;

        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);
        let now = Instant::now();
        let phase_time = now - state.last_checkpoint;
        state.last_checkpoint = now;

        Some(PhaseStats {
            cpu_usage,
            memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            phase_time,
            total_time: now - self.started,
        })
    }

    pub fn log_phase(&self, phase: &str) {
        if let Some(stats) = self.checkpoint() {
            tracing::info!(
                "📊 {} {}: {:?}, CPU {:.1}%, memory {}MB",
                self.label,
                phase,
                stats.phase_time,
                stats.cpu_usage,
                stats.memory_mb
            );
        }
    }

    pub fn log_summary(&self) {
        if let Some(stats) = self.checkpoint() {
            tracing::info!(
                "📊 {} finished in {:?}, peak memory {}MB",
                self.label,
                stats.total_time,
                stats.peak_memory_mb
            );
        }
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_label: &str, _enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_phase(&self, _phase: &str) {}

    pub fn log_summary(&self) {}
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new("prepare", false);
        assert!(!monitor.is_enabled());
        assert!(monitor.checkpoint().is_none());
    }

    #[test]
    fn test_checkpoints_track_peak_memory() {
        let monitor = SystemMonitor::new("overlap", true);
        if !monitor.is_enabled() {
            return;
        }

        let first = monitor.checkpoint().unwrap();
        let second = monitor.checkpoint().unwrap();

        assert!(second.peak_memory_mb >= first.memory_mb);
        assert!(second.total_time >= first.total_time);
    }
}
