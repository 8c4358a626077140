//! Host metrics sampling

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::Serialize;
use sysinfo::{Cpu, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::error::CollectorError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LoadAverage {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// Cumulative network counters summed over every interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NetworkTotals {
    pub bytes_received: u64,
    pub bytes_sent: u64,
    pub packets_received: u64,
    pub packets_sent: u64,
}

/// Disk figures for one mount point, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiskUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
}

/// One immutable reading of the host.
///
/// Produced whole by [`MetricsCollector::sample`]; never patched afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemSnapshot {
    pub hostname: String,
    pub kernel_version: String,
    pub architecture: String,
    pub uptime: Duration,
    pub cpu_percent: f32,
    pub cpu_count: usize,
    pub cpu_frequency_mhz: u64,
    pub load_average: LoadAverage,
    pub memory_total: u64,
    pub memory_used: u64,
    pub memory_available: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub mount_point: PathBuf,
    pub disk_total: u64,
    pub disk_used: u64,
    pub disk_free: u64,
    pub network: NetworkTotals,
    pub taken_at: DateTime<Local>,
}

impl SystemSnapshot {
    pub fn memory_percent(&self) -> f64 {
        crate::utils::percent_of(self.memory_used, self.memory_total)
    }

    pub fn swap_percent(&self) -> f64 {
        crate::utils::percent_of(self.swap_used, self.swap_total)
    }

    pub fn disk_percent(&self) -> f64 {
        crate::utils::percent_of(self.disk_used, self.disk_total)
    }
}

struct HostIdentity {
    hostname: String,
    kernel_version: String,
    architecture: String,
}

/// Samples CPU, memory, disk, load and network counters.
///
/// The CPU figure is a delta, so the collector remembers when it last
/// sampled. That instant belongs to this instance only.
pub struct MetricsCollector {
    system: System,
    mount_point: PathBuf,
    last_sample: Option<Instant>,
}

impl MetricsCollector {
    pub fn new(mount_point: impl Into<PathBuf>) -> Self {
        Self {
            system: System::new(),
            mount_point: mount_point.into(),
            last_sample: None,
        }
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn sample(&mut self) -> Result<SystemSnapshot, CollectorError> {
        self.sample_at(Instant::now())
    }

    /// Sample with an explicit "now".
    ///
    /// If `now` is not after the previous sample the CPU percentage is 0.
    pub fn sample_at(&mut self, now: Instant) -> Result<SystemSnapshot, CollectorError> {
        let identity = read_identity()?;
        let disk = disk_usage(&self.mount_point)?;

        let cpu_percent = self.measure_cpu(now);

        self.system.refresh_memory();
        let memory_total = self.system.total_memory();
        if memory_total == 0 {
            return Err(CollectorError::Unavailable("memory"));
        }
        // Clamp: some kernels report used slightly above total during reclaim
        let memory_used = self.system.used_memory().min(memory_total);
        let memory_available = self.system.available_memory().min(memory_total);
        let swap_total = self.system.total_swap();
        let swap_used = self.system.used_swap().min(swap_total);

        let cpus = self.system.cpus();
        let cpu_count = cpus.len();
        let cpu_frequency_mhz = cpus.first().map(Cpu::frequency).unwrap_or(0);

        let load = System::load_average();

        Ok(SystemSnapshot {
            hostname: identity.hostname,
            kernel_version: identity.kernel_version,
            architecture: identity.architecture,
            uptime: Duration::from_secs(System::uptime()),
            cpu_percent,
            cpu_count,
            cpu_frequency_mhz,
            load_average: LoadAverage {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
            memory_total,
            memory_used,
            memory_available,
            swap_total,
            swap_used,
            mount_point: self.mount_point.clone(),
            disk_total: disk.total,
            disk_used: disk.used,
            disk_free: disk.free,
            network: network_totals(),
            taken_at: Local::now(),
        })
    }

    fn measure_cpu(&mut self, now: Instant) -> f32 {
        match self.last_sample {
            None => {
                // First call has no baseline: take a short blocking measurement
                self.system.refresh_cpu_all();
                std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
                self.system.refresh_cpu_all();
                self.last_sample = Some(Instant::now());
            }
            Some(previous) => {
                let elapsed = now.checked_duration_since(previous).unwrap_or_default();
                if elapsed.is_zero() {
                    return 0.0;
                }
                self.system.refresh_cpu_all();
                self.last_sample = Some(now);
            }
        }

        let usages: Vec<f32> = self.system.cpus().iter().map(Cpu::cpu_usage).collect();
        average_usage(&usages)
    }
}

/// Mean of per-core usages, ignoring NaN readings
fn average_usage(usages: &[f32]) -> f32 {
    let valid: Vec<f32> = usages.iter().copied().filter(|u| u.is_finite()).collect();
    if valid.is_empty() {
        return 0.0;
    }
    (valid.iter().sum::<f32>() / valid.len() as f32).clamp(0.0, 100.0)
}

fn read_identity() -> Result<HostIdentity, CollectorError> {
    let uts = nix::sys::utsname::uname().map_err(CollectorError::Identity)?;
    Ok(HostIdentity {
        hostname: uts.nodename().to_string_lossy().into_owned(),
        kernel_version: uts.release().to_string_lossy().into_owned(),
        architecture: uts.machine().to_string_lossy().into_owned(),
    })
}

/// Disk usage for the filesystem holding `path` (statvfs).
pub fn disk_usage(path: &Path) -> Result<DiskUsage, CollectorError> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|source| CollectorError::Disk {
        path: path.to_path_buf(),
        source,
    })?;
    let fragment = u64::from(stat.fragment_size());
    let blocks = u64::from(stat.blocks());
    let blocks_free = u64::from(stat.blocks_free()).min(blocks);

    Ok(DiskUsage {
        total: blocks.saturating_mul(fragment),
        used: (blocks - blocks_free).saturating_mul(fragment),
        free: u64::from(stat.blocks_available()).saturating_mul(fragment),
    })
}

fn network_totals() -> NetworkTotals {
    let networks = Networks::new_with_refreshed_list();
    networks
        .list()
        .values()
        .fold(NetworkTotals::default(), |acc, data| NetworkTotals {
            bytes_received: acc.bytes_received.saturating_add(data.total_received()),
            bytes_sent: acc.bytes_sent.saturating_add(data.total_transmitted()),
            packets_received: acc
                .packets_received
                .saturating_add(data.total_packets_received()),
            packets_sent: acc
                .packets_sent
                .saturating_add(data.total_packets_transmitted()),
        })
}
