//! Timing report for a profiling run
//!
//! Wall-clock numbers are host-side and only meaningful as a sanity check;
//! the authoritative timeline is the trace recorded by the attached profiler.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::backend::{Device, Precision};
use crate::utils::error::Result;

/// Report of one profiling run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileReport {
    /// Pretrained model identifier
    pub model_id: String,

    /// Device the run executed on
    pub device: Device,

    /// Precision of the forward pass
    pub precision: Precision,

    /// Number of images in the batch
    pub num_images: usize,

    /// Batch shape `[images, channels, height, width]`
    pub batch_shape: [usize; 4],

    /// Annotated region name
    pub region: String,

    /// Wall time of each warm-up pass in milliseconds
    pub warmup_ms: Vec<f64>,

    /// Mean, min and max over the warm-up passes
    pub warmup_stats: WarmupStats,

    /// Wall time between the two barriers around the measured pass
    pub profiled_ms: f64,

    /// Device information
    pub device_info: DeviceInfo,

    /// Timestamp of when the run finished
    pub timestamp: String,
}

impl ProfileReport {
    /// Save the report as pretty JSON, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a report from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// One-line summary
    pub fn summary(&self) -> String {
        format!(
            "{} on {} ({}): {} image(s) {}x{} | warm-up mean {:.2} ms | profiled {:.2} ms",
            self.model_id,
            self.device,
            self.precision,
            self.num_images,
            self.batch_shape[3],
            self.batch_shape[2],
            self.warmup_stats.mean_ms,
            self.profiled_ms
        )
    }
}

/// Summary of the warm-up passes
///
/// Only a handful of passes run, and the first one carries lazy CUDA and
/// allocator initialisation, so the summary is mean, min and max with the
/// per-pass times kept next to it in the report.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WarmupStats {
    /// Mean wall time in milliseconds
    pub mean_ms: f64,
    /// Fastest pass
    pub min_ms: f64,
    /// Slowest pass, usually the first
    pub max_ms: f64,
}

impl WarmupStats {
    /// Summarise `durations`; empty input gives all zeros
    pub fn from_durations(durations: &[Duration]) -> Self {
        if durations.is_empty() {
            return Self::default();
        }

        let times_ms: Vec<f64> = durations.iter().map(|d| d.as_secs_f64() * 1000.0).collect();

        Self {
            mean_ms: times_ms.iter().sum::<f64>() / times_ms.len() as f64,
            min_ms: times_ms.iter().copied().fold(f64::INFINITY, f64::min),
            max_ms: times_ms.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

/// Device information
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeviceInfo {
    /// Device name as reported by the driver
    pub name: String,
    /// CUDA driver version (if applicable)
    pub driver_version: Option<String>,
    /// Total device memory in MB (if applicable)
    pub memory_total_mb: Option<f64>,
}

impl DeviceInfo {
    /// Detect information about `device`
    ///
    /// CUDA devices are queried through `nvidia-smi`; anything it cannot
    /// answer is left empty.
    pub fn detect(device: Device) -> Self {
        match device {
            Device::Cpu => Self {
                name: "CPU".to_string(),
                driver_version: None,
                memory_total_mb: None,
            },
            Device::Cuda(id) => query_nvidia_smi(id).unwrap_or_else(|| Self {
                name: format!("CUDA device {}", id),
                driver_version: None,
                memory_total_mb: None,
            }),
        }
    }
}

fn query_nvidia_smi(id: usize) -> Option<DeviceInfo> {
    let output = std::process::Command::new("nvidia-smi")
        .args([
            "--query-gpu=name,driver_version,memory.total",
            "--format=csv,noheader,nounits",
            &format!("--id={}", id),
        ])
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    parse_nvidia_smi_line(String::from_utf8_lossy(&output.stdout).trim())
}

/// Parse one `name, driver_version, memory.total` CSV line
fn parse_nvidia_smi_line(line: &str) -> Option<DeviceInfo> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();
    let name = parts.first().filter(|n| !n.is_empty())?;

    Some(DeviceInfo {
        name: name.to_string(),
        driver_version: parts.get(1).map(|v| v.to_string()),
        memory_total_mb: parts.get(2).and_then(|m| m.parse().ok()),
    })
}

/// Timer utility for passes
pub struct Timer {
    start: Instant,
    times: Vec<Duration>,
}

impl Timer {
    /// Create a new timer
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            times: Vec::new(),
        }
    }

    /// Start timing
    pub fn start(&mut self) {
        self.start = Instant::now();
    }

    /// Stop timing and record the duration
    pub fn stop(&mut self) -> Duration {
        let elapsed = self.start.elapsed();
        self.times.push(elapsed);
        elapsed
    }

    /// Get all recorded times
    pub fn times(&self) -> &[Duration] {
        &self.times
    }

    /// Get statistics from recorded times
    pub fn stats(&self) -> WarmupStats {
        WarmupStats::from_durations(&self.times)
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}
