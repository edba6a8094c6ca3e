//! VGGT inference profiling CLI
//!
//! Loads the VGGT-1B TorchScript export, runs the warm-up passes over the
//! example image set, then runs one measured pass between two device
//! synchronization barriers inside the `VGGT_Aggregator` region.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use vggt_profile::profiling::{NvtxProfiler, RegionProfiler};
use vggt_profile::runtime::torch::{TorchRuntime, TorchScriptProvider};
use vggt_profile::utils::logging::{init_logging, LogConfig};
use vggt_profile::{run_profile, ProfileConfig, TracingProfiler};

/// Profile VGGT-1B inference on CUDA
///
/// Run under Nsight Systems to capture the annotated forward pass, e.g.
/// `nsys profile --trace=cuda,nvtx vggt_profile`.
#[derive(Parser, Debug)]
#[command(name = "vggt_profile")]
#[command(version = vggt_profile::VERSION)]
#[command(about = "Warm up and profile VGGT-1B inference", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of input images
    #[arg(short, long)]
    image_dir: Option<PathBuf>,

    /// Directory holding TorchScript exports
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Number of warm-up passes
    #[arg(short, long)]
    warmup: Option<usize>,

    /// Run on the CPU in float32 when no CUDA device is available
    #[arg(long, default_value = "false")]
    cpu_fallback: bool,

    /// Write a JSON timing report to this path
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

impl Cli {
    fn profile_config(&self) -> Result<ProfileConfig> {
        let mut config = match &self.config {
            Some(path) => ProfileConfig::from_file(path)
                .with_context(|| format!("Failed to read config {:?}", path))?,
            None => ProfileConfig::default(),
        };

        if let Some(dir) = &self.image_dir {
            config.image_dir = dir.clone();
        }
        if let Some(dir) = &self.model_dir {
            config.model_dir = dir.clone();
        }
        if let Some(warmup) = self.warmup {
            config.warmup_iterations = warmup;
        }
        if self.cpu_fallback {
            config.backend.allow_cpu_fallback = true;
        }
        if let Some(path) = &self.report {
            config.report_path = Some(path.clone());
        }

        Ok(config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = if cli.verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    };

    let _ = init_logging(&log_config);

    print_banner();

    let config = cli.profile_config()?;

    profile(&config, &timeline_profiler())
}

/// Regions go to the log and to the Nsight Systems timeline
fn timeline_profiler() -> (TracingProfiler, NvtxProfiler) {
    (TracingProfiler::new(), NvtxProfiler::new())
}

fn profile<P: RegionProfiler>(config: &ProfileConfig, profiler: &P) -> Result<()> {
    println!("{}", "Profile Configuration:".cyan().bold());
    println!("  Model:     {}", config.model_id);
    println!("  Images:    {:?}", config.image_dir);
    println!("  Device:    {}", config.backend.device);
    println!("  Precision: {}", config.backend.precision);
    println!("  Warm-up:   {}", config.warmup_iterations);
    println!();

    let runtime = TorchRuntime::new(&config.backend).context("Failed to initialise libtorch")?;
    let provider = TorchScriptProvider::new(&config.model_dir);

    let outcome = run_profile(config, &runtime, &provider, profiler)
        .with_context(|| format!("Profiling {} failed", config.model_id))?;

    println!();
    println!("{}", "Profiling complete!".green().bold());
    println!("  {}", outcome.report.summary());
    if let Some(path) = &config.report_path {
        println!("  Report: {:?}", path);
    }

    Ok(())
}

fn print_banner() {
    println!(
        "{}",
        r#"
 ╔══════════════════════════════════════════════╗
 ║   VGGT-1B Inference Profiler                 ║
 ║   TorchScript + libtorch on CUDA             ║
 ╚══════════════════════════════════════════════╝
  "#
        .green()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;
    use vggt_profile::{Region, RegionColor};

    fn write_config(dir: &Path) -> PathBuf {
        let path = dir.join("profile.json");
        std::fs::write(
            &path,
            r#"{
                "image_dir": "from_file/images",
                "model_dir": "from_file/models",
                "warmup_iterations": 5
            }"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_no_arguments_use_defaults() {
        let cli = Cli::try_parse_from(["vggt_profile"]).unwrap();
        assert_eq!(cli.profile_config().unwrap(), ProfileConfig::default());
    }

    #[test]
    fn test_config_file_values_kept_without_flags() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path());

        let cli = Cli::try_parse_from(["vggt_profile", "--config", path.to_str().unwrap()]).unwrap();
        let config = cli.profile_config().unwrap();

        assert_eq!(config.image_dir, PathBuf::from("from_file/images"));
        assert_eq!(config.model_dir, PathBuf::from("from_file/models"));
        assert_eq!(config.warmup_iterations, 5);
        assert!(!config.backend.allow_cpu_fallback);
    }

    #[test]
    fn test_flags_override_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_config(temp_dir.path());

        let cli = Cli::try_parse_from([
            "vggt_profile",
            "--config",
            path.to_str().unwrap(),
            "--warmup",
            "1",
            "--image-dir",
            "cli/images",
            "--cpu-fallback",
            "--report",
            "out/report.json",
        ])
        .unwrap();
        let config = cli.profile_config().unwrap();

        assert_eq!(config.warmup_iterations, 1);
        assert_eq!(config.image_dir, PathBuf::from("cli/images"));
        assert_eq!(config.model_dir, PathBuf::from("from_file/models"));
        assert!(config.backend.allow_cpu_fallback);
        assert_eq!(config.report_path, Some(PathBuf::from("out/report.json")));
    }

    #[test]
    fn test_missing_config_file_fails() {
        let cli = Cli::try_parse_from(["vggt_profile", "--config", "no/such/profile.json"]).unwrap();
        assert!(cli.profile_config().is_err());
    }

    #[test]
    fn test_timeline_profiler_records_both_ranges() {
        let profiler = timeline_profiler();
        let region = Region::new("VGGT_Aggregator", RegionColor::Blue);
        {
            let _range = profiler.range(&region);
            assert_eq!(profiler.0.depth(), 1);
        }
        assert_eq!(profiler.0.depth(), 0);
    }
}
