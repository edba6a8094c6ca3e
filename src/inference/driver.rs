//! Profiling driver
//!
//! Loads the model and the image batch, runs the warm-up passes, then runs
//! the measured pass between two full synchronization barriers. Every pass
//! goes through `InferenceSession::run_inference`, which disables gradient
//! tracking, enables autocast and wraps the forward call in the annotation
//! region.

use std::time::Instant;

use tracing::{debug, info};

use super::report::{DeviceInfo, ProfileReport, Timer};
use super::{PROFILED_RUN_MESSAGE, WARMUP_MESSAGE};
use crate::backend::Precision;
use crate::config::ProfileConfig;
use crate::dataset::{collect_image_paths, load_and_preprocess_images};
use crate::profiling::{Region, RegionProfiler};
use crate::runtime::{InferenceModel, ModelProvider, Runtime};
use crate::utils::error::{ProfileError, Result};

/// Output type of the model a provider loads for a runtime
pub type ModelOutput<R, Prov> =
    <<Prov as ModelProvider<R>>::Model as InferenceModel<<R as Runtime>::Tensor>>::Output;

/// A loaded model, its device-resident batch, and the region around each call
pub struct InferenceSession<'a, R: Runtime, M, P> {
    runtime: &'a R,
    model: M,
    images: R::Tensor,
    profiler: &'a P,
    region: Region,
    precision: Precision,
}

impl<'a, R, M, P> InferenceSession<'a, R, M, P>
where
    R: Runtime,
    M: InferenceModel<R::Tensor>,
    P: RegionProfiler,
{
    pub fn new(
        runtime: &'a R,
        model: M,
        images: R::Tensor,
        profiler: &'a P,
        region: Region,
    ) -> Self {
        Self {
            runtime,
            model,
            images,
            profiler,
            precision: runtime.precision(),
            region,
        }
    }

    /// One forward pass: no-grad, then autocast, then the annotated region
    pub fn run_inference(&self) -> Result<M::Output> {
        let _no_grad = self.runtime.no_grad();
        self.runtime.autocast(self.precision, || {
            let _range = self.profiler.range(&self.region);
            self.model.forward(&self.images)
        })
    }
}

/// Predictions of the measured pass and the timing report
#[derive(Debug)]
pub struct ProfileOutcome<O> {
    pub predictions: O,
    pub report: ProfileReport,
}

/// Run the full profiling sequence described by `config`
///
/// The runtime is already bound to its device. Any failure aborts the run;
/// an image directory without matching files fails before the first
/// inference call.
pub fn run_profile<R, Prov, P>(
    config: &ProfileConfig,
    runtime: &R,
    provider: &Prov,
    profiler: &P,
) -> Result<ProfileOutcome<ModelOutput<R, Prov>>>
where
    R: Runtime,
    Prov: ModelProvider<R>,
    P: RegionProfiler,
{
    config.validate()?;

    let device = runtime.device();
    let precision = runtime.precision();
    info!("Profiling {} on {} ({})", config.model_id, device, precision);

    let model = provider.load(&config.model_id, runtime)?;

    let paths = collect_image_paths(&config.image_dir, &config.image_extensions)?;
    if paths.is_empty() {
        return Err(ProfileError::NoImages {
            dir: config.image_dir.clone(),
            extensions: config.image_extensions.clone(),
        });
    }

    let batch = load_and_preprocess_images(&paths, config.preprocess_mode, config.target_size)?;
    let images = runtime.upload(&batch)?;
    info!("Image batch {:?} on {}", batch.shape(), device);

    let session = InferenceSession::new(runtime, model, images, profiler, config.region.clone());

    println!("{}", WARMUP_MESSAGE);
    let mut timer = Timer::new();
    for i in 0..config.warmup_iterations {
        timer.start();
        session.run_inference()?;
        let elapsed = timer.stop();
        debug!(
            "Warm-up pass {}/{} issued in {:.2} ms",
            i + 1,
            config.warmup_iterations,
            elapsed.as_secs_f64() * 1000.0
        );
    }

    println!("{}", PROFILED_RUN_MESSAGE);
    runtime.synchronize()?;
    let start = Instant::now();
    let predictions = session.run_inference()?;
    runtime.synchronize()?;
    let profiled = start.elapsed();

    let report = ProfileReport {
        model_id: config.model_id.clone(),
        device,
        precision,
        num_images: batch.len(),
        batch_shape: batch.shape(),
        region: config.region.name.clone(),
        warmup_ms: timer
            .times()
            .iter()
            .map(|d| d.as_secs_f64() * 1000.0)
            .collect(),
        warmup_stats: timer.stats(),
        profiled_ms: profiled.as_secs_f64() * 1000.0,
        device_info: DeviceInfo::detect(device),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    info!("{}", report.summary());

    if let Some(path) = &config.report_path {
        report.save(path)?;
        info!("Report written to {:?}", path);
    }

    Ok(ProfileOutcome {
        predictions,
        report,
    })
}
