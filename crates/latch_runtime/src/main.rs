//! Latch Upscaler Runtime
//!
//! Minimal host that boots the upscaler from a config file and drives a few
//! synthetic frames through it.
//!
//! Usage: `latch [config.json]`

use anyhow::{anyhow, Context, Result};
use latch_upscale::{
    optimal_settings, CapabilityCache, DeviceHandle, DispatchRequest, InterpolationRequest, Jitter,
    Resolution, ResourceHandle, Upscaler, UpscalerConfig,
};
use std::time::Duration;

const DISPLAY: Resolution = Resolution::new(1920, 1080);
const FRAMES: u64 = 8;
const FRAME_TIME: Duration = Duration::from_micros(16_667);

/// Stand-in handles; this harness has no graphics device of its own.
fn synthetic(raw: usize) -> Result<ResourceHandle> {
    ResourceHandle::from_raw(raw).ok_or_else(|| anyhow!("null resource handle"))
}

/// Halton(2, 3) sample centred on the pixel.
fn jitter(frame: u64) -> Jitter {
    fn halton(mut index: u64, base: u64) -> f32 {
        let mut fraction = 1.0;
        let mut result = 0.0;
        while index > 0 {
            fraction /= base as f32;
            result += fraction * (index % base) as f32;
            index /= base;
        }
        result
    }
    let index = frame % 8 + 1;
    Jitter::new(halton(index, 2) - 0.5, halton(index, 3) - 0.5)
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    tracing::info!("Latch Upscaler v{}", latch_upscale::VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            UpscalerConfig::load(&path).with_context(|| format!("loading config from {path}"))?
        }
        None => UpscalerConfig::default(),
    };

    let device = DeviceHandle::from_raw(0x1).ok_or_else(|| anyhow!("null device handle"))?;
    CapabilityCache::install_global(CapabilityCache::system(config.simulation, Some(device)))
        .map_err(|_| anyhow!("capability cache installed twice"))?;

    let settings = optimal_settings(DISPLAY, config.quality_tier);
    tracing::info!(
        "{} at {}: render {} (min {}, max {}), sharpness {:.1}",
        config.quality_tier,
        DISPLAY,
        settings.render,
        settings.min,
        settings.max,
        settings.sharpness
    );

    let mut upscaler = Upscaler::new(config, DISPLAY, device)?;
    tracing::info!(
        "Upscaling {} -> {} with {}",
        upscaler.render_resolution(),
        upscaler.display_resolution(),
        upscaler.active_backend()
    );

    let color = synthetic(0x1000)?;
    let previous_color = synthetic(0x1100)?;
    let depth = synthetic(0x2000)?;
    let motion_vectors = synthetic(0x3000)?;
    let exposure = synthetic(0x4000)?;
    let output = synthetic(0x5000)?;
    let interpolated = synthetic(0x6000)?;

    for frame in 0..FRAMES {
        let request = DispatchRequest {
            color: Some(color),
            depth: Some(depth),
            motion_vectors: Some(motion_vectors),
            exposure: Some(exposure),
            output: Some(output),
            delta_time: FRAME_TIME,
            frame_index: frame,
            jitter: Some(jitter(frame)),
            // camera cut halfway through
            reset: frame == FRAMES / 2,
            ..Default::default()
        };

        match upscaler.dispatch(&request) {
            Ok(result) => {
                tracing::info!(
                    "frame {} -> {:?} (history reset: {})",
                    result.frame_index,
                    result.output,
                    result.history_reset
                );
                if let Some(warning) = result.warning {
                    tracing::warn!("frame {}: {}", frame, warning);
                }
            }
            Err(err) => tracing::warn!("frame {} failed: {}", frame, err),
        }

        if upscaler.context().capabilities().frame_interpolation && frame > 0 {
            let request = InterpolationRequest {
                current_color: Some(output),
                previous_color: Some(previous_color),
                motion_vectors: Some(motion_vectors),
                output: Some(interpolated),
                factor: 0.5,
                delta_time: FRAME_TIME / 2,
                frame_index: frame,
                jitter: Some(jitter(frame)),
                previous_jitter: Some(jitter(frame - 1)),
                ..Default::default()
            };
            if let Err(err) = upscaler.interpolate(&request) {
                tracing::warn!("interpolation at frame {} failed: {}", frame, err);
            }
        }
    }

    upscaler.destroy();
    tracing::info!("Upscaler shut down");

    Ok(())
}
