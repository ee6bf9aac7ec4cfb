//! FidelityFX runtime backed by the linked SDK

use super::{check, frame_index, sys, FfxQualityMode, FFX_ERROR_NOT_IMPLEMENTED};
use crate::backend::BackendKind;
use crate::capability::TierSet;
use crate::resource::{DeviceHandle, ResourceHandle};
use crate::runtime::{
    EvaluateParams, FeatureHandle, InterpolateParams, RuntimeError, SessionDesc, VendorRuntime,
};
use std::collections::HashMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Peak luminance handed to the HDR path when the host gives none.
const DEFAULT_HDR_NITS: f32 = 1000.0;

struct FfxFeature {
    upscaler: sys::FfxFsr3UpscalerContext,
    interpolation: sys::FfxFsr3FrameInterpolationContext,
    flags: u32,
}

// SAFETY: FSR3 contexts are plain data owned by the caller; every access goes
// through the `features` mutex.
unsafe impl Send for FfxFeature {}

fn resource_ptr(resource: Option<ResourceHandle>) -> *mut c_void {
    resource.map_or(ptr::null_mut(), ResourceHandle::as_ptr)
}

pub struct FfxRuntime {
    features: Mutex<HashMap<FeatureHandle, Box<FfxFeature>>>,
    next_feature: AtomicU64,
}

impl FfxRuntime {
    pub fn new() -> Self {
        Self {
            features: Mutex::new(HashMap::new()),
            next_feature: AtomicU64::new(1),
        }
    }

    fn with_feature<T>(
        &self,
        feature: FeatureHandle,
        f: impl FnOnce(&mut FfxFeature) -> Result<T, RuntimeError>,
    ) -> Result<T, RuntimeError> {
        let mut features = self
            .features
            .lock()
            .map_err(|_| RuntimeError::UnknownFeature(feature))?;
        let entry = features
            .get_mut(&feature)
            .ok_or(RuntimeError::UnknownFeature(feature))?;
        f(entry)
    }
}

impl Default for FfxRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorRuntime for FfxRuntime {
    fn kind(&self) -> BackendKind {
        BackendKind::Fsr
    }

    fn handshake(&self, _device: Option<DeviceHandle>) -> Result<(), RuntimeError> {
        // SAFETY: no arguments, no preconditions
        if unsafe { sys::ffxFsr3IsAvailable() } {
            Ok(())
        } else {
            Err(RuntimeError::Status {
                call: "ffxFsr3IsAvailable",
                code: FFX_ERROR_NOT_IMPLEMENTED,
            })
        }
    }

    fn supported_tiers(&self) -> Result<TierSet, RuntimeError> {
        // FSR3 has no per-device quality query; every mode runs on any device
        // that passes the availability check.
        Ok(TierSet::all())
    }

    fn supports_interpolation(&self) -> bool {
        true
    }

    fn scratch_size(&self, _desc: &SessionDesc) -> Result<usize, RuntimeError> {
        // FSR3 contexts carry their own storage
        Ok(0)
    }

    fn create_feature(&self, desc: &SessionDesc) -> Result<FeatureHandle, RuntimeError> {
        // SAFETY: both contexts are plain C structs for which all-zero is the
        // documented "not created" state
        let mut entry: Box<FfxFeature> = Box::new(FfxFeature {
            upscaler: unsafe { std::mem::zeroed() },
            interpolation: unsafe { std::mem::zeroed() },
            flags: desc.flags.bits(),
        });

        let mut interface: sys::FfxInterface = desc.device.as_ptr();
        let hdr = desc.flags.contains(crate::flags::FeatureFlags::IS_HDR);

        let upscaler_params = sys::FfxFsr3UpscalerContextCreateParams {
            interface: &mut interface,
            render_width: desc.input.width,
            render_height: desc.input.height,
            display_width: desc.output.width,
            display_height: desc.output.height,
            quality: FfxQualityMode::from_tier(desc.tier) as u32,
            sharpness: desc.sharpness,
            hdr,
            hdr_nits: DEFAULT_HDR_NITS,
            log_callback: None,
        };
        // SAFETY: context and params outlive the call; interface points at a
        // live local
        check("ffxFsr3UpscalerContextCreate", unsafe {
            sys::ffxFsr3UpscalerContextCreate(&mut entry.upscaler, &upscaler_params)
        })?;

        let interpolation_params = sys::FfxFsr3FrameInterpolationContextCreateParams {
            interface: &mut interface,
            input_width: desc.output.width,
            input_height: desc.output.height,
            output_width: desc.output.width,
            output_height: desc.output.height,
            log_callback: None,
        };
        // SAFETY: as above
        let created = check("ffxFsr3FrameInterpolationContextCreate", unsafe {
            sys::ffxFsr3FrameInterpolationContextCreate(&mut entry.interpolation, &interpolation_params)
        });
        if let Err(err) = created {
            // SAFETY: upscaler context was created above
            unsafe {
                sys::ffxFsr3UpscalerContextDestroy(&mut entry.upscaler);
            }
            return Err(err);
        }

        let feature = FeatureHandle(self.next_feature.fetch_add(1, Ordering::Relaxed));
        let mut features = self
            .features
            .lock()
            .map_err(|_| RuntimeError::UnknownFeature(feature))?;
        features.insert(feature, entry);
        Ok(feature)
    }

    fn evaluate(&self, feature: FeatureHandle, params: &EvaluateParams) -> Result<(), RuntimeError> {
        self.with_feature(feature, |entry| {
            let dispatch = sys::FfxFsr3UpscalerDispatchParams {
                command_list: params.command_list.map_or(ptr::null_mut(), |list| list.as_ptr()),
                color_input: params.color.as_ptr(),
                color_output: params.output.as_ptr(),
                depth_input: resource_ptr(params.depth),
                motion_vectors: params.motion_vectors.as_ptr(),
                exposure: resource_ptr(params.exposure),
                frame_time_delta: params.delta_time_ms,
                frame_index: frame_index(params.frame_index, params.reset),
                jitter_x: params.jitter.x,
                jitter_y: params.jitter.y,
                flags: entry.flags,
            };
            entry.upscaler.sharpness = params.sharpness;
            // SAFETY: context is live; resources are host-owned for this call
            check("ffxFsr3UpscalerContextDispatch", unsafe {
                sys::ffxFsr3UpscalerContextDispatch(&mut entry.upscaler, &dispatch)
            })
        })
    }

    fn interpolate(
        &self,
        feature: FeatureHandle,
        params: &InterpolateParams,
    ) -> Result<(), RuntimeError> {
        self.with_feature(feature, |entry| {
            let dispatch = sys::FfxFsr3FrameInterpolationDispatchParams {
                command_list: params.command_list.map_or(ptr::null_mut(), |list| list.as_ptr()),
                color_current: params.current_color.as_ptr(),
                color_previous: params.previous_color.as_ptr(),
                motion_vectors: params.motion_vectors.as_ptr(),
                depth_current: resource_ptr(params.current_depth),
                depth_previous: resource_ptr(params.previous_depth),
                color_interpolated: params.output.as_ptr(),
                frame_time_delta: params.delta_time_ms,
                frame_index: frame_index(params.frame_index, false),
                interpolation_factor: params.factor,
                jitter_x: params.jitter.x,
                jitter_y: params.jitter.y,
                previous_jitter_x: params.previous_jitter.x,
                previous_jitter_y: params.previous_jitter.y,
                flags: entry.flags,
            };
            // SAFETY: as in evaluate
            check("ffxFsr3FrameInterpolationContextDispatch", unsafe {
                sys::ffxFsr3FrameInterpolationContextDispatch(&mut entry.interpolation, &dispatch)
            })
        })
    }

    fn release(&self, feature: FeatureHandle) {
        let removed = self
            .features
            .lock()
            .ok()
            .and_then(|mut features| features.remove(&feature));

        if let Some(mut entry) = removed {
            // SAFETY: both contexts were created in create_feature
            unsafe {
                sys::ffxFsr3FrameInterpolationContextDestroy(&mut entry.interpolation);
                sys::ffxFsr3UpscalerContextDestroy(&mut entry.upscaler);
            }
        }
    }
}

impl Drop for FfxRuntime {
    fn drop(&mut self) {
        let leftover: Vec<FeatureHandle> = self
            .features
            .get_mut()
            .map(|features| features.keys().copied().collect())
            .unwrap_or_default();
        for feature in leftover {
            self.release(feature);
        }
    }
}
