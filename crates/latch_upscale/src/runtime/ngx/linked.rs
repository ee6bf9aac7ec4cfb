//! NGX runtime backed by the linked SDK

use super::{check, sys, NgxQuality};
use crate::backend::BackendKind;
use crate::capability::TierSet;
use crate::resource::{DeviceHandle, ResourceHandle};
use crate::runtime::{EvaluateParams, FeatureHandle, RuntimeError, SessionDesc, VendorRuntime};
use std::collections::HashMap;
use std::ffi::{c_void, CStr};
use std::ptr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

const APPLICATION_ID: &CStr = c"latch";
const APPLICATION_DATA_PATH: &CStr = c".";
const MAX_QUALITY_SETTINGS: usize = 5;

struct NgxFeature {
    handle: *mut sys::NgxHandle,
    params: *mut sys::NgxParameter,
}

// SAFETY: NGX handles and parameter blocks are not tied to the creating
// thread; every access goes through the `features` mutex.
unsafe impl Send for NgxFeature {}

/// Owns an NGX parameter block for the duration of a query.
struct ParamBlock(*mut sys::NgxParameter);

impl ParamBlock {
    fn allocate() -> Result<Self, RuntimeError> {
        let mut params = ptr::null_mut();
        // SAFETY: out-pointer is valid for the call
        check("NVSDK_NGX_AllocateParameters", unsafe {
            sys::NVSDK_NGX_AllocateParameters(&mut params)
        })?;
        Ok(Self(params))
    }

    fn set_ui(&self, name: &CStr, value: u32) {
        // SAFETY: block is live and the name is NUL-terminated
        unsafe { sys::NVSDK_NGX_Parameter_SetUI(self.0, name.as_ptr(), value) }
    }

    fn set_f(&self, name: &CStr, value: f32) {
        // SAFETY: as above
        unsafe { sys::NVSDK_NGX_Parameter_SetF(self.0, name.as_ptr(), value) }
    }

    fn set_resource(&self, name: &CStr, resource: Option<ResourceHandle>) {
        let value = resource.map_or(ptr::null_mut(), ResourceHandle::as_ptr);
        // SAFETY: as above; NGX only reads the pointer during the next call
        unsafe { sys::NVSDK_NGX_Parameter_SetVoidPointer(self.0, name.as_ptr(), value) }
    }

    fn into_raw(self) -> *mut sys::NgxParameter {
        let raw = self.0;
        std::mem::forget(self);
        raw
    }
}

impl Drop for ParamBlock {
    fn drop(&mut self) {
        // SAFETY: block came from NVSDK_NGX_AllocateParameters
        unsafe {
            sys::NVSDK_NGX_DestroyParameters(self.0);
        }
    }
}

pub struct NgxRuntime {
    initialized: AtomicBool,
    device: Mutex<Option<DeviceHandle>>,
    features: Mutex<HashMap<FeatureHandle, NgxFeature>>,
    next_feature: AtomicU64,
}

impl NgxRuntime {
    pub fn new() -> Self {
        Self {
            initialized: AtomicBool::new(false),
            device: Mutex::new(None),
            features: Mutex::new(HashMap::new()),
            next_feature: AtomicU64::new(1),
        }
    }

    fn device_ptr(&self) -> *mut c_void {
        self.device
            .lock()
            .ok()
            .and_then(|device| *device)
            .map_or(ptr::null_mut(), DeviceHandle::as_ptr)
    }

    fn create_params(desc: &SessionDesc) -> Result<ParamBlock, RuntimeError> {
        let params = ParamBlock::allocate()?;
        params.set_ui(sys::PARAM_WIDTH, desc.input.width);
        params.set_ui(sys::PARAM_HEIGHT, desc.input.height);
        params.set_ui(sys::PARAM_OUT_WIDTH, desc.output.width);
        params.set_ui(sys::PARAM_OUT_HEIGHT, desc.output.height);
        params.set_ui(sys::PARAM_PERF_QUALITY, NgxQuality::from_tier(desc.tier) as u32);
        params.set_ui(sys::PARAM_CREATE_FLAGS, desc.flags.bits());
        params.set_f(sys::PARAM_SHARPNESS, desc.sharpness);
        Ok(params)
    }
}

impl Default for NgxRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl VendorRuntime for NgxRuntime {
    fn kind(&self) -> BackendKind {
        BackendKind::Dlss
    }

    fn handshake(&self, device: Option<DeviceHandle>) -> Result<(), RuntimeError> {
        if self.initialized.load(Ordering::Acquire) {
            return Ok(());
        }

        let device_ptr = device.map_or(ptr::null_mut(), DeviceHandle::as_ptr);
        // SAFETY: strings are NUL-terminated constants; device is host-owned
        check("NVSDK_NGX_Init", unsafe {
            sys::NVSDK_NGX_Init(
                APPLICATION_ID.as_ptr(),
                APPLICATION_DATA_PATH.as_ptr(),
                device_ptr,
            )
        })?;

        if let Ok(mut slot) = self.device.lock() {
            *slot = device;
        }
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    fn supported_tiers(&self) -> Result<TierSet, RuntimeError> {
        let mut settings = [0u32; MAX_QUALITY_SETTINGS];
        let mut count = 0u32;
        // SAFETY: NGX writes at most one entry per quality setting (5)
        check("NVSDK_NGX_DLSS_GetCapability", unsafe {
            sys::NVSDK_NGX_DLSS_GetCapability(self.device_ptr(), settings.as_mut_ptr(), &mut count)
        })?;

        let count = (count as usize).min(MAX_QUALITY_SETTINGS);
        Ok(settings[..count]
            .iter()
            .filter_map(|&raw| NgxQuality::tier_from_raw(raw))
            .collect())
    }

    fn scratch_size(&self, desc: &SessionDesc) -> Result<usize, RuntimeError> {
        let params = Self::create_params(desc)?;
        let mut size = 0usize;
        // SAFETY: params block is live, out-pointer valid
        check("NVSDK_NGX_GetScratchBufferSize", unsafe {
            sys::NVSDK_NGX_GetScratchBufferSize(sys::FEATURE_SUPER_SAMPLING, params.0, &mut size)
        })?;
        Ok(size)
    }

    fn create_feature(&self, desc: &SessionDesc) -> Result<FeatureHandle, RuntimeError> {
        let params = Self::create_params(desc)?;
        let mut handle = ptr::null_mut();
        // SAFETY: creation records no commands, so no command list is bound
        check("NVSDK_NGX_CreateFeature", unsafe {
            sys::NVSDK_NGX_CreateFeature(
                ptr::null_mut(),
                sys::FEATURE_SUPER_SAMPLING,
                params.0,
                &mut handle,
            )
        })?;

        let feature = FeatureHandle(self.next_feature.fetch_add(1, Ordering::Relaxed));
        let mut features = self
            .features
            .lock()
            .map_err(|_| RuntimeError::UnknownFeature(feature))?;
        features.insert(
            feature,
            NgxFeature {
                handle,
                params: params.into_raw(),
            },
        );
        Ok(feature)
    }

    fn evaluate(&self, feature: FeatureHandle, params: &EvaluateParams) -> Result<(), RuntimeError> {
        let features = self
            .features
            .lock()
            .map_err(|_| RuntimeError::UnknownFeature(feature))?;
        let entry = features
            .get(&feature)
            .ok_or(RuntimeError::UnknownFeature(feature))?;

        let block = ParamBlock(entry.params);
        block.set_resource(sys::PARAM_COLOR, Some(params.color));
        block.set_resource(sys::PARAM_OUTPUT, Some(params.output));
        block.set_resource(sys::PARAM_DEPTH, params.depth);
        block.set_resource(sys::PARAM_MOTION_VECTORS, Some(params.motion_vectors));
        block.set_resource(sys::PARAM_EXPOSURE, params.exposure);
        block.set_f(sys::PARAM_JITTER_X, params.jitter.x);
        block.set_f(sys::PARAM_JITTER_Y, params.jitter.y);
        block.set_ui(sys::PARAM_RESET, params.reset as u32);
        block.set_f(sys::PARAM_FRAME_TIME_MS, params.delta_time_ms);
        block.set_f(sys::PARAM_SHARPNESS, params.sharpness);
        // the block stays owned by the feature entry
        let raw = block.into_raw();

        let command_list = params.command_list.map_or(ptr::null_mut(), |list| list.as_ptr());
        // SAFETY: handle and params belong to a live feature; resources are
        // host-owned and valid for this call
        check("NVSDK_NGX_EvaluateFeature", unsafe {
            sys::NVSDK_NGX_EvaluateFeature(command_list, entry.handle, raw)
        })
    }

    fn release(&self, feature: FeatureHandle) {
        let removed = self
            .features
            .lock()
            .ok()
            .and_then(|mut features| features.remove(&feature));

        if let Some(entry) = removed {
            // SAFETY: entry was created by this runtime and is no longer reachable
            unsafe {
                sys::NVSDK_NGX_Release(entry.handle);
                sys::NVSDK_NGX_DestroyParameters(entry.params);
            }
        }
    }
}

impl Drop for NgxRuntime {
    fn drop(&mut self) {
        let leftover: Vec<FeatureHandle> = self
            .features
            .get_mut()
            .map(|features| features.keys().copied().collect())
            .unwrap_or_default();
        for feature in leftover {
            self.release(feature);
        }

        if self.initialized.load(Ordering::Acquire) {
            // SAFETY: paired with the successful NVSDK_NGX_Init in handshake
            unsafe {
                sys::NVSDK_NGX_Shutdown();
            }
        }
    }
}
