//! Raw NGX entry points

#![allow(non_snake_case)]

use std::ffi::{c_char, c_void};

pub type NgxResult = u32;

#[repr(C)]
pub struct NgxHandle {
    _private: [u8; 0],
}

#[repr(C)]
pub struct NgxParameter {
    _private: [u8; 0],
}

pub const FEATURE_SUPER_SAMPLING: u32 = 0;

pub const PARAM_WIDTH: &std::ffi::CStr = c"Width";
pub const PARAM_HEIGHT: &std::ffi::CStr = c"Height";
pub const PARAM_OUT_WIDTH: &std::ffi::CStr = c"OutWidth";
pub const PARAM_OUT_HEIGHT: &std::ffi::CStr = c"OutHeight";
pub const PARAM_PERF_QUALITY: &std::ffi::CStr = c"PerfQualityValue";
pub const PARAM_CREATE_FLAGS: &std::ffi::CStr = c"DLSS.Feature.Create.Flags";
pub const PARAM_SHARPNESS: &std::ffi::CStr = c"Sharpness";
pub const PARAM_COLOR: &std::ffi::CStr = c"Color";
pub const PARAM_OUTPUT: &std::ffi::CStr = c"Output";
pub const PARAM_DEPTH: &std::ffi::CStr = c"Depth";
pub const PARAM_MOTION_VECTORS: &std::ffi::CStr = c"MotionVectors";
pub const PARAM_EXPOSURE: &std::ffi::CStr = c"ExposureTexture";
pub const PARAM_JITTER_X: &std::ffi::CStr = c"Jitter.Offset.X";
pub const PARAM_JITTER_Y: &std::ffi::CStr = c"Jitter.Offset.Y";
pub const PARAM_RESET: &std::ffi::CStr = c"Reset";
pub const PARAM_FRAME_TIME_MS: &std::ffi::CStr = c"FrameTimeDeltaInMsec";

#[link(name = "nvsdk_ngx")]
extern "C" {
    pub fn NVSDK_NGX_Init(
        application_id: *const c_char,
        application_data_path: *const c_char,
        device: *mut c_void,
    ) -> NgxResult;

    pub fn NVSDK_NGX_Shutdown() -> NgxResult;

    pub fn NVSDK_NGX_GetScratchBufferSize(
        feature: u32,
        parameters: *const NgxParameter,
        out_size_in_bytes: *mut usize,
    ) -> NgxResult;

    pub fn NVSDK_NGX_CreateFeature(
        command_list: *mut c_void,
        feature: u32,
        parameters: *mut NgxParameter,
        out_handle: *mut *mut NgxHandle,
    ) -> NgxResult;

    pub fn NVSDK_NGX_Release(handle: *mut NgxHandle) -> NgxResult;

    pub fn NVSDK_NGX_EvaluateFeature(
        command_list: *mut c_void,
        handle: *mut NgxHandle,
        parameters: *mut NgxParameter,
    ) -> NgxResult;

    pub fn NVSDK_NGX_AllocateParameters(out_parameters: *mut *mut NgxParameter) -> NgxResult;

    pub fn NVSDK_NGX_DestroyParameters(parameters: *mut NgxParameter) -> NgxResult;

    pub fn NVSDK_NGX_DLSS_GetCapability(
        device: *mut c_void,
        out_supported_quality_settings: *mut u32,
        out_num_supported_quality_settings: *mut u32,
    ) -> NgxResult;

    pub fn NVSDK_NGX_Parameter_SetUI(parameters: *mut NgxParameter, name: *const c_char, value: u32);

    pub fn NVSDK_NGX_Parameter_SetF(parameters: *mut NgxParameter, name: *const c_char, value: f32);

    pub fn NVSDK_NGX_Parameter_SetVoidPointer(
        parameters: *mut NgxParameter,
        name: *const c_char,
        value: *mut c_void,
    );
}
