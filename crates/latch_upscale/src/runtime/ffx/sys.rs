//! Raw FidelityFX FSR3 entry points and ABI structs

#![allow(non_snake_case)]

use std::ffi::{c_char, c_int, c_void};

pub type FfxErrorCode = u32;
pub type FfxInterface = *mut c_void;
pub type FfxLogCallback = Option<unsafe extern "C" fn(level: u32, message: *const c_char)>;

#[repr(C)]
pub struct FfxFsr3Context {
    pub initialized: c_int,
    pub device: *mut c_void,
    pub width: c_int,
    pub height: c_int,
    pub quality: u32,
}

#[repr(C)]
pub struct FfxFsr3UpscalerContext {
    pub base: FfxFsr3Context,
    pub sharpness: f32,
    pub hdr: bool,
    pub render_width: c_int,
    pub render_height: c_int,
    pub display_width: c_int,
    pub display_height: c_int,
}

#[repr(C)]
pub struct FfxFsr3UpscalerContextCreateParams {
    pub interface: *mut FfxInterface,
    pub render_width: u32,
    pub render_height: u32,
    pub display_width: u32,
    pub display_height: u32,
    pub quality: u32,
    pub sharpness: f32,
    pub hdr: bool,
    pub hdr_nits: f32,
    pub log_callback: FfxLogCallback,
}

#[repr(C)]
pub struct FfxFsr3UpscalerDispatchParams {
    pub command_list: *mut c_void,
    pub color_input: *mut c_void,
    pub color_output: *mut c_void,
    pub depth_input: *mut c_void,
    pub motion_vectors: *mut c_void,
    pub exposure: *mut c_void,
    pub frame_time_delta: f32,
    pub frame_index: u32,
    pub jitter_x: f32,
    pub jitter_y: f32,
    pub flags: u32,
}

#[repr(C)]
pub struct FfxFsr3FrameInterpolationContext {
    pub base: FfxFsr3Context,
    pub initialized: bool,
    pub input_width: c_int,
    pub input_height: c_int,
    pub output_width: c_int,
    pub output_height: c_int,
    pub frame_time_delta: f32,
}

#[repr(C)]
pub struct FfxFsr3FrameInterpolationContextCreateParams {
    pub interface: *mut FfxInterface,
    pub input_width: u32,
    pub input_height: u32,
    pub output_width: u32,
    pub output_height: u32,
    pub log_callback: FfxLogCallback,
}

#[repr(C)]
pub struct FfxFsr3FrameInterpolationDispatchParams {
    pub command_list: *mut c_void,
    pub color_current: *mut c_void,
    pub color_previous: *mut c_void,
    pub motion_vectors: *mut c_void,
    pub depth_current: *mut c_void,
    pub depth_previous: *mut c_void,
    pub color_interpolated: *mut c_void,
    pub frame_time_delta: f32,
    pub frame_index: u32,
    pub interpolation_factor: f32,
    pub jitter_x: f32,
    pub jitter_y: f32,
    pub previous_jitter_x: f32,
    pub previous_jitter_y: f32,
    pub flags: u32,
}

#[link(name = "ffx_fsr3")]
extern "C" {
    pub fn ffxFsr3IsAvailable() -> bool;

    pub fn ffxFsr3UpscalerContextCreate(
        context: *mut FfxFsr3UpscalerContext,
        params: *const FfxFsr3UpscalerContextCreateParams,
    ) -> FfxErrorCode;

    pub fn ffxFsr3UpscalerContextDestroy(context: *mut FfxFsr3UpscalerContext) -> FfxErrorCode;

    pub fn ffxFsr3UpscalerContextDispatch(
        context: *mut FfxFsr3UpscalerContext,
        params: *const FfxFsr3UpscalerDispatchParams,
    ) -> FfxErrorCode;

    pub fn ffxFsr3FrameInterpolationContextCreate(
        context: *mut FfxFsr3FrameInterpolationContext,
        params: *const FfxFsr3FrameInterpolationContextCreateParams,
    ) -> FfxErrorCode;

    pub fn ffxFsr3FrameInterpolationContextDestroy(
        context: *mut FfxFsr3FrameInterpolationContext,
    ) -> FfxErrorCode;

    pub fn ffxFsr3FrameInterpolationContextDispatch(
        context: *mut FfxFsr3FrameInterpolationContext,
        params: *const FfxFsr3FrameInterpolationDispatchParams,
    ) -> FfxErrorCode;
}
