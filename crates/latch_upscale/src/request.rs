//! Per-frame inputs and outputs

use crate::error::UpscaleError;
use crate::resource::{CommandListHandle, ResourceHandle};
use std::time::Duration;

/// Sub-pixel camera jitter in render pixels.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Jitter {
    pub x: f32,
    pub y: f32,
}

impl Jitter {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Inputs for one upscale.
///
/// Handles are borrowed: they only need to stay valid for the duration of the
/// dispatch call. `None` means the host did not bind that slot.
#[derive(Debug, Clone, Default)]
pub struct DispatchRequest {
    pub command_list: Option<CommandListHandle>,
    pub color: Option<ResourceHandle>,
    pub depth: Option<ResourceHandle>,
    pub motion_vectors: Option<ResourceHandle>,
    pub exposure: Option<ResourceHandle>,
    pub output: Option<ResourceHandle>,
    pub delta_time: Duration,
    /// Monotonically increasing frame counter. Gaps are fine.
    pub frame_index: u64,
    pub jitter: Option<Jitter>,
    /// Ask the backend to discard temporal history (camera cut, teleport).
    pub reset: bool,
}

/// Inputs for generating a frame between two rendered frames.
#[derive(Debug, Clone, Default)]
pub struct InterpolationRequest {
    pub command_list: Option<CommandListHandle>,
    pub current_color: Option<ResourceHandle>,
    pub previous_color: Option<ResourceHandle>,
    pub motion_vectors: Option<ResourceHandle>,
    pub current_depth: Option<ResourceHandle>,
    pub previous_depth: Option<ResourceHandle>,
    pub output: Option<ResourceHandle>,
    /// Position between the previous (0.0) and current (1.0) frame.
    pub factor: f32,
    pub delta_time: Duration,
    pub frame_index: u64,
    pub jitter: Option<Jitter>,
    pub previous_jitter: Option<Jitter>,
}

/// What a dispatch produced.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchResult {
    /// Resource holding the produced image. The caller owns it.
    pub output: ResourceHandle,
    pub frame_index: u64,
    /// Temporal history was discarded for this frame.
    pub history_reset: bool,
    /// Non-fatal problem detected while dispatching.
    pub warning: Option<UpscaleError>,
}
