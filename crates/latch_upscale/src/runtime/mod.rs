//! Vendor runtime function tables
//!
//! A [`VendorRuntime`] is the thin layer that talks to one vendor SDK. The
//! real SDK linkage is only compiled in with the `ngx-sdk` / `ffx-sdk`
//! features; without them the vendor runtimes report [`RuntimeError::NotLinked`]
//! and the capability probe decides what to do about it.

pub mod ffx;
pub mod ngx;
pub mod simulated;

use crate::backend::BackendKind;
use crate::capability::TierSet;
use crate::flags::FeatureFlags;
use crate::quality::QualityTier;
use crate::request::Jitter;
use crate::resolution::Resolution;
use crate::resource::{CommandListHandle, DeviceHandle, ResourceHandle};
use std::sync::Arc;
use thiserror::Error;

pub use ffx::FfxRuntime;
pub use ngx::NgxRuntime;
pub use simulated::SimulatedRuntime;

/// Opaque id of a feature instance created by a runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FeatureHandle(pub u64);

/// Everything a runtime needs to create a session.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionDesc {
    pub device: DeviceHandle,
    pub input: Resolution,
    pub output: Resolution,
    pub tier: QualityTier,
    pub flags: FeatureFlags,
    pub sharpness: f32,
}

/// Validated, fully bound inputs for one evaluation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct EvaluateParams {
    pub command_list: Option<CommandListHandle>,
    pub color: ResourceHandle,
    pub depth: Option<ResourceHandle>,
    pub motion_vectors: ResourceHandle,
    pub exposure: Option<ResourceHandle>,
    pub output: ResourceHandle,
    pub jitter: Jitter,
    pub delta_time_ms: f32,
    pub frame_index: u64,
    pub reset: bool,
    pub sharpness: f32,
}

/// Validated inputs for one frame interpolation.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InterpolateParams {
    pub command_list: Option<CommandListHandle>,
    pub current_color: ResourceHandle,
    pub previous_color: ResourceHandle,
    pub motion_vectors: ResourceHandle,
    pub current_depth: Option<ResourceHandle>,
    pub previous_depth: Option<ResourceHandle>,
    pub output: ResourceHandle,
    pub factor: f32,
    pub delta_time_ms: f32,
    pub frame_index: u64,
    pub jitter: Jitter,
    pub previous_jitter: Jitter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("vendor runtime is not linked into this build")]
    NotLinked,

    #[error("{call} returned status {code:#x}")]
    Status { call: &'static str, code: u32 },

    #[error("{0} is not supported by this runtime")]
    Unsupported(&'static str),

    #[error("unknown feature handle {0:?}")]
    UnknownFeature(FeatureHandle),
}

/// One vendor SDK, seen through the operations the upscaler needs.
///
/// Runtimes are shared between every context of the same backend kind, so
/// they must be `Send + Sync`; per-session state lives behind
/// [`FeatureHandle`]s.
pub trait VendorRuntime: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Minimal init against the device. Failing here means the runtime is
    /// not usable on this machine.
    fn handshake(&self, device: Option<DeviceHandle>) -> Result<(), RuntimeError>;

    fn supported_tiers(&self) -> Result<TierSet, RuntimeError>;

    fn supports_interpolation(&self) -> bool {
        false
    }

    /// Bytes of host memory to reserve for a session. The caller holds the
    /// reservation until [`VendorRuntime::release`]; the runtime is never
    /// given a pointer to it.
    fn scratch_size(&self, desc: &SessionDesc) -> Result<usize, RuntimeError>;

    fn create_feature(&self, desc: &SessionDesc) -> Result<FeatureHandle, RuntimeError>;

    fn evaluate(&self, feature: FeatureHandle, params: &EvaluateParams) -> Result<(), RuntimeError>;

    fn interpolate(
        &self,
        _feature: FeatureHandle,
        _params: &InterpolateParams,
    ) -> Result<(), RuntimeError> {
        Err(RuntimeError::Unsupported("frame interpolation"))
    }

    fn release(&self, feature: FeatureHandle);
}

/// The runtime compiled in for a vendor backend, linked or not.
pub fn linked_runtime(kind: BackendKind) -> Option<Arc<dyn VendorRuntime>> {
    match kind {
        BackendKind::Dlss => Some(Arc::new(NgxRuntime::new())),
        BackendKind::Fsr => Some(Arc::new(FfxRuntime::new())),
        BackendKind::Passthrough => None,
    }
}
