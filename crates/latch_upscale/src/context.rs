//! Upscaler session lifecycle
//!
//! An [`UpscalerContext`] binds one backend to one (render, display)
//! resolution pair:
//!
//! ```text
//! Uninitialized --create--> Created --destroy--> Destroyed
//!       |                                            ^
//!       +------------------destroy-------------------+
//! ```
//!
//! Resizing means destroying the context and building a new one. Every
//! lifecycle call takes `&mut self`, so a dispatch can never race a destroy.

use crate::backend::{BackendKind, FrameContext, PassthroughBackend, UpscaleBackend};
use crate::capability::BackendCapabilities;
use crate::error::{Result, UpscaleError};
use crate::flags::FeatureFlags;
use crate::quality::QualityTier;
use crate::request::{DispatchRequest, DispatchResult, InterpolationRequest};
use crate::resolution::Resolution;
use crate::resource::{DeviceHandle, ResourceSlot};
use crate::runtime::SessionDesc;
use std::fmt;

/// Sharpness used until the host picks one.
pub const DEFAULT_SHARPNESS: f32 = 0.5;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ContextState {
    Uninitialized,
    Created,
    Destroyed,
}

impl fmt::Display for ContextState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContextState::Uninitialized => "uninitialized",
            ContextState::Created => "already created",
            ContextState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Clamp to [0, 1], mapping NaN to 0.
pub(crate) fn clamp_unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

pub struct UpscalerContext {
    backend: Box<dyn UpscaleBackend>,
    capabilities: BackendCapabilities,
    state: ContextState,
    device: Option<DeviceHandle>,
    input: Resolution,
    output: Resolution,
    tier: QualityTier,
    flags: FeatureFlags,
    sharpness: f32,
    last_frame: Option<u64>,
}

impl UpscalerContext {
    /// Uncreated context for `backend`, gated by `capabilities`.
    pub fn new(backend: Box<dyn UpscaleBackend>, capabilities: BackendCapabilities) -> Self {
        Self {
            backend,
            capabilities,
            state: ContextState::Uninitialized,
            device: None,
            input: Resolution::new(0, 0),
            output: Resolution::new(0, 0),
            tier: QualityTier::Quality,
            flags: FeatureFlags::empty(),
            sharpness: DEFAULT_SHARPNESS,
            last_frame: None,
        }
    }

    pub fn passthrough() -> Self {
        Self::new(Box::new(PassthroughBackend::new()), BackendCapabilities::passthrough())
    }

    /// Open the backend session.
    ///
    /// On any error the context stays `Uninitialized` and `create` may be
    /// retried with different arguments.
    pub fn create(
        &mut self,
        device: DeviceHandle,
        input: Resolution,
        output: Resolution,
        tier: QualityTier,
        flags: FeatureFlags,
    ) -> Result<()> {
        if self.state != ContextState::Uninitialized {
            return Err(UpscaleError::LifecycleViolation {
                operation: "create",
                state: self.state,
            });
        }

        let kind = self.backend.kind();
        if !self.capabilities.supports(tier) {
            return Err(UpscaleError::UnsupportedConfiguration {
                backend: kind,
                what: format!("the {tier} tier"),
            });
        }

        if input.is_degenerate() || output.is_degenerate() || !input.fits_within(output) {
            return Err(UpscaleError::InvalidDimensions { input, output });
        }

        let desc = SessionDesc {
            device,
            input,
            output,
            tier,
            flags,
            sharpness: self.sharpness,
        };
        self.backend.create(&desc)?;

        self.device = Some(device);
        self.input = input;
        self.output = output;
        self.tier = tier;
        self.flags = flags;
        self.last_frame = None;
        self.state = ContextState::Created;

        tracing::info!("{} context created: {} -> {} at {}", kind, input, output, tier);
        Ok(())
    }

    /// Upscale one frame.
    ///
    /// A frame index lower than the previous one is not fatal: history is
    /// reset and the result carries a
    /// [`UpscaleError::TemporalOrderingViolation`] warning.
    pub fn dispatch(&mut self, request: &DispatchRequest) -> Result<DispatchResult> {
        if self.state != ContextState::Created {
            return Err(UpscaleError::NotInitialized);
        }
        // every backend needs these two; the rest depends on backend and flags
        if request.color.is_none() {
            return Err(UpscaleError::InvalidResource { slot: ResourceSlot::Color });
        }
        if request.motion_vectors.is_none() {
            return Err(UpscaleError::InvalidResource {
                slot: ResourceSlot::MotionVectors,
            });
        }

        let mut warning = None;
        let reset_history = match self.last_frame {
            None => true,
            Some(previous) if request.frame_index < previous => {
                tracing::warn!(
                    "{} frame {} arrived after frame {}, resetting history",
                    self.backend.kind(),
                    request.frame_index,
                    previous
                );
                warning = Some(UpscaleError::TemporalOrderingViolation {
                    previous,
                    current: request.frame_index,
                });
                true
            }
            Some(_) => request.reset,
        };

        let output = self.backend.evaluate(FrameContext {
            request,
            reset_history,
            sharpness: self.sharpness,
        })?;
        self.last_frame = Some(request.frame_index);

        tracing::trace!("frame {} dispatched (reset: {})", request.frame_index, reset_history);
        Ok(DispatchResult {
            output,
            frame_index: request.frame_index,
            history_reset: reset_history,
            warning,
        })
    }

    /// Generate a frame between the previous and current rendered frames.
    pub fn interpolate(&mut self, request: &InterpolationRequest) -> Result<DispatchResult> {
        if self.state != ContextState::Created {
            return Err(UpscaleError::NotInitialized);
        }
        if !self.capabilities.frame_interpolation {
            return Err(UpscaleError::UnsupportedConfiguration {
                backend: self.backend.kind(),
                what: "frame interpolation".to_string(),
            });
        }

        let factor = clamp_unit(request.factor);
        let output = self.backend.interpolate(request, factor)?;

        tracing::trace!("frame {} interpolated at {:.2}", request.frame_index, factor);
        Ok(DispatchResult {
            output,
            frame_index: request.frame_index,
            history_reset: false,
            warning: None,
        })
    }

    /// Release the backend session. Safe to call any number of times.
    pub fn destroy(&mut self) {
        match self.state {
            ContextState::Created => {
                self.backend.destroy();
                tracing::info!("{} context destroyed", self.backend.kind());
            }
            ContextState::Uninitialized => {}
            ContextState::Destroyed => return,
        }
        self.state = ContextState::Destroyed;
    }

    /// Applies from the next dispatch on.
    pub fn set_sharpness(&mut self, sharpness: f32) {
        self.sharpness = clamp_unit(sharpness);
    }

    pub fn state(&self) -> ContextState {
        self.state
    }

    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub fn capabilities(&self) -> &BackendCapabilities {
        &self.capabilities
    }

    pub fn tier(&self) -> QualityTier {
        self.tier
    }

    pub fn input_resolution(&self) -> Resolution {
        self.input
    }

    pub fn output_resolution(&self) -> Resolution {
        self.output
    }

    pub fn flags(&self) -> FeatureFlags {
        self.flags
    }

    pub fn sharpness(&self) -> f32 {
        self.sharpness
    }

    pub fn device(&self) -> Option<DeviceHandle> {
        self.device
    }

    pub fn last_frame_index(&self) -> Option<u64> {
        self.last_frame
    }
}

impl fmt::Debug for UpscalerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpscalerContext")
            .field("backend", &self.backend.kind())
            .field("state", &self.state)
            .field("input", &self.input)
            .field("output", &self.output)
            .field("tier", &self.tier)
            .finish()
    }
}

impl Drop for UpscalerContext {
    fn drop(&mut self) {
        self.destroy();
    }
}
