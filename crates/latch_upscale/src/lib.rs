//! Latch Upscaling
//!
//! Vendor-neutral temporal upscaling for the renderer:
//! - Quality tiers and render resolution policy
//! - Backend capability probing (DLSS, FSR, passthrough)
//! - Per-session lifecycle with automatic backend fallback
//!
//! The vendor SDKs are linked only with the `ngx-sdk` / `ffx-sdk` features.
//! Without them every vendor backend reports as unavailable (or simulated,
//! when [`SimulationMode::Enabled`] is configured) and passthrough takes over.

pub mod backend;
pub mod capability;
pub mod config;
pub mod context;
pub mod error;
pub mod flags;
pub mod quality;
pub mod request;
pub mod resolution;
pub mod resource;
pub mod runtime;
pub mod selector;

pub use backend::BackendKind;
pub use capability::{BackendCapabilities, CapabilityCache, SimulationMode, TierSet};
pub use config::UpscalerConfig;
pub use context::{ContextState, UpscalerContext};
pub use error::{Result, UpscaleError};
pub use flags::FeatureFlags;
pub use quality::{optimal_settings, render_resolution_for, QualityTier};
pub use request::{DispatchRequest, DispatchResult, InterpolationRequest, Jitter};
pub use resolution::Resolution;
pub use resource::{CommandListHandle, DeviceHandle, ResourceHandle};
pub use selector::{BackendSelector, Upscaler};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
