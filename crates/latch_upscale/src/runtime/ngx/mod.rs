//! NVIDIA NGX (DLSS) runtime

#[cfg(feature = "ngx-sdk")]
mod linked;
#[cfg(feature = "ngx-sdk")]
mod sys;

#[cfg(feature = "ngx-sdk")]
pub use linked::NgxRuntime;
#[cfg(not(feature = "ngx-sdk"))]
pub use unlinked::NgxRuntime;

use super::RuntimeError;
use crate::quality::QualityTier;

pub const NGX_RESULT_SUCCESS: u32 = 0x1;
pub const NGX_RESULT_FEATURE_NOT_SUPPORTED: u32 = 0xBEEF_0001;

/// DLSS quality setting as numbered by the NGX ABI.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum NgxQuality {
    MaxPerformance = 0,
    Balanced = 1,
    MaxQuality = 2,
    UltraPerformance = 3,
    UltraQuality = 4,
}

impl NgxQuality {
    pub fn from_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::UltraPerformance => NgxQuality::UltraPerformance,
            QualityTier::Performance => NgxQuality::MaxPerformance,
            QualityTier::Balanced => NgxQuality::Balanced,
            QualityTier::Quality => NgxQuality::MaxQuality,
            QualityTier::UltraQuality => NgxQuality::UltraQuality,
        }
    }

    /// Map a raw capability entry back to a tier. Unknown values are dropped.
    pub fn tier_from_raw(raw: u32) -> Option<QualityTier> {
        let tier = match raw {
            0 => QualityTier::Performance,
            1 => QualityTier::Balanced,
            2 => QualityTier::Quality,
            3 => QualityTier::UltraPerformance,
            4 => QualityTier::UltraQuality,
            _ => return None,
        };
        Some(tier)
    }
}

#[cfg_attr(not(feature = "ngx-sdk"), allow(dead_code))]
pub(crate) fn check(call: &'static str, code: u32) -> Result<(), RuntimeError> {
    match code {
        NGX_RESULT_SUCCESS => Ok(()),
        NGX_RESULT_FEATURE_NOT_SUPPORTED => Err(RuntimeError::Unsupported(call)),
        code => Err(RuntimeError::Status { call, code }),
    }
}

#[cfg(not(feature = "ngx-sdk"))]
mod unlinked {
    use crate::backend::BackendKind;
    use crate::capability::TierSet;
    use crate::resource::DeviceHandle;
    use crate::runtime::{EvaluateParams, FeatureHandle, RuntimeError, SessionDesc, VendorRuntime};

    /// NGX entry point for builds without the SDK. Every call reports
    /// [`RuntimeError::NotLinked`].
    #[derive(Debug, Default)]
    pub struct NgxRuntime;

    impl NgxRuntime {
        pub fn new() -> Self {
            Self
        }
    }

    impl VendorRuntime for NgxRuntime {
        fn kind(&self) -> BackendKind {
            BackendKind::Dlss
        }

        fn handshake(&self, _device: Option<DeviceHandle>) -> Result<(), RuntimeError> {
            Err(RuntimeError::NotLinked)
        }

        fn supported_tiers(&self) -> Result<TierSet, RuntimeError> {
            Err(RuntimeError::NotLinked)
        }

        fn scratch_size(&self, _desc: &SessionDesc) -> Result<usize, RuntimeError> {
            Err(RuntimeError::NotLinked)
        }

        fn create_feature(&self, _desc: &SessionDesc) -> Result<FeatureHandle, RuntimeError> {
            Err(RuntimeError::NotLinked)
        }

        fn evaluate(&self, _feature: FeatureHandle, _params: &EvaluateParams) -> Result<(), RuntimeError> {
            Err(RuntimeError::NotLinked)
        }

        fn release(&self, _feature: FeatureHandle) {}
    }
}
