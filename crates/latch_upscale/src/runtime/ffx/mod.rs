//! AMD FidelityFX FSR3 runtime (upscaler + frame interpolation)

#[cfg(feature = "ffx-sdk")]
mod linked;
#[cfg(feature = "ffx-sdk")]
mod sys;

#[cfg(feature = "ffx-sdk")]
pub use linked::FfxRuntime;
#[cfg(not(feature = "ffx-sdk"))]
pub use unlinked::FfxRuntime;

use super::RuntimeError;
use crate::quality::QualityTier;

pub const FFX_OK: u32 = 0;
pub const FFX_ERROR_NOT_IMPLEMENTED: u32 = 4;

/// FSR3 quality mode as numbered by the FidelityFX ABI.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(u32)]
pub enum FfxQualityMode {
    Performance = 0,
    Balanced = 1,
    Quality = 2,
    UltraPerformance = 3,
    UltraQuality = 4,
}

impl FfxQualityMode {
    pub fn from_tier(tier: QualityTier) -> Self {
        match tier {
            QualityTier::UltraPerformance => FfxQualityMode::UltraPerformance,
            QualityTier::Performance => FfxQualityMode::Performance,
            QualityTier::Balanced => FfxQualityMode::Balanced,
            QualityTier::Quality => FfxQualityMode::Quality,
            QualityTier::UltraQuality => FfxQualityMode::UltraQuality,
        }
    }
}

#[cfg_attr(not(feature = "ffx-sdk"), allow(dead_code))]
pub(crate) fn check(call: &'static str, code: u32) -> Result<(), RuntimeError> {
    match code {
        FFX_OK => Ok(()),
        FFX_ERROR_NOT_IMPLEMENTED => Err(RuntimeError::Unsupported(call)),
        code => Err(RuntimeError::Status { call, code }),
    }
}

/// Frame index as sent to FSR3, where 0 restarts temporal history.
///
/// Host indices are folded into `1..=u32::MAX` so a long session never hits 0
/// by wrapping around.
#[cfg_attr(not(feature = "ffx-sdk"), allow(dead_code))]
pub(crate) fn frame_index(index: u64, reset: bool) -> u32 {
    if reset {
        0
    } else {
        (index % u32::MAX as u64) as u32 + 1
    }
}

#[cfg(not(feature = "ffx-sdk"))]
mod unlinked {
    use crate::backend::BackendKind;
    use crate::capability::TierSet;
    use crate::resource::DeviceHandle;
    use crate::runtime::{EvaluateParams, FeatureHandle, RuntimeError, SessionDesc, VendorRuntime};

    /// FidelityFX entry point for builds without the SDK.
    #[derive(Debug, Default)]
    pub struct FfxRuntime;

    impl FfxRuntime {
        pub fn new() -> Self {
            Self
        }
    }

    impl VendorRuntime for FfxRuntime {
        fn kind(&self) -> BackendKind {
            BackendKind::Fsr
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_modes_are_distinct() {
        let mut raw: Vec<u32> = QualityTier::ALL
            .into_iter()
            .map(|tier| FfxQualityMode::from_tier(tier) as u32)
            .collect();
        raw.sort_unstable();
        assert_eq!(raw, vec![0, 1, 2, 3, 4]);
        assert_eq!(FfxQualityMode::from_tier(QualityTier::Quality) as u32, 2);
    }

    #[test]
    fn ffx_ok_is_zero() {
        assert!(check("ffxFsr3UpscalerContextDispatch", FFX_OK).is_ok());
        // FFX_ERROR_NULL_DEVICE
        assert_eq!(
            check("ffxFsr3UpscalerContextDispatch", 5),
            Err(RuntimeError::Status {
                call: "ffxFsr3UpscalerContextDispatch",
                code: 5,
            })
        );
        assert_eq!(
            check("ffxFsr3FrameInterpolationContextCreate", FFX_ERROR_NOT_IMPLEMENTED),
            Err(RuntimeError::Unsupported("ffxFsr3FrameInterpolationContextCreate"))
        );
    }

    #[test]
    fn frame_index_is_zero_only_on_reset() {
        assert_eq!(frame_index(0, true), 0);
        assert_eq!(frame_index(12_345, true), 0);
        assert_eq!(frame_index(0, false), 1);
        assert_eq!(frame_index(41, false), 42);

        let wrap = u32::MAX as u64;
        assert_eq!(frame_index(wrap - 1, false), u32::MAX);
        assert_eq!(frame_index(wrap, false), 1);
        assert_eq!(frame_index(1 << 32, false), 2);
        assert_eq!(frame_index(u64::MAX, false), 1);
    }
}
