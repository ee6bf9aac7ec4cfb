//! Runtime stand-in used when simulated support is enabled
//!
//! Accepts every tier and every well-formed call without touching the GPU,
//! so host code can be exercised on machines without the vendor SDK.

use super::{
    EvaluateParams, FeatureHandle, InterpolateParams, RuntimeError, SessionDesc, VendorRuntime,
};
use crate::backend::BackendKind;
use crate::capability::TierSet;
use crate::resource::DeviceHandle;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Output pixels covered by one scratch history slot (8x8 tiles).
const TILE_PIXELS: u64 = 64;

pub struct SimulatedRuntime {
    kind: BackendKind,
    tiers: TierSet,
    interpolation: bool,
    next_feature: AtomicU64,
    live: Mutex<HashSet<FeatureHandle>>,
    evaluations: AtomicU64,
}

impl SimulatedRuntime {
    /// Simulates `kind`. Frame interpolation follows the real vendor: only
    /// FidelityFX offers it.
    pub fn new(kind: BackendKind) -> Self {
        Self {
            kind,
            tiers: TierSet::all(),
            interpolation: kind == BackendKind::Fsr,
            next_feature: AtomicU64::new(1),
            live: Mutex::new(HashSet::new()),
            evaluations: AtomicU64::new(0),
        }
    }

    /// Report only `tiers`, as a device with partial support would.
    pub fn with_tiers(mut self, tiers: TierSet) -> Self {
        self.tiers = tiers;
        self
    }

    /// Feature instances created and not yet released.
    pub fn live_features(&self) -> usize {
        self.live.lock().map(|live| live.len()).unwrap_or(0)
    }

    /// Successful evaluate and interpolate calls so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn ensure_live(&self, feature: FeatureHandle) -> Result<(), RuntimeError> {
        let live = self
            .live
            .lock()
            .map_err(|_| RuntimeError::UnknownFeature(feature))?;
        if live.contains(&feature) {
            Ok(())
        } else {
            Err(RuntimeError::UnknownFeature(feature))
        }
    }
}

impl VendorRuntime for SimulatedRuntime {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn handshake(&self, _device: Option<DeviceHandle>) -> Result<(), RuntimeError> {
        Ok(())
    }

    fn supported_tiers(&self) -> Result<TierSet, RuntimeError> {
        Ok(self.tiers)
    }

    fn supports_interpolation(&self) -> bool {
        self.interpolation
    }

    fn scratch_size(&self, desc: &SessionDesc) -> Result<usize, RuntimeError> {
        let tiles = desc.output.pixel_count().div_ceil(TILE_PIXELS);
        Ok((tiles * std::mem::size_of::<u32>() as u64) as usize)
    }

    fn create_feature(&self, _desc: &SessionDesc) -> Result<FeatureHandle, RuntimeError> {
        let feature = FeatureHandle(self.next_feature.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut live) = self.live.lock() {
            live.insert(feature);
        }
        Ok(feature)
    }

    fn evaluate(&self, feature: FeatureHandle, _params: &EvaluateParams) -> Result<(), RuntimeError> {
        self.ensure_live(feature)?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn interpolate(
        &self,
        feature: FeatureHandle,
        _params: &InterpolateParams,
    ) -> Result<(), RuntimeError> {
        if !self.interpolation {
            return Err(RuntimeError::Unsupported("frame interpolation"));
        }
        self.ensure_live(feature)?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    fn release(&self, feature: FeatureHandle) {
        if let Ok(mut live) = self.live.lock() {
            live.remove(&feature);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::FeatureFlags;
    use crate::quality::QualityTier;
    use crate::resolution::Resolution;

    fn desc() -> SessionDesc {
        SessionDesc {
            device: DeviceHandle::from_raw(0x10).unwrap(),
            input: Resolution::new(1280, 720),
            output: Resolution::new(1920, 1080),
            tier: QualityTier::Quality,
            flags: FeatureFlags::empty(),
            sharpness: 0.5,
        }
    }

    #[test]
    fn scratch_scales_with_output() {
        let runtime = SimulatedRuntime::new(BackendKind::Dlss);
        // 1920x1080 / 64 = 32400 tiles, 4 bytes each
        assert_eq!(runtime.scratch_size(&desc()).unwrap(), 129_600);
    }

    #[test]
    fn released_features_are_forgotten() {
        let runtime = SimulatedRuntime::new(BackendKind::Fsr);
        let feature = runtime.create_feature(&desc()).unwrap();
        assert_eq!(runtime.live_features(), 1);

        runtime.release(feature);
        assert_eq!(runtime.live_features(), 0);
        assert_eq!(runtime.ensure_live(feature), Err(RuntimeError::UnknownFeature(feature)));
    }

    #[test]
    fn only_fidelityfx_interpolates() {
        assert!(SimulatedRuntime::new(BackendKind::Fsr).supports_interpolation());
        assert!(!SimulatedRuntime::new(BackendKind::Dlss).supports_interpolation());
    }
}
