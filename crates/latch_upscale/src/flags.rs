//! Session feature flags

bitflags::bitflags! {
    /// Creation flags for an upscaling session.
    ///
    /// Bit positions follow the NGX DLSS create flags so the set can be handed
    /// to that runtime without translation.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[repr(transparent)]
    pub struct FeatureFlags: u32 {
        /// Color input is HDR (linear, unbounded)
        const IS_HDR = 1 << 0;
        /// Motion vectors are at render resolution rather than display
        const MOTION_VECTORS_LOW_RES = 1 << 1;
        /// Depth buffer uses reversed Z
        const DEPTH_INVERTED = 1 << 2;
        /// Apply the backend's sharpening pass
        const DO_SHARPENING = 1 << 3;
        /// Backend computes exposure itself; no exposure texture needed
        const AUTO_EXPOSURE = 1 << 4;
        /// Motion vectors include camera jitter
        const MOTION_VECTORS_JITTERED = 1 << 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_match_ngx_layout() {
        assert_eq!(FeatureFlags::IS_HDR.bits(), 0x01);
        assert_eq!(FeatureFlags::MOTION_VECTORS_LOW_RES.bits(), 0x02);
        assert_eq!(FeatureFlags::DEPTH_INVERTED.bits(), 0x04);
        assert_eq!(FeatureFlags::DO_SHARPENING.bits(), 0x08);
        assert_eq!(FeatureFlags::AUTO_EXPOSURE.bits(), 0x10);
        assert_eq!(FeatureFlags::MOTION_VECTORS_JITTERED.bits(), 0x20);
    }
}
