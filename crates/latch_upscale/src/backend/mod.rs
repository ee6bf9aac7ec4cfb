//! Upscaling backends
//!
//! Every backend implements [`UpscaleBackend`]; the context drives it through
//! the shared lifecycle and never looks at which vendor is underneath.

mod passthrough;
mod vendor;

pub use passthrough::PassthroughBackend;
pub use vendor::VendorBackend;

use crate::error::Result;
use crate::request::{DispatchRequest, InterpolationRequest};
use crate::resource::ResourceHandle;
use crate::runtime::SessionDesc;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upscaling backend type
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// NVIDIA DLSS through the NGX runtime
    Dlss,
    /// AMD FSR3 through the FidelityFX runtime
    Fsr,
    /// Software fallback, always available
    Passthrough,
}

/// PCI vendor ids used to pick a default backend order.
pub const PCI_VENDOR_NVIDIA: u32 = 0x10DE;
pub const PCI_VENDOR_AMD: u32 = 0x1002;
pub const PCI_VENDOR_INTEL: u32 = 0x8086;

impl BackendKind {
    pub const COUNT: usize = 3;

    pub const ALL: [BackendKind; Self::COUNT] =
        [BackendKind::Dlss, BackendKind::Fsr, BackendKind::Passthrough];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Backed by a vendor runtime rather than built in.
    pub fn is_vendor(self) -> bool {
        !matches!(self, BackendKind::Passthrough)
    }

    /// Default backend order for a GPU from `pci_vendor_id`.
    ///
    /// NVIDIA parts prefer DLSS and keep FSR as a second choice. AMD and
    /// Intel only run FSR. Unknown vendors get an empty list, which leaves
    /// passthrough.
    pub fn preference_for_vendor(pci_vendor_id: u32) -> Vec<BackendKind> {
        match pci_vendor_id {
            PCI_VENDOR_NVIDIA => vec![BackendKind::Dlss, BackendKind::Fsr],
            PCI_VENDOR_AMD | PCI_VENDOR_INTEL => vec![BackendKind::Fsr],
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Dlss => "NVIDIA DLSS",
            BackendKind::Fsr => "AMD FSR",
            BackendKind::Passthrough => "Passthrough",
        };
        f.write_str(name)
    }
}

/// One evaluation as seen by a backend, after the context has settled the
/// temporal history question.
#[derive(Debug, Clone, Copy)]
pub struct FrameContext<'a> {
    pub request: &'a DispatchRequest,
    pub reset_history: bool,
    pub sharpness: f32,
}

pub trait UpscaleBackend: Send {
    fn kind(&self) -> BackendKind;

    /// Open a session for `desc`. Called once per context.
    fn create(&mut self, desc: &SessionDesc) -> Result<()>;

    /// Upscale one frame and return the resource holding the result.
    fn evaluate(&mut self, frame: FrameContext<'_>) -> Result<ResourceHandle>;

    /// Generate an intermediate frame. `factor` is already clamped to [0, 1].
    fn interpolate(&mut self, request: &InterpolationRequest, factor: f32) -> Result<ResourceHandle>;

    /// Release the session. Must be safe to call when no session is open.
    fn destroy(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_are_dense() {
        for (i, kind) in BackendKind::ALL.into_iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn serde_names() {
        let kinds: Vec<BackendKind> = serde_json::from_str(r#"["dlss", "fsr", "passthrough"]"#).unwrap();
        assert_eq!(kinds, BackendKind::ALL.to_vec());
        assert_eq!(BackendKind::Fsr.to_string(), "AMD FSR");
        assert!(!BackendKind::Passthrough.is_vendor());
    }

    #[test]
    fn nvidia_prefers_dlss_then_fsr() {
        assert_eq!(
            BackendKind::preference_for_vendor(0x10DE),
            vec![BackendKind::Dlss, BackendKind::Fsr]
        );
    }

    #[test]
    fn amd_and_intel_use_fsr() {
        assert_eq!(BackendKind::preference_for_vendor(0x1002), vec![BackendKind::Fsr]);
        assert_eq!(BackendKind::preference_for_vendor(0x8086), vec![BackendKind::Fsr]);
    }

    #[test]
    fn unknown_vendor_has_no_preference() {
        assert!(BackendKind::preference_for_vendor(0x5143).is_empty());
        assert!(BackendKind::preference_for_vendor(0).is_empty());
    }
}
