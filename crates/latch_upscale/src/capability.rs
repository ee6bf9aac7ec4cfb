//! Backend capability probing
//!
//! A probe asks a vendor runtime, once, which quality tiers it can serve on
//! the current device. The answer cannot change while the process runs, so
//! each backend kind is probed at most once per [`CapabilityCache`].
//!
//! Absence of a vendor runtime is the normal case on most machines and is
//! never an error: the backend simply reports no tiers (or, when simulated
//! support is switched on, every tier backed by [`SimulatedRuntime`]).

use crate::backend::BackendKind;
use crate::quality::QualityTier;
use crate::resource::DeviceHandle;
use crate::runtime::{linked_runtime, RuntimeError, SimulatedRuntime, VendorRuntime};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Set of quality tiers.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TierSet(u8);

impl TierSet {
    pub const EMPTY: TierSet = TierSet(0);

    pub fn all() -> Self {
        QualityTier::ALL.into_iter().collect()
    }

    pub fn insert(&mut self, tier: QualityTier) {
        self.0 |= tier.bit();
    }

    pub fn with(mut self, tier: QualityTier) -> Self {
        self.insert(tier);
        self
    }

    pub fn contains(&self, tier: QualityTier) -> bool {
        self.0 & tier.bit() != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Tiers in ascending scale order.
    pub fn iter(&self) -> impl Iterator<Item = QualityTier> + '_ {
        QualityTier::ALL.into_iter().filter(|tier| self.contains(*tier))
    }
}

impl FromIterator<QualityTier> for TierSet {
    fn from_iter<I: IntoIterator<Item = QualityTier>>(iter: I) -> Self {
        let mut set = TierSet::EMPTY;
        for tier in iter {
            set.insert(tier);
        }
        set
    }
}

impl fmt::Debug for TierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// What to report for a vendor whose runtime is missing.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulationMode {
    /// Missing runtimes report no tiers.
    #[default]
    Disabled,
    /// Missing runtimes report every tier and run on [`SimulatedRuntime`].
    /// Meant for integration testing on machines without the vendor SDK.
    Enabled,
}

/// Where a capability answer came from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CapabilitySource {
    /// The vendor runtime answered.
    Runtime,
    /// Runtime missing; simulated support was enabled.
    Simulated,
    /// Software backend, always available.
    Builtin,
    /// Runtime missing or failed its handshake.
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendCapabilities {
    pub kind: BackendKind,
    pub tiers: TierSet,
    pub source: CapabilitySource,
    pub frame_interpolation: bool,
}

impl BackendCapabilities {
    pub fn unavailable(kind: BackendKind) -> Self {
        Self {
            kind,
            tiers: TierSet::EMPTY,
            source: CapabilitySource::Unavailable,
            frame_interpolation: false,
        }
    }

    pub fn passthrough() -> Self {
        Self {
            kind: BackendKind::Passthrough,
            tiers: TierSet::all(),
            source: CapabilitySource::Builtin,
            frame_interpolation: true,
        }
    }

    pub fn supports(&self, tier: QualityTier) -> bool {
        self.tiers.contains(tier)
    }

    pub fn is_available(&self) -> bool {
        !self.tiers.is_empty()
    }
}

/// Capabilities plus the runtime that will serve them.
#[derive(Clone)]
pub struct ProbeOutcome {
    pub capabilities: BackendCapabilities,
    pub runtime: Option<Arc<dyn VendorRuntime>>,
}

impl ProbeOutcome {
    pub fn unavailable(kind: BackendKind) -> Self {
        Self {
            capabilities: BackendCapabilities::unavailable(kind),
            runtime: None,
        }
    }
}

/// Source of probe answers. Tests swap in their own implementation.
pub trait RuntimeProbe: Send + Sync {
    fn probe(&self, kind: BackendKind) -> ProbeOutcome;
}

/// Looks up the runtime that serves a vendor backend.
pub type RuntimeLink = fn(BackendKind) -> Option<Arc<dyn VendorRuntime>>;

/// Probes the runtimes compiled into this build.
pub struct SystemProbe {
    simulation: SimulationMode,
    device: Option<DeviceHandle>,
    link: RuntimeLink,
}

impl SystemProbe {
    pub fn new(simulation: SimulationMode, device: Option<DeviceHandle>) -> Self {
        Self::with_link(simulation, device, linked_runtime)
    }

    /// Probe through `link` instead of the runtimes compiled into this build.
    pub fn with_link(simulation: SimulationMode, device: Option<DeviceHandle>, link: RuntimeLink) -> Self {
        Self {
            simulation,
            device,
            link,
        }
    }

    fn fallback(&self, kind: BackendKind) -> ProbeOutcome {
        match self.simulation {
            SimulationMode::Disabled => ProbeOutcome::unavailable(kind),
            SimulationMode::Enabled => {
                let runtime: Arc<dyn VendorRuntime> = Arc::new(SimulatedRuntime::new(kind));
                tracing::info!("{} runtime absent, using simulated support", kind);
                ProbeOutcome {
                    capabilities: BackendCapabilities {
                        kind,
                        tiers: TierSet::all(),
                        source: CapabilitySource::Simulated,
                        frame_interpolation: runtime.supports_interpolation(),
                    },
                    runtime: Some(runtime),
                }
            }
        }
    }
}

impl RuntimeProbe for SystemProbe {
    fn probe(&self, kind: BackendKind) -> ProbeOutcome {
        if kind == BackendKind::Passthrough {
            return ProbeOutcome {
                capabilities: BackendCapabilities::passthrough(),
                runtime: None,
            };
        }

        let Some(runtime) = (self.link)(kind) else {
            return self.fallback(kind);
        };

        let tiers = runtime
            .handshake(self.device)
            .and_then(|()| runtime.supported_tiers());

        match tiers {
            Ok(tiers) => {
                tracing::info!("{} runtime present, supports {:?}", kind, tiers);
                ProbeOutcome {
                    capabilities: BackendCapabilities {
                        kind,
                        tiers,
                        source: CapabilitySource::Runtime,
                        frame_interpolation: runtime.supports_interpolation(),
                    },
                    runtime: Some(runtime),
                }
            }
            Err(RuntimeError::NotLinked) => {
                tracing::info!("{} runtime not linked into this build", kind);
                self.fallback(kind)
            }
            Err(err) => {
                tracing::warn!("{} runtime handshake failed: {}", kind, err);
                self.fallback(kind)
            }
        }
    }
}

static GLOBAL: OnceCell<CapabilityCache> = OnceCell::new();

/// Probe results, computed once per backend kind.
pub struct CapabilityCache {
    probe: Box<dyn RuntimeProbe>,
    slots: [OnceCell<ProbeOutcome>; BackendKind::COUNT],
}

impl CapabilityCache {
    pub fn new(probe: impl RuntimeProbe + 'static) -> Self {
        Self {
            probe: Box::new(probe),
            slots: Default::default(),
        }
    }

    /// Cache over the runtimes compiled into this build.
    pub fn system(simulation: SimulationMode, device: Option<DeviceHandle>) -> Self {
        Self::new(SystemProbe::new(simulation, device))
    }

    /// Process-wide cache. Defaults to [`SimulationMode::Disabled`] with no
    /// device unless [`CapabilityCache::install_global`] ran first.
    pub fn global() -> &'static CapabilityCache {
        GLOBAL.get_or_init(|| Self::system(SimulationMode::Disabled, None))
    }

    /// Install the process-wide cache. Fails (handing the cache back) if one
    /// is already in place.
    pub fn install_global(cache: CapabilityCache) -> Result<&'static CapabilityCache, CapabilityCache> {
        GLOBAL.set(cache)?;
        Ok(Self::global())
    }

    pub fn probe(&self, kind: BackendKind) -> BackendCapabilities {
        self.outcome(kind).capabilities.clone()
    }

    /// Runtime that serves `kind`, if the probe found one.
    pub fn runtime(&self, kind: BackendKind) -> Option<Arc<dyn VendorRuntime>> {
        self.outcome(kind).runtime.clone()
    }

    pub fn is_probed(&self, kind: BackendKind) -> bool {
        self.slots[kind.index()].get().is_some()
    }

    fn outcome(&self, kind: BackendKind) -> &ProbeOutcome {
        self.slots[kind.index()].get_or_init(|| {
            tracing::debug!("probing {} capabilities", kind);
            self.probe.probe(kind)
        })
    }
}

/// Probe `kind` through the process-wide cache.
pub fn probe(kind: BackendKind) -> BackendCapabilities {
    CapabilityCache::global().probe(kind)
}
