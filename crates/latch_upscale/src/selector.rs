//! Backend selection and the host facade
//!
//! [`BackendSelector`] walks a preference list against the probed
//! capabilities and falls back to passthrough when nothing else fits.
//! [`Upscaler`] wraps one selected context for a host and moves to the next
//! backend when the active one fails at runtime.

use crate::backend::{BackendKind, VendorBackend};
use crate::capability::CapabilityCache;
use crate::config::UpscalerConfig;
use crate::context::{UpscalerContext, DEFAULT_SHARPNESS};
use crate::error::{Result, UpscaleError};
use crate::flags::FeatureFlags;
use crate::quality::{render_resolution_for, QualityTier};
use crate::request::{DispatchRequest, DispatchResult, InterpolationRequest};
use crate::resolution::Resolution;
use crate::resource::DeviceHandle;
use crate::runtime::SessionDesc;

pub struct BackendSelector<'a> {
    cache: &'a CapabilityCache,
}

impl BackendSelector<'static> {
    /// Selector over the process-wide capability cache.
    pub fn global() -> Self {
        Self::new(CapabilityCache::global())
    }
}

impl<'a> BackendSelector<'a> {
    pub fn new(cache: &'a CapabilityCache) -> Self {
        Self { cache }
    }

    /// First backend in `preferred` that supports `tier`, as an uncreated
    /// context. Passthrough when none does.
    pub fn select(&self, preferred: &[BackendKind], tier: QualityTier) -> UpscalerContext {
        for &kind in preferred {
            if let Some(context) = self.candidate(kind, tier) {
                tracing::info!("selected {} for {}", kind, tier);
                return context;
            }
        }

        tracing::info!("no preferred backend supports {}, using passthrough", tier);
        UpscalerContext::passthrough()
    }

    /// Select and create in one step.
    ///
    /// A backend whose create fails with an unsupported configuration or an
    /// internal failure is skipped. Invalid dimensions fail immediately since
    /// no backend could accept them.
    pub fn select_and_create(
        &self,
        preferred: &[BackendKind],
        device: DeviceHandle,
        input: Resolution,
        output: Resolution,
        tier: QualityTier,
        flags: FeatureFlags,
    ) -> Result<UpscalerContext> {
        let desc = SessionDesc {
            device,
            input,
            output,
            tier,
            flags,
            sharpness: DEFAULT_SHARPNESS,
        };
        self.create_session(preferred, &desc)
    }

    /// [`BackendSelector::select_and_create`] with an explicit sharpness.
    pub fn create_session(&self, preferred: &[BackendKind], desc: &SessionDesc) -> Result<UpscalerContext> {
        self.create_session_with(preferred, desc, &mut Vec::new())
    }

    /// As [`BackendSelector::create_session`], recording in `failed` every
    /// backend whose create hit an internal failure.
    fn create_session_with(
        &self,
        preferred: &[BackendKind],
        desc: &SessionDesc,
        failed: &mut Vec<BackendKind>,
    ) -> Result<UpscalerContext> {
        for &kind in preferred {
            let Some(mut context) = self.candidate(kind, desc.tier) else {
                continue;
            };
            match Self::create(&mut context, desc) {
                Ok(()) => return Ok(context),
                Err(err) if err.is_backend_fallback() => {
                    tracing::warn!("{} could not be created: {}", kind, err);
                    if matches!(err, UpscaleError::BackendInternalFailure { .. }) && !failed.contains(&kind) {
                        failed.push(kind);
                    }
                }
                Err(err) => return Err(err),
            }
        }

        let mut context = UpscalerContext::passthrough();
        Self::create(&mut context, desc)?;
        Ok(context)
    }

    fn create(context: &mut UpscalerContext, desc: &SessionDesc) -> Result<()> {
        context.set_sharpness(desc.sharpness);
        context.create(desc.device, desc.input, desc.output, desc.tier, desc.flags)
    }

    fn candidate(&self, kind: BackendKind, tier: QualityTier) -> Option<UpscalerContext> {
        if !kind.is_vendor() {
            return Some(UpscalerContext::passthrough());
        }

        let capabilities = self.cache.probe(kind);
        if !capabilities.supports(tier) {
            tracing::debug!("{} skipped: {} not supported", kind, tier);
            return None;
        }
        let runtime = self.cache.runtime(kind)?;
        Some(UpscalerContext::new(Box::new(VendorBackend::new(runtime)), capabilities))
    }
}

/// One upscaling session as the host sees it.
pub struct Upscaler<'a> {
    selector: BackendSelector<'a>,
    config: UpscalerConfig,
    device: DeviceHandle,
    display: Resolution,
    render: Resolution,
    blacklist: Vec<BackendKind>,
    context: UpscalerContext,
}

impl Upscaler<'static> {
    /// Build against the process-wide capability cache.
    pub fn new(config: UpscalerConfig, display: Resolution, device: DeviceHandle) -> Result<Self> {
        Self::with_cache(CapabilityCache::global(), config, display, device)
    }
}

impl<'a> Upscaler<'a> {
    pub fn with_cache(
        cache: &'a CapabilityCache,
        config: UpscalerConfig,
        display: Resolution,
        device: DeviceHandle,
    ) -> Result<Self> {
        let selector = BackendSelector::new(cache);
        let render = render_resolution_for(display, config.quality_tier);
        let mut blacklist = Vec::new();
        let context = Self::build(&selector, &config, &mut blacklist, device, render, display)?;

        Ok(Self {
            selector,
            config,
            device,
            display,
            render,
            blacklist,
            context,
        })
    }

    fn build(
        selector: &BackendSelector<'_>,
        config: &UpscalerConfig,
        blacklist: &mut Vec<BackendKind>,
        device: DeviceHandle,
        render: Resolution,
        display: Resolution,
    ) -> Result<UpscalerContext> {
        let preferred: Vec<BackendKind> = config
            .preference()
            .into_iter()
            .filter(|kind| !blacklist.contains(kind))
            .collect();
        let desc = SessionDesc {
            device,
            input: render,
            output: display,
            tier: config.quality_tier,
            flags: config.effective_flags(),
            sharpness: config.sharpness(),
        };
        selector.create_session_with(&preferred, &desc, blacklist)
    }

    fn rebuild(&mut self) -> Result<()> {
        self.context.destroy();
        self.context = Self::build(
            &self.selector,
            &self.config,
            &mut self.blacklist,
            self.device,
            self.render,
            self.display,
        )?;
        Ok(())
    }

    /// Drop the failing backend for the rest of this upscaler's life.
    fn fail_over(&mut self, err: &UpscaleError) {
        let UpscaleError::BackendInternalFailure { backend, .. } = err else {
            return;
        };
        tracing::warn!("{} failed, switching backend: {}", backend, err);
        if !self.blacklist.contains(backend) {
            self.blacklist.push(*backend);
        }
        match self.rebuild() {
            Ok(()) => tracing::info!("now upscaling with {}", self.context.backend_kind()),
            Err(rebuild) => tracing::error!("failover after {} failed: {}", backend, rebuild),
        }
    }

    /// Upscale one frame. A backend failure is returned for this frame and
    /// the next call runs on the next usable backend.
    pub fn dispatch(&mut self, request: &DispatchRequest) -> Result<DispatchResult> {
        let result = self.context.dispatch(request);
        if let Err(err) = &result {
            self.fail_over(err);
        }
        result
    }

    pub fn interpolate(&mut self, request: &InterpolationRequest) -> Result<DispatchResult> {
        let result = self.context.interpolate(request);
        if let Err(err) = &result {
            self.fail_over(err);
        }
        result
    }

    /// Destroy the session and recreate it for a new display size.
    pub fn resize(&mut self, display: Resolution) -> Result<()> {
        self.display = display;
        self.render = render_resolution_for(display, self.config.quality_tier);
        tracing::info!("resizing to {} (render {})", self.display, self.render);
        self.rebuild()
    }

    /// Takes effect on the next dispatch.
    pub fn set_sharpness(&mut self, sharpness: f32) {
        self.config.sharpness = sharpness;
        self.context.set_sharpness(sharpness);
    }

    pub fn destroy(&mut self) {
        self.context.destroy();
    }

    pub fn render_resolution(&self) -> Resolution {
        self.render
    }

    pub fn display_resolution(&self) -> Resolution {
        self.display
    }

    pub fn active_backend(&self) -> BackendKind {
        self.context.backend_kind()
    }

    /// Backends dropped after an internal failure at create or at runtime.
    pub fn blacklisted(&self) -> &[BackendKind] {
        &self.blacklist
    }

    pub fn config(&self) -> &UpscalerConfig {
        &self.config
    }

    pub fn context(&self) -> &UpscalerContext {
        &self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::{
        BackendCapabilities, CapabilitySource, ProbeOutcome, RuntimeProbe, TierSet,
    };
    use crate::context::ContextState;
    use crate::resource::ResourceHandle;
    use crate::runtime::{
        EvaluateParams, FeatureHandle, RuntimeError, SimulatedRuntime, VendorRuntime,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type RuntimeResult<T> = std::result::Result<T, RuntimeError>;

    /// Looks healthy at probe time, then fails.
    struct BrokenRuntime {
        fail_create: bool,
        creates: AtomicUsize,
    }

    impl BrokenRuntime {
        fn new(fail_create: bool) -> Self {
            Self {
                fail_create,
                creates: AtomicUsize::new(0),
            }
        }

        fn creates(&self) -> usize {
            self.creates.load(Ordering::SeqCst)
        }
    }

    impl VendorRuntime for BrokenRuntime {
        fn kind(&self) -> BackendKind {
            BackendKind::Dlss
        }

        fn handshake(&self, _device: Option<DeviceHandle>) -> RuntimeResult<()> {
            Ok(())
        }

        fn supported_tiers(&self) -> RuntimeResult<TierSet> {
            Ok(TierSet::all())
        }

        fn scratch_size(&self, _desc: &SessionDesc) -> RuntimeResult<usize> {
            Ok(0)
        }

        fn create_feature(&self, _desc: &SessionDesc) -> RuntimeResult<FeatureHandle> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            if self.fail_create {
                Err(RuntimeError::Status {
                    call: "NVSDK_NGX_CreateFeature",
                    code: 0xBAD0_0001,
                })
            } else {
                Ok(FeatureHandle(1))
            }
        }

        fn evaluate(&self, _feature: FeatureHandle, _params: &EvaluateParams) -> RuntimeResult<()> {
            Err(RuntimeError::Status {
                call: "NVSDK_NGX_EvaluateFeature",
                code: 0xBAD0_0002,
            })
        }

        fn release(&self, _feature: FeatureHandle) {}
    }

    struct FakeProbe {
        runtimes: Vec<Arc<dyn VendorRuntime>>,
    }

    impl RuntimeProbe for FakeProbe {
        fn probe(&self, kind: BackendKind) -> ProbeOutcome {
            if kind == BackendKind::Passthrough {
                return ProbeOutcome {
                    capabilities: BackendCapabilities::passthrough(),
                    runtime: None,
                };
            }
            match self.runtimes.iter().find(|runtime| runtime.kind() == kind) {
                Some(runtime) => ProbeOutcome {
                    capabilities: BackendCapabilities {
                        kind,
                        tiers: runtime.supported_tiers().unwrap_or(TierSet::EMPTY),
                        source: CapabilitySource::Runtime,
                        frame_interpolation: runtime.supports_interpolation(),
                    },
                    runtime: Some(runtime.clone()),
                },
                None => ProbeOutcome::unavailable(kind),
            }
        }
    }

    fn cache(runtimes: Vec<Arc<dyn VendorRuntime>>) -> CapabilityCache {
        CapabilityCache::new(FakeProbe { runtimes })
    }

    fn device() -> DeviceHandle {
        DeviceHandle::from_raw(0xd0).unwrap()
    }

    fn frame(index: u64) -> DispatchRequest {
        DispatchRequest {
            color: ResourceHandle::from_raw(0x100),
            motion_vectors: ResourceHandle::from_raw(0x200),
            exposure: ResourceHandle::from_raw(0x300),
            output: ResourceHandle::from_raw(0x400),
            frame_index: index,
            ..Default::default()
        }
    }

    #[test]
    fn empty_preference_falls_back_to_passthrough() {
        let cache = cache(Vec::new());
        let selector = BackendSelector::new(&cache);
        let mut context = selector.select(&[], QualityTier::Quality);
        assert_eq!(context.backend_kind(), BackendKind::Passthrough);

        context
            .create(
                device(),
                Resolution::new(1280, 720),
                Resolution::new(1920, 1080),
                QualityTier::Quality,
                FeatureFlags::empty(),
            )
            .unwrap();
        let result = context.dispatch(&frame(0)).unwrap();
        assert_eq!(result.output, ResourceHandle::from_raw(0x100).unwrap());
    }

    #[test]
    fn unsupported_tier_falls_back_to_passthrough() {
        let dlss = SimulatedRuntime::new(BackendKind::Dlss).with_tiers(TierSet::EMPTY.with(QualityTier::Quality));
        let cache = cache(vec![Arc::new(dlss)]);
        assert!(cache.probe(BackendKind::Dlss).is_available());
        assert!(!cache.probe(BackendKind::Fsr).is_available());

        let selector = BackendSelector::new(&cache);
        let mut context = selector.select(&[BackendKind::Dlss, BackendKind::Fsr], QualityTier::Performance);
        assert_eq!(context.backend_kind(), BackendKind::Passthrough);

        context
            .create(
                device(),
                Resolution::new(960, 540),
                Resolution::new(1920, 1080),
                QualityTier::Performance,
                FeatureFlags::empty(),
            )
            .unwrap();
        let result = context.dispatch(&frame(0)).unwrap();
        assert_eq!(result.output, ResourceHandle::from_raw(0x100).unwrap());

        // the supported tier still picks the vendor
        let context = selector.select(&[BackendKind::Dlss, BackendKind::Fsr], QualityTier::Quality);
        assert_eq!(context.backend_kind(), BackendKind::Dlss);
    }

    #[test]
    fn first_capable_backend_wins() {
        let cache = cache(vec![Arc::new(SimulatedRuntime::new(BackendKind::Fsr))]);
        let selector = BackendSelector::new(&cache);
        let context = selector.select(&[BackendKind::Dlss, BackendKind::Fsr], QualityTier::Quality);
        assert_eq!(context.backend_kind(), BackendKind::Fsr);
        assert_eq!(context.state(), ContextState::Uninitialized);
    }

    #[test]
    fn create_failure_moves_to_next_backend() {
        let cache = cache(vec![
            Arc::new(BrokenRuntime::new(true)),
            Arc::new(SimulatedRuntime::new(BackendKind::Fsr)),
        ]);
        let selector = BackendSelector::new(&cache);
        let context = selector
            .select_and_create(
                &[BackendKind::Dlss, BackendKind::Fsr],
                device(),
                Resolution::new(1280, 720),
                Resolution::new(1920, 1080),
                QualityTier::Quality,
                FeatureFlags::empty(),
            )
            .unwrap();
        assert_eq!(context.backend_kind(), BackendKind::Fsr);
        assert_eq!(context.state(), ContextState::Created);
    }

    #[test]
    fn create_failure_is_blacklisted() {
        let broken = Arc::new(BrokenRuntime::new(true));
        let cache = cache(vec![
            broken.clone() as Arc<dyn VendorRuntime>,
            Arc::new(SimulatedRuntime::new(BackendKind::Fsr)),
        ]);
        let mut upscaler =
            Upscaler::with_cache(&cache, UpscalerConfig::default(), Resolution::new(1920, 1080), device())
                .unwrap();
        assert_eq!(upscaler.active_backend(), BackendKind::Fsr);
        assert_eq!(upscaler.blacklisted(), &[BackendKind::Dlss]);
        assert_eq!(broken.creates(), 1);

        upscaler.resize(Resolution::new(2560, 1440)).unwrap();
        assert_eq!(upscaler.active_backend(), BackendKind::Fsr);
        assert_eq!(broken.creates(), 1);
    }

    #[test]
    fn vendor_default_picks_matching_backend() {
        let cache = cache(vec![
            Arc::new(SimulatedRuntime::new(BackendKind::Dlss)),
            Arc::new(SimulatedRuntime::new(BackendKind::Fsr)),
        ]);
        let config = UpscalerConfig::from_json(r#"{ "backend_preference": "auto", "gpu_vendor_id": 4098 }"#).unwrap();
        let upscaler = Upscaler::with_cache(&cache, config, Resolution::new(1920, 1080), device()).unwrap();
        assert_eq!(upscaler.active_backend(), BackendKind::Fsr);

        let config = UpscalerConfig::from_json(r#"{ "backend_preference": [], "gpu_vendor_id": 4318 }"#).unwrap();
        let upscaler = Upscaler::with_cache(&cache, config, Resolution::new(1920, 1080), device()).unwrap();
        assert_eq!(upscaler.active_backend(), BackendKind::Dlss);
    }

    #[test]
    fn invalid_dimensions_are_not_retried() {
        let cache = cache(vec![Arc::new(SimulatedRuntime::new(BackendKind::Fsr))]);
        let selector = BackendSelector::new(&cache);
        let result = selector.select_and_create(
            &[BackendKind::Fsr],
            device(),
            Resolution::new(512, 512),
            Resolution::new(256, 256),
            QualityTier::Quality,
            FeatureFlags::empty(),
        );
        assert!(matches!(result, Err(UpscaleError::InvalidDimensions { .. })));
    }

    #[test]
    fn upscaler_fails_over_after_backend_failure() {
        let cache = cache(vec![
            Arc::new(BrokenRuntime::new(false)),
            Arc::new(SimulatedRuntime::new(BackendKind::Fsr)),
        ]);
        let mut upscaler =
            Upscaler::with_cache(&cache, UpscalerConfig::default(), Resolution::new(1920, 1080), device())
                .unwrap();
        assert_eq!(upscaler.active_backend(), BackendKind::Dlss);
        assert_eq!(upscaler.render_resolution(), Resolution::new(1286, 723));

        let err = upscaler.dispatch(&frame(0)).unwrap_err();
        assert!(matches!(
            err,
            UpscaleError::BackendInternalFailure { backend: BackendKind::Dlss, .. }
        ));
        assert_eq!(upscaler.active_backend(), BackendKind::Fsr);
        assert_eq!(upscaler.blacklisted(), &[BackendKind::Dlss]);

        let result = upscaler.dispatch(&frame(1)).unwrap();
        assert_eq!(result.output, ResourceHandle::from_raw(0x400).unwrap());
        // fresh context, fresh history
        assert!(result.history_reset);
    }

    #[test]
    fn failover_ends_at_passthrough() {
        let cache = cache(vec![Arc::new(BrokenRuntime::new(false))]);
        let mut config = UpscalerConfig::default();
        config.backend_preference = vec![BackendKind::Dlss];
        let mut upscaler =
            Upscaler::with_cache(&cache, config, Resolution::new(1920, 1080), device()).unwrap();

        assert!(upscaler.dispatch(&frame(0)).is_err());
        assert_eq!(upscaler.active_backend(), BackendKind::Passthrough);
        assert_eq!(
            upscaler.dispatch(&frame(1)).unwrap().output,
            ResourceHandle::from_raw(0x100).unwrap()
        );
    }

    #[test]
    fn resize_recreates_session() {
        let runtime = Arc::new(SimulatedRuntime::new(BackendKind::Fsr));
        let cache = cache(vec![runtime.clone() as Arc<dyn VendorRuntime>]);
        let mut config = UpscalerConfig::default();
        config.quality_tier = QualityTier::Performance;
        let mut upscaler =
            Upscaler::with_cache(&cache, config, Resolution::new(1920, 1080), device()).unwrap();
        assert_eq!(upscaler.render_resolution(), Resolution::new(960, 540));

        upscaler.resize(Resolution::new(2560, 1440)).unwrap();
        assert_eq!(upscaler.render_resolution(), Resolution::new(1280, 720));
        assert_eq!(upscaler.context().output_resolution(), Resolution::new(2560, 1440));
        assert_eq!(runtime.live_features(), 1);

        upscaler.destroy();
        assert_eq!(runtime.live_features(), 0);
    }
}
