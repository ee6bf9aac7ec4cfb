use super::{BackendKind, FrameContext, UpscaleBackend};
use crate::error::{Result, UpscaleError};
use crate::flags::FeatureFlags;
use crate::request::InterpolationRequest;
use crate::resource::{ResourceHandle, ResourceSlot};
use crate::runtime::{
    EvaluateParams, FeatureHandle, InterpolateParams, RuntimeError, SessionDesc, VendorRuntime,
};
use std::sync::Arc;

struct Session {
    feature: FeatureHandle,
    desc: SessionDesc,
    /// Host memory reserved at the size the runtime reported. The backend
    /// owns it for the life of the session and never hands it to the
    /// runtime, which keeps its working set behind the feature handle.
    scratch: Vec<u8>,
}

/// Drives any [`VendorRuntime`] through the upscaler lifecycle.
pub struct VendorBackend {
    kind: BackendKind,
    runtime: Arc<dyn VendorRuntime>,
    session: Option<Session>,
}

impl VendorBackend {
    pub fn new(runtime: Arc<dyn VendorRuntime>) -> Self {
        Self {
            kind: runtime.kind(),
            runtime,
            session: None,
        }
    }

    /// Bytes reserved for the open session, 0 when none is open. Released
    /// together with the feature on destroy.
    pub fn scratch_bytes(&self) -> usize {
        self.session.as_ref().map_or(0, |session| session.scratch.len())
    }

    fn failure(&self, err: RuntimeError) -> UpscaleError {
        match err {
            RuntimeError::Unsupported(what) => UpscaleError::UnsupportedConfiguration {
                backend: self.kind,
                what: what.to_string(),
            },
            other => UpscaleError::BackendInternalFailure {
                backend: self.kind,
                reason: other.to_string(),
            },
        }
    }

    fn session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(UpscaleError::NotInitialized)
    }
}

fn require(resource: Option<ResourceHandle>, slot: ResourceSlot) -> Result<ResourceHandle> {
    resource.ok_or(UpscaleError::InvalidResource { slot })
}

impl UpscaleBackend for VendorBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn create(&mut self, desc: &SessionDesc) -> Result<()> {
        let size = self.runtime.scratch_size(desc).map_err(|err| self.failure(err))?;
        let feature = self
            .runtime
            .create_feature(desc)
            .map_err(|err| self.failure(err))?;

        tracing::debug!("{} session {:?}: {} bytes of scratch", self.kind, feature, size);
        self.session = Some(Session {
            feature,
            desc: *desc,
            scratch: vec![0; size],
        });
        Ok(())
    }

    fn evaluate(&mut self, frame: FrameContext<'_>) -> Result<ResourceHandle> {
        let session = self.session()?;
        let request = frame.request;

        let color = require(request.color, ResourceSlot::Color)?;
        let motion_vectors = require(request.motion_vectors, ResourceSlot::MotionVectors)?;
        let output = require(request.output, ResourceSlot::Output)?;
        let exposure = if session.desc.flags.contains(FeatureFlags::AUTO_EXPOSURE) {
            request.exposure
        } else {
            Some(require(request.exposure, ResourceSlot::Exposure)?)
        };

        let params = EvaluateParams {
            command_list: request.command_list,
            color,
            depth: request.depth,
            motion_vectors,
            exposure,
            output,
            jitter: request.jitter.unwrap_or_default(),
            delta_time_ms: request.delta_time.as_secs_f32() * 1000.0,
            frame_index: request.frame_index,
            reset: frame.reset_history,
            sharpness: frame.sharpness,
        };

        self.runtime
            .evaluate(session.feature, &params)
            .map_err(|err| self.failure(err))?;
        Ok(output)
    }

    fn interpolate(&mut self, request: &InterpolationRequest, factor: f32) -> Result<ResourceHandle> {
        let session = self.session()?;

        let params = InterpolateParams {
            command_list: request.command_list,
            current_color: require(request.current_color, ResourceSlot::Color)?,
            previous_color: require(request.previous_color, ResourceSlot::PreviousColor)?,
            motion_vectors: require(request.motion_vectors, ResourceSlot::MotionVectors)?,
            current_depth: request.current_depth,
            previous_depth: request.previous_depth,
            output: require(request.output, ResourceSlot::Output)?,
            factor,
            delta_time_ms: request.delta_time.as_secs_f32() * 1000.0,
            frame_index: request.frame_index,
            jitter: request.jitter.unwrap_or_default(),
            previous_jitter: request.previous_jitter.unwrap_or_default(),
        };

        self.runtime
            .interpolate(session.feature, &params)
            .map_err(|err| self.failure(err))?;
        Ok(params.output)
    }

    fn destroy(&mut self) {
        if let Some(session) = self.session.take() {
            self.runtime.release(session.feature);
            tracing::debug!("{} session {:?} released", self.kind, session.feature);
        }
    }
}

impl Drop for VendorBackend {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityTier;
    use crate::request::DispatchRequest;
    use crate::resolution::Resolution;
    use crate::resource::DeviceHandle;
    use crate::runtime::SimulatedRuntime;

    fn desc(flags: FeatureFlags) -> SessionDesc {
        SessionDesc {
            device: DeviceHandle::from_raw(0x10).unwrap(),
            input: Resolution::new(960, 540),
            output: Resolution::new(1920, 1080),
            tier: QualityTier::Performance,
            flags,
            sharpness: 0.5,
        }
    }

    fn request() -> DispatchRequest {
        DispatchRequest {
            color: ResourceHandle::from_raw(0x100),
            motion_vectors: ResourceHandle::from_raw(0x200),
            exposure: ResourceHandle::from_raw(0x300),
            output: ResourceHandle::from_raw(0x400),
            ..Default::default()
        }
    }

    fn frame(request: &DispatchRequest) -> FrameContext<'_> {
        FrameContext {
            request,
            reset_history: false,
            sharpness: 0.5,
        }
    }

    #[test]
    fn scratch_follows_runtime_sizing() {
        let runtime = Arc::new(SimulatedRuntime::new(BackendKind::Dlss));
        let mut backend = VendorBackend::new(runtime.clone());
        backend.create(&desc(FeatureFlags::empty())).unwrap();
        assert_eq!(backend.scratch_bytes(), 129_600);
        assert_eq!(runtime.live_features(), 1);

        backend.destroy();
        assert_eq!(backend.scratch_bytes(), 0);
        assert_eq!(runtime.live_features(), 0);
    }

    #[test]
    fn exposure_required_unless_auto() {
        let runtime = Arc::new(SimulatedRuntime::new(BackendKind::Dlss));
        let mut no_exposure = request();
        no_exposure.exposure = None;

        let mut backend = VendorBackend::new(runtime.clone());
        backend.create(&desc(FeatureFlags::empty())).unwrap();
        assert_eq!(
            backend.evaluate(frame(&no_exposure)),
            Err(UpscaleError::InvalidResource { slot: ResourceSlot::Exposure })
        );

        let mut auto = VendorBackend::new(runtime);
        auto.create(&desc(FeatureFlags::AUTO_EXPOSURE)).unwrap();
        assert_eq!(auto.evaluate(frame(&no_exposure)).unwrap(), ResourceHandle::from_raw(0x400).unwrap());
    }

    #[test]
    fn missing_motion_vectors_rejected() {
        let mut backend = VendorBackend::new(Arc::new(SimulatedRuntime::new(BackendKind::Fsr)));
        backend.create(&desc(FeatureFlags::empty())).unwrap();
        let mut req = request();
        req.motion_vectors = None;
        assert_eq!(
            backend.evaluate(frame(&req)),
            Err(UpscaleError::InvalidResource { slot: ResourceSlot::MotionVectors })
        );
    }

    #[test]
    fn interpolation_unsupported_maps_to_configuration_error() {
        let mut backend = VendorBackend::new(Arc::new(SimulatedRuntime::new(BackendKind::Dlss)));
        backend.create(&desc(FeatureFlags::empty())).unwrap();
        let req = InterpolationRequest {
            current_color: ResourceHandle::from_raw(0x100),
            previous_color: ResourceHandle::from_raw(0x110),
            motion_vectors: ResourceHandle::from_raw(0x200),
            output: ResourceHandle::from_raw(0x400),
            ..Default::default()
        };
        assert!(matches!(
            backend.interpolate(&req, 0.5),
            Err(UpscaleError::UnsupportedConfiguration { backend: BackendKind::Dlss, .. })
        ));
    }
}
