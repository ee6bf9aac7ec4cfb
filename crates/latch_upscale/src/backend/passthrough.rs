use super::{BackendKind, FrameContext, UpscaleBackend};
use crate::error::{Result, UpscaleError};
use crate::request::InterpolationRequest;
use crate::resource::{ResourceHandle, ResourceSlot};
use crate::runtime::SessionDesc;

/// Hands the color input straight back. Used when no vendor backend can
/// serve the requested configuration.
#[derive(Debug, Default)]
pub struct PassthroughBackend;

impl PassthroughBackend {
    pub fn new() -> Self {
        Self
    }
}

impl UpscaleBackend for PassthroughBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Passthrough
    }

    fn create(&mut self, desc: &SessionDesc) -> Result<()> {
        tracing::debug!("passthrough session {} -> {}", desc.input, desc.output);
        Ok(())
    }

    fn evaluate(&mut self, frame: FrameContext<'_>) -> Result<ResourceHandle> {
        frame
            .request
            .color
            .ok_or(UpscaleError::InvalidResource { slot: ResourceSlot::Color })
    }

    fn interpolate(&mut self, request: &InterpolationRequest, factor: f32) -> Result<ResourceHandle> {
        let current = request
            .current_color
            .ok_or(UpscaleError::InvalidResource { slot: ResourceSlot::Color })?;
        let previous = request
            .previous_color
            .ok_or(UpscaleError::InvalidResource { slot: ResourceSlot::PreviousColor })?;

        // nearest of the two real frames
        Ok(if factor < 0.5 { previous } else { current })
    }

    fn destroy(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DispatchRequest;

    fn handle(raw: usize) -> Option<ResourceHandle> {
        ResourceHandle::from_raw(raw)
    }

    #[test]
    fn evaluate_returns_color() {
        let mut backend = PassthroughBackend::new();
        let request = DispatchRequest {
            color: handle(0x100),
            ..Default::default()
        };
        let frame = FrameContext {
            request: &request,
            reset_history: false,
            sharpness: 0.0,
        };
        assert_eq!(backend.evaluate(frame).unwrap(), handle(0x100).unwrap());
    }

    #[test]
    fn evaluate_without_color_fails() {
        let mut backend = PassthroughBackend::new();
        let request = DispatchRequest::default();
        let frame = FrameContext {
            request: &request,
            reset_history: true,
            sharpness: 0.0,
        };
        assert_eq!(
            backend.evaluate(frame),
            Err(UpscaleError::InvalidResource { slot: ResourceSlot::Color })
        );
    }

    #[test]
    fn interpolation_picks_nearest_frame() {
        let mut backend = PassthroughBackend::new();
        let request = InterpolationRequest {
            current_color: handle(0x200),
            previous_color: handle(0x100),
            ..Default::default()
        };
        assert_eq!(backend.interpolate(&request, 0.25).unwrap(), handle(0x100).unwrap());
        assert_eq!(backend.interpolate(&request, 0.5).unwrap(), handle(0x200).unwrap());
    }
}
