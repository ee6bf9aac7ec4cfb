use crate::backend::BackendKind;
use crate::context::ContextState;
use crate::resolution::Resolution;
use crate::resource::ResourceSlot;
use thiserror::Error;

/// Errors surfaced by the upscaling layer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpscaleError {
    /// The backend cannot serve the requested tier or operation. The selector
    /// moves on to the next backend when it sees this.
    #[error("{backend} does not support {what}")]
    UnsupportedConfiguration { backend: BackendKind, what: String },

    #[error("cannot upscale {input} to {output}")]
    InvalidDimensions { input: Resolution, output: Resolution },

    #[error("required {slot} resource is missing")]
    InvalidResource { slot: ResourceSlot },

    #[error("upscaler context is not initialized")]
    NotInitialized,

    /// Soft warning: reported alongside a successful dispatch that had to
    /// reset temporal history.
    #[error("frame {current} arrived after frame {previous}; temporal history was reset")]
    TemporalOrderingViolation { previous: u64, current: u64 },

    #[error("{backend} runtime failure: {reason}")]
    BackendInternalFailure { backend: BackendKind, reason: String },

    #[error("cannot {operation} a context that is {state}")]
    LifecycleViolation {
        operation: &'static str,
        state: ContextState,
    },

    #[error("invalid upscaler configuration: {0}")]
    Config(String),
}

impl UpscaleError {
    /// Whether the selector should try the next backend after this error.
    pub fn is_backend_fallback(&self) -> bool {
        matches!(
            self,
            UpscaleError::UnsupportedConfiguration { .. } | UpscaleError::BackendInternalFailure { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, UpscaleError>;
