//! Opaque graphics handles borrowed from the host
//!
//! The upscaling layer never allocates or frees the objects behind these
//! handles. They are stored as non-zero integers so contexts stay `Send`.

use std::ffi::c_void;
use std::fmt;
use std::num::NonZeroUsize;

macro_rules! opaque_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            /// Wrap a host pointer. Null yields `None`.
            pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                NonZeroUsize::new(ptr as usize).map(Self)
            }

            /// Wrap a raw handle value (e.g. a Vulkan object handle).
            pub fn from_raw(raw: usize) -> Option<Self> {
                NonZeroUsize::new(raw).map(Self)
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.get() as *mut c_void
            }

            pub fn raw(self) -> usize {
                self.0.get()
            }
        }
    };
}

opaque_handle!(
    /// Graphics device (ID3D12Device, VkDevice, ...). Borrowed for the life of a context.
    DeviceHandle
);

opaque_handle!(
    /// Command list the host records the upscale into. Submitted by the host.
    CommandListHandle
);

opaque_handle!(
    /// GPU texture or buffer. Borrowed for the duration of one call.
    ResourceHandle
);

/// Named input/output slots of a dispatch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceSlot {
    Color,
    PreviousColor,
    MotionVectors,
    Exposure,
    Output,
}

impl fmt::Display for ResourceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceSlot::Color => "color",
            ResourceSlot::PreviousColor => "previous color",
            ResourceSlot::MotionVectors => "motion vector",
            ResourceSlot::Exposure => "exposure",
            ResourceSlot::Output => "output",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_pointer_is_not_a_handle() {
        assert!(ResourceHandle::from_ptr(std::ptr::null_mut()).is_none());
        assert!(DeviceHandle::from_raw(0).is_none());
    }

    #[test]
    fn handle_keeps_pointer_value() {
        let handle = ResourceHandle::from_raw(0xdead_0000).unwrap();
        assert_eq!(handle.as_ptr() as usize, 0xdead_0000);
        assert_eq!(ResourceHandle::from_ptr(handle.as_ptr()), Some(handle));
    }
}
