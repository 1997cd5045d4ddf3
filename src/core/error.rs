//! Exposes the lantern error type

use std::ffi::NulError;
use std::sync::PoisonError;

use ash::vk;
use gpu_allocator::AllocationError;
use thiserror::Error;

/// Error type that lantern can return.
///
/// Transient presentation conditions (an out-of-date or suboptimal swapchain) are never reported through this type.
/// Those are part of the regular frame status, see [`FrameStatus`](crate::wsi::frame::FrameStatus).
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to load the Vulkan library.
    #[error("Failed to load Vulkan.")]
    LoadFailed(ash::LoadingError),
    /// Could not convert rust string to C-String because it has null bytes
    #[error("Invalid C string")]
    InvalidString(NulError),
    /// A Vulkan call failed with an unexpected result.
    #[error("`{operation}` failed: `{result}`")]
    Device {
        /// Name of the Vulkan entry point that failed.
        operation: &'static str,
        /// Result code that was returned.
        result: vk::Result,
    },
    /// Waiting on a fence took longer than the configured timeout.
    #[error("`{operation}` timed out")]
    Timeout {
        /// Name of the Vulkan entry point that timed out.
        operation: &'static str,
    },
    /// The surface reports no formats or no present modes on the selected device.
    #[error("Surface does not report any supported formats or present modes.")]
    UnsupportedSurface,
    /// A null surface handle was given where a valid one was expected.
    #[error("Surface handle is null.")]
    NullSurface,
    /// No window context specified where one was expected.
    #[error("Expected a window context.")]
    NoWindow,
    /// No suitable GPU found.
    #[error("No physical device found matching requirements.")]
    NoGPU,
    /// No queue was found that supports both graphics and presentation.
    #[error("No queue found that supports graphics and presentation to the surface.")]
    NoPresentQueue,
    /// Requested an empty frame pool.
    #[error("Frame pool needs at least one slot, got `{0}`.")]
    InvalidSlotCount(usize),
    /// Render targets were built against a swapchain that has since been rebuilt.
    #[error("Render targets are out of date with the swapchain.")]
    StaleRenderTargets,
    /// A swapchain image index was out of range of the available framebuffers.
    #[error("Image index `{index}` out of range, only `{count}` images available.")]
    ImageIndexOutOfRange {
        /// Requested index.
        index: u32,
        /// Amount of images.
        count: usize,
    },
    /// Memory allocation failed.
    #[error("Allocation failed: {0}")]
    AllocationError(AllocationError),
    /// Tried to write through a buffer that is not host visible.
    #[error("Buffer memory is not host visible.")]
    UnmappableBuffer,
    /// A write did not fit inside a buffer.
    #[error("Write of `{required}` bytes at offset `{offset}` does not fit in buffer of `{size}` bytes.")]
    BufferOverflow {
        /// Size of the buffer.
        size: vk::DeviceSize,
        /// Offset of the write.
        offset: vk::DeviceSize,
        /// Size of the write.
        required: vk::DeviceSize,
    },
    /// The given bytes are not a valid SPIR-V binary.
    #[error("Invalid SPIR-V binary: {0}")]
    InvalidSpirv(std::io::Error),
    /// A vertex attribute was added to a binding that was never declared.
    #[error("Vertex binding `{0}` does not exist.")]
    NoVertexBinding(u32),
    /// The byte size of a vertex attribute format is unknown.
    #[error("Unsupported vertex attribute format `{0:?}`.")]
    UnsupportedVertexFormat(vk::Format),
    /// A graphics pipeline needs at least a vertex shader.
    #[error("Pipeline `{0}` has no vertex shader.")]
    NoVertexShader(String),
    /// The draw callback returned an error.
    #[error("Draw callback failed: {0}")]
    Callback(anyhow::Error),
    /// Poisoned mutex
    #[error("Poisoned mutex")]
    PoisonError,
}

/// Result type used throughout lantern.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Attaches the name of the failing Vulkan entry point to a raw [`VkResult`](ash::prelude::VkResult).
pub trait VkResultExt<T> {
    /// Convert into a lantern result, naming the Vulkan function that was called.
    fn op(self, operation: &'static str) -> Result<T>;
}

impl<T> VkResultExt<T> for ash::prelude::VkResult<T> {
    fn op(self, operation: &'static str) -> Result<T> {
        self.map_err(|result| Error::Device {
            operation,
            result,
        })
    }
}

impl Error {
    /// Whether this error is a [`Error::Device`] error with the given result code.
    pub fn is_device_result(&self, code: vk::Result) -> bool {
        matches!(self, Error::Device { result, .. } if *result == code)
    }
}

impl From<ash::LoadingError> for Error {
    fn from(value: ash::LoadingError) -> Self {
        Error::LoadFailed(value)
    }
}

impl From<NulError> for Error {
    fn from(value: NulError) -> Self {
        Error::InvalidString(value)
    }
}

impl From<AllocationError> for Error {
    fn from(value: AllocationError) -> Self {
        Error::AllocationError(value)
    }
}

impl<T> From<PoisonError<T>> for Error {
    fn from(_: PoisonError<T>) -> Self {
        Error::PoisonError
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_error_names_operation() {
        let err = Err::<(), _>(vk::Result::ERROR_DEVICE_LOST).op("vkQueueSubmit").unwrap_err();
        assert!(err.to_string().contains("vkQueueSubmit"));
        assert!(err.is_device_result(vk::Result::ERROR_DEVICE_LOST));
        assert!(!err.is_device_result(vk::Result::ERROR_OUT_OF_DATE_KHR));
    }

    #[test]
    fn timeout_names_operation() {
        let err = Error::Timeout {
            operation: "vkWaitForFences",
        };
        assert_eq!(err.to_string(), "`vkWaitForFences` timed out");
    }
}
