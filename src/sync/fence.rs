use std::time::Duration;

use ash::vk;

use crate::core::error::Result;
use crate::core::traits::DeviceProvider;
use crate::Device;

/// Wrapper around a [`VkFence`](vk::Fence) object. Fences are used for CPU-GPU sync.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Fence<D: DeviceProvider = Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    handle: vk::Fence,
}

impl<D: DeviceProvider> Fence<D> {
    /// Create a new fence, possibly in the signaled status.
    pub fn new(device: D, signaled: bool) -> Result<Self> {
        let handle = device.create_fence(signaled)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkFence {handle:p} (signaled = {signaled})");
        Ok(Fence {
            device,
            handle,
        })
    }

    /// Waits for the fence to be signaled. This is a blocking call. With a `timeout` of `None` this waits forever,
    /// otherwise an expired wait is reported as [`Error::Timeout`](crate::Error::Timeout).
    pub fn wait(&self, timeout: Option<Duration>) -> Result<()> {
        self.device.wait_for_fence(self.handle, timeout)
    }

    /// Resets a fence to the unsignaled status.
    pub fn reset(&self) -> Result<()> {
        self.device.reset_fence(self.handle)
    }

    /// Get unsafe access to the underlying `VkFence` handle.
    /// # Safety
    /// The caller must not destroy the fence.
    pub unsafe fn handle(&self) -> vk::Fence {
        self.handle
    }
}

impl<D: DeviceProvider> Drop for Fence<D> {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkFence {:p}", self.handle);
        self.device.destroy_fence(self.handle);
    }
}
