use ash::vk;

use crate::core::error::Result;
use crate::core::traits::DeviceProvider;
use crate::Device;

/// Wrapper around a [`VkSemaphore`](vk::Semaphore) object. Semaphores are used for GPU-GPU sync.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Semaphore<D: DeviceProvider = Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    handle: vk::Semaphore,
}

impl<D: DeviceProvider> Semaphore<D> {
    /// Create a new `VkSemaphore` object.
    pub fn new(device: D) -> Result<Self> {
        let handle = device.create_semaphore()?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkSemaphore {handle:p}");
        Ok(Semaphore {
            device,
            handle,
        })
    }

    /// Get unsafe access to the underlying `VkSemaphore` handle.
    /// # Safety
    /// The caller must not destroy the semaphore.
    pub unsafe fn handle(&self) -> vk::Semaphore {
        self.handle
    }
}

impl<D: DeviceProvider> Drop for Semaphore<D> {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkSemaphore {:p}", self.handle);
        self.device.destroy_semaphore(self.handle);
    }
}
