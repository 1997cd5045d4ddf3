use ash::vk;

use crate::core::error::Result;
use crate::core::traits::DeviceProvider;

/// Owning wrapper around a `VkCommandPool` whose command buffers can be reset individually.
#[derive(Derivative)]
#[derivative(Debug)]
pub(crate) struct CommandPool<D: DeviceProvider> {
    #[derivative(Debug = "ignore")]
    device: D,
    handle: vk::CommandPool,
}

impl<D: DeviceProvider> CommandPool<D> {
    pub fn new(device: D) -> Result<Self> {
        let handle = device.create_command_pool()?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkCommandPool {handle:p}");
        Ok(CommandPool {
            device,
            handle,
        })
    }

    /// Allocate primary command buffers. These are freed together with the pool.
    pub fn allocate(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        self.device.allocate_command_buffers(self.handle, count)
    }
}

impl<D: DeviceProvider> Drop for CommandPool<D> {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkCommandPool {:p}", self.handle);
        self.device.destroy_command_pool(self.handle);
    }
}
