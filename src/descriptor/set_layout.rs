use ash::vk;

use crate::core::error::{Result, VkResultExt};
use crate::Device;

/// An owned `VkDescriptorSetLayout`.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorSetLayout {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::DescriptorSetLayout,
    /// Descriptor type and count of every binding, used to size pools.
    descriptors: Vec<(vk::DescriptorType, u32)>,
}

impl DescriptorSetLayout {
    pub fn new(device: Device, bindings: &[vk::DescriptorSetLayoutBinding]) -> Result<Self> {
        let info = vk::DescriptorSetLayoutCreateInfo::builder().bindings(bindings).build();
        let handle = unsafe { device.create_descriptor_set_layout(&info, None) }.op("vkCreateDescriptorSetLayout")?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDescriptorSetLayout {handle:p}");
        Ok(Self {
            device,
            handle,
            descriptors: bindings
                .iter()
                .map(|binding| (binding.descriptor_type, binding.descriptor_count))
                .collect(),
        })
    }

    pub fn descriptors(&self) -> &[(vk::DescriptorType, u32)] {
        &self.descriptors
    }

    /// Get unsafe access to the underlying `VkDescriptorSetLayout`.
    /// # Safety
    /// The layout must not be destroyed while pipelines or pools still use it.
    pub unsafe fn handle(&self) -> vk::DescriptorSetLayout {
        self.handle
    }
}

impl Drop for DescriptorSetLayout {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDescriptorSetLayout {:p}", self.handle);
        unsafe {
            self.device.destroy_descriptor_set_layout(self.handle, None);
        }
    }
}
