//! Wrapper around `VkPipelineLayout` objects.

use ash::vk;

use crate::core::error::{Result, VkResultExt};
use crate::Device;

/// Defines a range of push constants used by a pipeline.
#[derive(Debug, Clone, Default, Copy, PartialEq, Eq, Hash)]
pub struct PushConstantRange {
    /// Shader stages where this push constant range is used
    pub stage_flags: vk::ShaderStageFlags,
    /// Offset into the global push constant block of this range
    pub offset: u32,
    /// Size of this push constant range
    pub size: u32,
}

impl PushConstantRange {
    pub fn to_vk(&self) -> vk::PushConstantRange {
        vk::PushConstantRange {
            stage_flags: self.stage_flags,
            offset: self.offset,
            size: self.size,
        }
    }
}

/// An owned `VkPipelineLayout`.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct PipelineLayout {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::PipelineLayout,
}

impl PipelineLayout {
    /// Create a pipeline layout. The descriptor set layouts are not owned and must outlive the pipeline layout.
    pub fn new(device: Device, set_layouts: &[vk::DescriptorSetLayout], push_constants: &[PushConstantRange]) -> Result<Self> {
        let ranges = push_constants.iter().map(|pc| pc.to_vk()).collect::<Vec<_>>();
        let info = vk::PipelineLayoutCreateInfo::builder()
            .set_layouts(set_layouts)
            .push_constant_ranges(ranges.as_slice())
            .build();
        let handle = unsafe { device.create_pipeline_layout(&info, None) }.op("vkCreatePipelineLayout")?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkPipelineLayout {handle:p}");
        Ok(Self {
            device,
            handle,
        })
    }

    /// Get unsafe access to the internal `VkPipelineLayout`.
    /// # Safety
    /// Any vulkan calls that mutate this pipeline layout may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::PipelineLayout {
        self.handle
    }
}

impl Drop for PipelineLayout {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkPipelineLayout {:p}", self.handle);
        unsafe {
            self.device.destroy_pipeline_layout(self.handle, None);
        }
    }
}
