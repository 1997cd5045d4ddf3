//! Graphics pipelines that render into the frame's render targets.
//!
//! # Example
//! The following example uses the [`PipelineBuilder`](crate::PipelineBuilder) to make a graphics pipeline for the
//! render pass of the frame manager.
//!
//! ```ignore
//! use lantern::prelude::*;
//!
//! // Note that `load_spirv_binary()` does not ship with lantern.
//! let vertex = ShaderCreateInfo::from_spirv_bytes(vk::ShaderStageFlags::VERTEX, &load_spirv_binary("vert.spv"))?;
//! let fragment = ShaderCreateInfo::from_spirv_bytes(vk::ShaderStageFlags::FRAGMENT, &load_spirv_binary("frag.spv"))?;
//!
//! let pipeline = PipelineBuilder::new("sample")
//!     // One vertex binding at binding 0. We have to specify this before adding attributes
//!     .vertex_input(0, vk::VertexInputRate::VERTEX)
//!     // Equivalent of `layout (location = 0) in vec2 Attr1;`
//!     .vertex_attribute(0, 0, vk::Format::R32G32_SFLOAT)?
//!     // Equivalent of `layout (location = 1) in vec3 Attr2;`
//!     .vertex_attribute(0, 1, vk::Format::R32G32B32_SFLOAT)?
//!     .attach_shader(vertex)
//!     .attach_shader(fragment)
//!     .build(ctx.device.clone(), ctx.frame.render_targets())?;
//! ```

use ash::vk;

use crate::pipeline::pipeline_layout::PipelineLayout;
use crate::Device;

pub mod builder;
pub mod pipeline_layout;
pub mod shader;

/// A fully built graphics pipeline, together with its layout.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Pipeline {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::Pipeline,
    // Destroyed after the pipeline.
    layout: PipelineLayout,
}

impl Pipeline {
    pub(crate) fn new(device: Device, handle: vk::Pipeline, layout: PipelineLayout) -> Self {
        #[cfg(feature = "log-objects")]
        trace!("Created new VkPipeline {handle:p}");
        Self {
            device,
            handle,
            layout,
        }
    }

    /// Get unsafe access to the underlying `VkPipeline`.
    /// # Safety
    /// The pipeline must outlive every command buffer it is bound in.
    pub unsafe fn handle(&self) -> vk::Pipeline {
        self.handle
    }

    /// Get unsafe access to the pipeline layout, for binding descriptor sets and pushing constants.
    /// # Safety
    /// Any vulkan calls that mutate the layout may put the system in an undefined state.
    pub unsafe fn layout(&self) -> vk::PipelineLayout {
        self.layout.handle()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkPipeline {:p}", self.handle);
        unsafe {
            self.device.destroy_pipeline(self.handle, None);
        }
    }
}
