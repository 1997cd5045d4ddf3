//! Most functions in this module are a relatively thin wrapper over Vulkan commands.
//!
//! Command buffers are owned by the [`FramePool`](crate::wsi::frame_pool::FramePool), one per frame slot.
//! Application code never sees them directly, it records into a [`DrawContext`] that is handed to the draw callback
//! of [`FrameManager::new_frame`](crate::FrameManager::new_frame). By the time the callback runs, the render pass is
//! already started and viewport and scissor cover the entire swapchain image.
//!
//! # Example
//! ```ignore
//! frame.new_frame(&mut window_state, |ctx| {
//!     ctx.bind_graphics_pipeline(pipeline)
//!         .bind_vertex_buffer(0, vertices, 0)
//!         .bind_index_buffer(indices, 0, vk::IndexType::UINT16)
//!         .bind_descriptor_set(layout, 0, set)
//!         .draw_indexed(6, 1, 0, 0, 0);
//!     Ok(())
//! })?;
//! ```

use ash::vk;

use crate::command_buffer::traits::{GraphicsCmdBuffer, RecordCommands};

pub mod traits;

pub(crate) mod command_pool;

/// A command buffer that is currently recording inside the frame's render pass.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DrawContext<'d, D: RecordCommands> {
    #[derivative(Debug = "ignore")]
    device: &'d D,
    handle: vk::CommandBuffer,
    extent: vk::Extent2D,
    frame_index: usize,
    image_index: u32,
}

impl<'d, D: RecordCommands> DrawContext<'d, D> {
    pub(crate) fn new(device: &'d D, handle: vk::CommandBuffer, extent: vk::Extent2D, frame_index: usize, image_index: u32) -> Self {
        DrawContext {
            device,
            handle,
            extent,
            frame_index,
            image_index,
        }
    }

    /// Size of the render area, equal to the swapchain extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Index of the frame slot being recorded. Use this to pick per-frame resources like uniform buffers.
    pub fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// Index of the swapchain image being rendered to.
    pub fn image_index(&self) -> u32 {
        self.image_index
    }

    /// Get unsafe access to the underlying `VkCommandBuffer`.
    /// # Safety
    /// Ending the command buffer or the render pass through this handle puts the frame in an undefined state.
    pub unsafe fn handle(&self) -> vk::CommandBuffer {
        self.handle
    }
}

impl<D: RecordCommands> GraphicsCmdBuffer for DrawContext<'_, D> {
    fn bind_graphics_pipeline(&mut self, pipeline: vk::Pipeline) -> &mut Self {
        self.device.cmd_bind_pipeline(self.handle, pipeline);
        self
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: vk::Buffer, offset: vk::DeviceSize) -> &mut Self {
        self.device.cmd_bind_vertex_buffer(self.handle, binding, buffer, offset);
        self
    }

    fn bind_index_buffer(&mut self, buffer: vk::Buffer, offset: vk::DeviceSize, ty: vk::IndexType) -> &mut Self {
        self.device.cmd_bind_index_buffer(self.handle, buffer, offset, ty);
        self
    }

    fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, index: u32, set: vk::DescriptorSet) -> &mut Self {
        self.device.cmd_bind_descriptor_set(self.handle, layout, index, set);
        self
    }

    fn push_constants(&mut self, layout: vk::PipelineLayout, stages: vk::ShaderStageFlags, offset: u32, data: &[u8]) -> &mut Self {
        self.device.cmd_push_constants(self.handle, layout, stages, offset, data);
        self
    }

    fn full_viewport_scissor(&mut self) -> &mut Self {
        self.device.cmd_set_viewport_scissor(self.handle, self.extent);
        self
    }

    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> &mut Self {
        self.device.cmd_draw(self.handle, vertex_count, instance_count, first_vertex, first_instance);
        self
    }

    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32) -> &mut Self {
        self.device.cmd_draw_indexed(self.handle, index_count, instance_count, first_index, vertex_offset, first_instance);
        self
    }
}
