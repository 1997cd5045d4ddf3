use ash::vk;

/// Command recording functions on a device. These map one to one to `vkCmd*` calls.
/// All of them record into an already started command buffer.
pub trait RecordCommands {
    fn cmd_begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear: vk::ClearValue,
    );
    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer);
    /// Set viewport and scissor to cover the entire area.
    fn cmd_set_viewport_scissor(&self, cmd: vk::CommandBuffer, extent: vk::Extent2D);
    fn cmd_bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline);
    fn cmd_bind_vertex_buffer(&self, cmd: vk::CommandBuffer, binding: u32, buffer: vk::Buffer, offset: vk::DeviceSize);
    fn cmd_bind_index_buffer(&self, cmd: vk::CommandBuffer, buffer: vk::Buffer, offset: vk::DeviceSize, ty: vk::IndexType);
    fn cmd_bind_descriptor_set(&self, cmd: vk::CommandBuffer, layout: vk::PipelineLayout, first_set: u32, set: vk::DescriptorSet);
    fn cmd_push_constants(&self, cmd: vk::CommandBuffer, layout: vk::PipelineLayout, stages: vk::ShaderStageFlags, offset: u32, data: &[u8]);
    fn cmd_draw(&self, cmd: vk::CommandBuffer, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32);
    fn cmd_draw_indexed(
        &self,
        cmd: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
}

/// Trait representing a command buffer that supports graphics commands inside a render pass.
pub trait GraphicsCmdBuffer {
    /// Bind a graphics pipeline. Equivalent of `vkCmdBindPipeline`.
    fn bind_graphics_pipeline(&mut self, pipeline: vk::Pipeline) -> &mut Self;
    /// Bind a vertex buffer to the given vertex input binding.
    /// Equivalent of `vkCmdBindVertexBuffers`
    fn bind_vertex_buffer(&mut self, binding: u32, buffer: vk::Buffer, offset: vk::DeviceSize) -> &mut Self;
    /// Bind an index buffer. Equivalent of `vkCmdBindIndexBuffer`
    fn bind_index_buffer(&mut self, buffer: vk::Buffer, offset: vk::DeviceSize, ty: vk::IndexType) -> &mut Self;
    /// Bind a single descriptor set. Equivalent of `vkCmdBindDescriptorSets`
    fn bind_descriptor_set(&mut self, layout: vk::PipelineLayout, index: u32, set: vk::DescriptorSet) -> &mut Self;
    /// Upload push constants. Equivalent of `vkCmdPushConstants`
    fn push_constants(&mut self, layout: vk::PipelineLayout, stages: vk::ShaderStageFlags, offset: u32, data: &[u8]) -> &mut Self;
    /// Sets viewport and scissor region to the entire render area
    fn full_viewport_scissor(&mut self) -> &mut Self;
    /// Record a single drawcall. Equivalent of `vkCmdDraw`.
    fn draw(&mut self, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) -> &mut Self;
    /// Record a single indexed drawcall. Equivalent of `vkCmdDrawIndexed`
    fn draw_indexed(&mut self, index_count: u32, instance_count: u32, first_index: u32, vertex_offset: i32, first_instance: u32) -> &mut Self;
}
