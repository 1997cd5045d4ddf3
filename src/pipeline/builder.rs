//! The pipeline builder is used to easily create graphics pipelines correctly.

use std::collections::HashMap;

use ash::vk;

use crate::core::error::{Error, Result, VkResultExt};
use crate::core::traits::DeviceProvider;
use crate::pipeline::pipeline_layout::{PipelineLayout, PushConstantRange};
use crate::pipeline::shader::{ShaderCreateInfo, ShaderModule};
use crate::pipeline::Pipeline;
use crate::util::byte_size::ByteSize;
use crate::{DescriptorSetLayout, Device, RenderTargets};

/// Used to facilitate creating a graphics pipeline that renders into the frame's render targets.
///
/// Viewport and scissor are always dynamic state, so pipelines survive swapchain rebuilds. The frame loop sets both
/// to the full render area before the draw callback runs.
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    name: String,
    shaders: Vec<ShaderCreateInfo>,
    vertex_bindings: Vec<vk::VertexInputBindingDescription>,
    vertex_attributes: Vec<vk::VertexInputAttributeDescription>,
    vertex_binding_offsets: HashMap<u32, u32>,
    topology: vk::PrimitiveTopology,
    polygon_mode: vk::PolygonMode,
    cull_mode: vk::CullModeFlags,
    front_face: vk::FrontFace,
    blend: vk::PipelineColorBlendAttachmentState,
    set_layouts: Vec<vk::DescriptorSetLayout>,
    push_constants: Vec<PushConstantRange>,
}

impl PipelineBuilder {
    /// Create a new empty pipeline. It draws filled triangle lists without culling or blending.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shaders: vec![],
            vertex_bindings: vec![],
            vertex_attributes: vec![],
            vertex_binding_offsets: HashMap::new(),
            topology: vk::PrimitiveTopology::TRIANGLE_LIST,
            polygon_mode: vk::PolygonMode::FILL,
            cull_mode: vk::CullModeFlags::NONE,
            front_face: vk::FrontFace::COUNTER_CLOCKWISE,
            blend: blend_none(),
            set_layouts: vec![],
            push_constants: vec![],
        }
    }

    /// Add a vertex input binding. These are the binding indices for `vkCmdBindVertexBuffers`
    pub fn vertex_input(mut self, binding: u32, rate: vk::VertexInputRate) -> Self {
        self.vertex_binding_offsets.insert(binding, 0);
        self.vertex_bindings.push(vk::VertexInputBindingDescription {
            binding,
            stride: 0,
            input_rate: rate,
        });
        self
    }

    /// Add a vertex attribute to the specified binding.
    /// Offsets and the binding stride are calculated automatically, so add these in order of declaration in the shader.
    /// # Errors
    /// * [`Error::NoVertexBinding`] if [`PipelineBuilder::vertex_input`] was not called for this binding.
    /// * [`Error::UnsupportedVertexFormat`] if the size of the format is unknown.
    pub fn vertex_attribute(mut self, binding: u32, location: u32, format: vk::Format) -> Result<Self> {
        let size = format.byte_size()? as u32;
        let offset = self
            .vertex_binding_offsets
            .get_mut(&binding)
            .ok_or(Error::NoVertexBinding(binding))?;
        self.vertex_attributes.push(vk::VertexInputAttributeDescription {
            location,
            binding,
            format,
            offset: *offset,
        });
        *offset += size;
        for descr in &mut self.vertex_bindings {
            if descr.binding == binding {
                descr.stride += size;
            }
        }
        Ok(self)
    }

    /// Add a shader to the pipeline.
    pub fn attach_shader(mut self, info: ShaderCreateInfo) -> Self {
        self.shaders.push(info);
        self
    }

    pub fn topology(mut self, topology: vk::PrimitiveTopology) -> Self {
        self.topology = topology;
        self
    }

    /// Set the polygon mode.
    pub fn polygon_mode(mut self, mode: vk::PolygonMode) -> Self {
        self.polygon_mode = mode;
        self
    }

    /// Set the face culling mask.
    pub fn cull_mask(mut self, cull: vk::CullModeFlags) -> Self {
        self.cull_mode = cull;
        self
    }

    /// Set the front face.
    pub fn front_face(mut self, face: vk::FrontFace) -> Self {
        self.front_face = face;
        self
    }

    /// Write the color output without blending. This is the default.
    pub fn blend_attachment_none(mut self) -> Self {
        self.blend = blend_none();
        self
    }

    /// Blend the color output with the given factors.
    pub fn blend_attachment(
        mut self,
        src_color: vk::BlendFactor,
        dst_color: vk::BlendFactor,
        color_op: vk::BlendOp,
        src_alpha: vk::BlendFactor,
        dst_alpha: vk::BlendFactor,
        alpha_op: vk::BlendOp,
    ) -> Self {
        self.blend = vk::PipelineColorBlendAttachmentState {
            blend_enable: vk::TRUE,
            src_color_blend_factor: src_color,
            dst_color_blend_factor: dst_color,
            color_blend_op: color_op,
            src_alpha_blend_factor: src_alpha,
            dst_alpha_blend_factor: dst_alpha,
            alpha_blend_op: alpha_op,
            color_write_mask: vk::ColorComponentFlags::RGBA,
        };
        self
    }

    /// Standard alpha blending.
    pub fn blend_alpha(self) -> Self {
        self.blend_attachment(
            vk::BlendFactor::SRC_ALPHA,
            vk::BlendFactor::ONE_MINUS_SRC_ALPHA,
            vk::BlendOp::ADD,
            vk::BlendFactor::ONE,
            vk::BlendFactor::ZERO,
            vk::BlendOp::ADD,
        )
    }

    /// Add a descriptor set layout. Sets are numbered in the order they are added.
    /// The layout must outlive the pipeline.
    pub fn descriptor_set_layout(mut self, layout: &DescriptorSetLayout) -> Self {
        self.set_layouts.push(unsafe { layout.handle() });
        self
    }

    /// Add a push constant range.
    pub fn push_constants(mut self, stage_flags: vk::ShaderStageFlags, offset: u32, size: u32) -> Self {
        self.push_constants.push(PushConstantRange {
            stage_flags,
            offset,
            size,
        });
        self
    }

    /// Obtain the pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<()> {
        if !self
            .shaders
            .iter()
            .any(|shader| shader.stage().contains(vk::ShaderStageFlags::VERTEX))
        {
            return Err(Error::NoVertexShader(self.name.clone()));
        }
        Ok(())
    }

    /// Create the pipeline for the render pass of `targets`.
    ///
    /// The pipeline stays compatible with the render targets after a swapchain rebuild, as long as the surface format
    /// does not change.
    /// # Errors
    /// * [`Error::NoVertexShader`] if no vertex shader was attached.
    /// * [`Error::StaleRenderTargets`] if the render targets are torn down.
    /// * Fails if creating the shader modules, the layout or the pipeline fails.
    pub fn build<D: DeviceProvider>(self, device: Device, targets: &RenderTargets<D>) -> Result<Pipeline> {
        self.validate()?;
        // SAFETY: The render pass is only used to create the pipeline, and may be destroyed afterwards.
        let render_pass = unsafe { targets.render_pass() };
        if render_pass == vk::RenderPass::null() {
            return Err(Error::StaleRenderTargets);
        }

        let layout = PipelineLayout::new(device.clone(), &self.set_layouts, &self.push_constants)?;
        // Modules are destroyed when this function returns, the pipeline does not need them anymore.
        let modules = self
            .shaders
            .iter()
            .map(|info| ShaderModule::new(device.clone(), info))
            .collect::<Result<Vec<_>>>()?;
        let stages = modules.iter().map(|module| module.stage_info()).collect::<Vec<_>>();

        let vertex_input = vk::PipelineVertexInputStateCreateInfo::builder()
            .vertex_binding_descriptions(&self.vertex_bindings)
            .vertex_attribute_descriptions(&self.vertex_attributes);
        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::builder().topology(self.topology);
        let viewport = vk::PipelineViewportStateCreateInfo::builder()
            .viewport_count(1)
            .scissor_count(1);
        let rasterizer = vk::PipelineRasterizationStateCreateInfo::builder()
            .polygon_mode(self.polygon_mode)
            .cull_mode(self.cull_mode)
            .front_face(self.front_face)
            .line_width(1.0);
        let multisample = vk::PipelineMultisampleStateCreateInfo::builder().rasterization_samples(vk::SampleCountFlags::TYPE_1);
        let attachments = [self.blend];
        let blend = vk::PipelineColorBlendStateCreateInfo::builder().attachments(&attachments);
        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dynamic_states);

        let info = vk::GraphicsPipelineCreateInfo::builder()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport)
            .rasterization_state(&rasterizer)
            .multisample_state(&multisample)
            .color_blend_state(&blend)
            .dynamic_state(&dynamic)
            // SAFETY: The layout is moved into the returned pipeline.
            .layout(unsafe { layout.handle() })
            .render_pass(render_pass)
            .subpass(0)
            .build();

        let pipelines = unsafe { device.create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&info), None) }
            .map_err(|(_, result)| result)
            .op("vkCreateGraphicsPipelines")?;
        let handle = pipelines.into_iter().next().ok_or(Error::Device {
            operation: "vkCreateGraphicsPipelines",
            result: vk::Result::ERROR_UNKNOWN,
        })?;
        info!("Created pipeline {}.", self.name);
        Ok(Pipeline::new(device, handle, layout))
    }
}

fn blend_none() -> vk::PipelineColorBlendAttachmentState {
    vk::PipelineColorBlendAttachmentState {
        blend_enable: vk::FALSE,
        src_color_blend_factor: vk::BlendFactor::ONE,
        dst_color_blend_factor: vk::BlendFactor::ZERO,
        color_blend_op: vk::BlendOp::ADD,
        src_alpha_blend_factor: vk::BlendFactor::ONE,
        dst_alpha_blend_factor: vk::BlendFactor::ZERO,
        alpha_blend_op: vk::BlendOp::ADD,
        color_write_mask: vk::ColorComponentFlags::RGBA,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attributes_are_packed_per_binding() -> Result<()> {
        let builder = PipelineBuilder::new("packed")
            .vertex_input(0, vk::VertexInputRate::VERTEX)
            .vertex_input(1, vk::VertexInputRate::INSTANCE)
            .vertex_attribute(0, 0, vk::Format::R32G32_SFLOAT)?
            .vertex_attribute(0, 1, vk::Format::R32G32B32_SFLOAT)?
            .vertex_attribute(1, 2, vk::Format::R32G32B32A32_SFLOAT)?
            .vertex_attribute(0, 3, vk::Format::R8G8B8A8_UNORM)?;

        let offsets = builder
            .vertex_attributes
            .iter()
            .map(|attr| (attr.location, attr.binding, attr.offset))
            .collect::<Vec<_>>();
        assert_eq!(offsets, vec![(0, 0, 0), (1, 0, 8), (2, 1, 0), (3, 0, 20)]);
        assert_eq!(builder.vertex_bindings[0].stride, 24);
        assert_eq!(builder.vertex_bindings[1].stride, 16);
        assert_eq!(builder.vertex_bindings[1].input_rate, vk::VertexInputRate::INSTANCE);
        Ok(())
    }

    #[test]
    fn attribute_needs_binding() {
        let result = PipelineBuilder::new("unbound").vertex_attribute(2, 0, vk::Format::R32G32_SFLOAT);
        assert!(matches!(result, Err(Error::NoVertexBinding(2))));
    }

    #[test]
    fn unsupported_attribute_format() {
        let result = PipelineBuilder::new("depth")
            .vertex_input(0, vk::VertexInputRate::VERTEX)
            .vertex_attribute(0, 0, vk::Format::D32_SFLOAT);
        assert!(matches!(result, Err(Error::UnsupportedVertexFormat(vk::Format::D32_SFLOAT))));
    }

    #[test]
    fn vertex_shader_is_required() {
        let fragment = ShaderCreateInfo::from_spirv(vk::ShaderStageFlags::FRAGMENT, vec![0x0723_0203]);
        let builder = PipelineBuilder::new("fragment only").attach_shader(fragment);
        assert!(matches!(builder.validate(), Err(Error::NoVertexShader(name)) if name == "fragment only"));

        let vertex = ShaderCreateInfo::from_spirv(vk::ShaderStageFlags::VERTEX, vec![0x0723_0203]);
        assert!(builder.attach_shader(vertex).validate().is_ok());
    }

    #[test]
    fn blending_defaults_to_none() {
        let builder = PipelineBuilder::new("blend");
        assert_eq!(builder.blend.blend_enable, vk::FALSE);
        let builder = builder.blend_alpha();
        assert_eq!(builder.blend.blend_enable, vk::TRUE);
        assert_eq!(builder.blend.src_color_blend_factor, vk::BlendFactor::SRC_ALPHA);
        assert_eq!(builder.blend_attachment_none().blend.blend_enable, vk::FALSE);
    }
}
