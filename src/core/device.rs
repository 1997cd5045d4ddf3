use std::ffi::{CString, NulError};
use std::ops::Deref;
use std::slice;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ash::vk;

use crate::command_buffer::traits::RecordCommands;
use crate::core::error::{Error, Result, VkResultExt};
use crate::core::traits::{Acquired, DeviceProvider, Presented, SurfaceSupport, SwapchainConfig};
use crate::util::string::raw_ptrs;
use crate::{AppSettings, Instance, PhysicalDevice};

#[derive(Derivative)]
#[derivative(Debug)]
struct DeviceInner {
    #[derivative(Debug = "ignore")]
    handle: ash::Device,
    physical_device: vk::PhysicalDevice,
    queue_family: u32,
    /// The main queue. Submission and presentation need external synchronization.
    queue: Mutex<vk::Queue>,
    properties: vk::PhysicalDeviceProperties,
    #[derivative(Debug = "ignore")]
    surface_fns: ash::extensions::khr::Surface,
    #[derivative(Debug = "ignore")]
    swapchain_fns: ash::extensions::khr::Swapchain,
}

/// Wrapper around a `VkDevice`. The device provides access to almost the entire
/// Vulkan API. Internal state is wrapped in an `Arc<DeviceInner>`, so this is safe
/// to clone
#[derive(Debug, Clone)]
pub struct Device {
    inner: Arc<DeviceInner>,
}

impl Device {
    /// Create a new Vulkan device with a single queue on the main queue family of the physical device.
    pub fn new(instance: &Instance, physical_device: &PhysicalDevice, settings: &AppSettings) -> anyhow::Result<Self> {
        let priorities = [1.0f32];
        let queue_family = physical_device.queue_family();
        let queue_info = vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(queue_family)
            .queue_priorities(&priorities)
            .build();

        let mut extension_names: Vec<CString> = settings
            .gpu_requirements
            .device_extensions
            .iter()
            .map(|ext| CString::new(ext.clone()))
            .collect::<std::result::Result<Vec<CString>, NulError>>()?;
        extension_names.push(CString::from(ash::extensions::khr::Swapchain::name()));

        info!("Enabled device extensions:");
        for ext in &extension_names {
            info!("{:?}", ext);
        }

        let extension_names_raw = raw_ptrs(extension_names.as_slice());
        let info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(slice::from_ref(&queue_info))
            .enabled_extension_names(extension_names_raw.as_slice())
            .enabled_features(&settings.gpu_requirements.features)
            .build();

        let handle = unsafe { instance.create_device(physical_device.handle(), &info, None)? };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDevice {:p}", handle.handle());
        let queue = unsafe { handle.get_device_queue(queue_family, 0) };
        let surface_fns = ash::extensions::khr::Surface::new(unsafe { instance.loader() }, instance);
        let swapchain_fns = ash::extensions::khr::Swapchain::new(instance, &handle);

        Ok(Device {
            inner: Arc::new(DeviceInner {
                handle,
                physical_device: unsafe { physical_device.handle() },
                queue_family,
                queue: Mutex::new(queue),
                properties: *physical_device.properties(),
                surface_fns,
                swapchain_fns,
            }),
        })
    }

    /// Get unsafe access to the underlying VkDevice handle
    /// # Safety
    /// * The caller should not call `vkDestroyDevice` on this.
    /// * This handle is valid as long as there is a copy of `self` alive.
    pub unsafe fn handle(&self) -> ash::Device {
        self.inner.handle.clone()
    }

    /// Get the family index of the main queue.
    pub fn queue_family(&self) -> u32 {
        self.inner.queue_family
    }

    /// Get the device properties
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.inner.properties
    }

    fn with_queue<R>(&self, f: impl FnOnce(vk::Queue) -> Result<R>) -> Result<R> {
        let queue = self.inner.queue.lock()?;
        f(*queue)
    }
}

impl Deref for Device {
    type Target = ash::Device;

    fn deref(&self) -> &Self::Target {
        &self.inner.handle
    }
}

impl Drop for DeviceInner {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDevice {:p}", self.handle.handle());
        unsafe {
            self.handle.destroy_device(None);
        }
    }
}

impl DeviceProvider for Device {
    fn surface_support(&self, surface: vk::SurfaceKHR) -> Result<SurfaceSupport> {
        let functions = &self.inner.surface_fns;
        let physical_device = self.inner.physical_device;
        unsafe {
            Ok(SurfaceSupport {
                capabilities: functions
                    .get_physical_device_surface_capabilities(physical_device, surface)
                    .op("vkGetPhysicalDeviceSurfaceCapabilitiesKHR")?,
                formats: functions
                    .get_physical_device_surface_formats(physical_device, surface)
                    .op("vkGetPhysicalDeviceSurfaceFormatsKHR")?,
                present_modes: functions
                    .get_physical_device_surface_present_modes(physical_device, surface)
                    .op("vkGetPhysicalDeviceSurfacePresentModesKHR")?,
            })
        }
    }

    fn create_swapchain(&self, surface: vk::SurfaceKHR, config: &SwapchainConfig) -> Result<vk::SwapchainKHR> {
        let info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface)
            .image_format(config.format.format)
            .image_color_space(config.format.color_space)
            .image_extent(config.extent)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .present_mode(config.present_mode)
            .min_image_count(config.image_count)
            .clipped(true)
            .pre_transform(config.pre_transform)
            .composite_alpha(config.composite_alpha)
            .build();
        unsafe { self.inner.swapchain_fns.create_swapchain(&info, None).op("vkCreateSwapchainKHR") }
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        unsafe { self.inner.swapchain_fns.get_swapchain_images(swapchain).op("vkGetSwapchainImagesKHR") }
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.inner.swapchain_fns.destroy_swapchain(swapchain, None) }
    }

    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> Result<vk::ImageView> {
        let info = vk::ImageViewCreateInfo::builder()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping::default())
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .build();
        unsafe { self.inner.handle.create_image_view(&info, None).op("vkCreateImageView") }
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.inner.handle.destroy_image_view(view, None) }
    }

    fn create_render_pass(&self, format: vk::Format) -> Result<vk::RenderPass> {
        let attachment = vk::AttachmentDescription::builder()
            .format(format)
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
            .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
            .initial_layout(vk::ImageLayout::UNDEFINED)
            .final_layout(vk::ImageLayout::PRESENT_SRC_KHR)
            .build();
        let color_ref = vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        };
        let subpass = vk::SubpassDescription::builder()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(slice::from_ref(&color_ref))
            .build();
        // The acquire semaphore is waited on at color output, so the layout transition has to wait for that stage too.
        let dependency = vk::SubpassDependency::builder()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)
            .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .build();
        let info = vk::RenderPassCreateInfo::builder()
            .attachments(slice::from_ref(&attachment))
            .subpasses(slice::from_ref(&subpass))
            .dependencies(slice::from_ref(&dependency))
            .build();
        unsafe { self.inner.handle.create_render_pass(&info, None).op("vkCreateRenderPass") }
    }

    fn destroy_render_pass(&self, pass: vk::RenderPass) {
        unsafe { self.inner.handle.destroy_render_pass(pass, None) }
    }

    fn create_framebuffer(&self, pass: vk::RenderPass, view: vk::ImageView, extent: vk::Extent2D) -> Result<vk::Framebuffer> {
        let info = vk::FramebufferCreateInfo::builder()
            .render_pass(pass)
            .attachments(slice::from_ref(&view))
            .width(extent.width)
            .height(extent.height)
            .layers(1)
            .build();
        unsafe { self.inner.handle.create_framebuffer(&info, None).op("vkCreateFramebuffer") }
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.inner.handle.destroy_framebuffer(framebuffer, None) }
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        let info = vk::FenceCreateInfo::builder()
            .flags(if signaled {
                vk::FenceCreateFlags::SIGNALED
            } else {
                vk::FenceCreateFlags::empty()
            })
            .build();
        unsafe { self.inner.handle.create_fence(&info, None).op("vkCreateFence") }
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout: Option<Duration>) -> Result<()> {
        let timeout = timeout
            .map(|t| u64::try_from(t.as_nanos()).unwrap_or(u64::MAX))
            .unwrap_or(u64::MAX);
        match unsafe { self.inner.handle.wait_for_fences(slice::from_ref(&fence), true, timeout) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(Error::Timeout {
                operation: "vkWaitForFences",
            }),
            Err(result) => Err(Error::Device {
                operation: "vkWaitForFences",
                result,
            }),
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.inner.handle.reset_fences(slice::from_ref(&fence)).op("vkResetFences") }
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.inner.handle.destroy_fence(fence, None) }
    }

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        let info = vk::SemaphoreCreateInfo::default();
        unsafe { self.inner.handle.create_semaphore(&info, None).op("vkCreateSemaphore") }
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.inner.handle.destroy_semaphore(semaphore, None) }
    }

    fn create_command_pool(&self) -> Result<vk::CommandPool> {
        let info = vk::CommandPoolCreateInfo::builder()
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
            .queue_family_index(self.inner.queue_family)
            .build();
        unsafe { self.inner.handle.create_command_pool(&info, None).op("vkCreateCommandPool") }
    }

    fn allocate_command_buffers(&self, pool: vk::CommandPool, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let info = vk::CommandBufferAllocateInfo::builder()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count)
            .build();
        unsafe { self.inner.handle.allocate_command_buffers(&info).op("vkAllocateCommandBuffers") }
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        unsafe { self.inner.handle.destroy_command_pool(pool, None) }
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.inner
                .handle
                .reset_command_buffer(cmd, vk::CommandBufferResetFlags::empty())
                .op("vkResetCommandBuffer")
        }
    }

    fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        let info = vk::CommandBufferBeginInfo::builder()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT)
            .build();
        unsafe { self.inner.handle.begin_command_buffer(cmd, &info).op("vkBeginCommandBuffer") }
    }

    fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()> {
        unsafe { self.inner.handle.end_command_buffer(cmd).op("vkEndCommandBuffer") }
    }

    fn acquire_next_image(&self, swapchain: vk::SwapchainKHR, signal: vk::Semaphore) -> Result<Acquired> {
        let result = unsafe {
            self.inner
                .swapchain_fns
                .acquire_next_image(swapchain, u64::MAX, signal, vk::Fence::null())
        };
        match result {
            Ok((index, suboptimal)) => Ok(Acquired::Image {
                index,
                suboptimal,
            }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Acquired::OutOfDate),
            Err(result) => Err(Error::Device {
                operation: "vkAcquireNextImageKHR",
                result,
            }),
        }
    }

    fn queue_submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stage: vk::PipelineStageFlags,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()> {
        let submit = vk::SubmitInfo::builder()
            .wait_semaphores(slice::from_ref(&wait))
            .wait_dst_stage_mask(slice::from_ref(&wait_stage))
            .command_buffers(slice::from_ref(&cmd))
            .signal_semaphores(slice::from_ref(&signal))
            .build();
        self.with_queue(|queue| unsafe {
            self.inner
                .handle
                .queue_submit(queue, slice::from_ref(&submit), fence)
                .op("vkQueueSubmit")
        })
    }

    fn queue_present(&self, swapchain: vk::SwapchainKHR, image_index: u32, wait: vk::Semaphore) -> Result<Presented> {
        let info = vk::PresentInfoKHR::builder()
            .wait_semaphores(slice::from_ref(&wait))
            .swapchains(slice::from_ref(&swapchain))
            .image_indices(slice::from_ref(&image_index))
            .build();
        self.with_queue(|queue| {
            match unsafe { self.inner.swapchain_fns.queue_present(queue, &info) } {
                Ok(false) => Ok(Presented::Optimal),
                Ok(true) => Ok(Presented::Suboptimal),
                Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(Presented::OutOfDate),
                Err(result) => Err(Error::Device {
                    operation: "vkQueuePresentKHR",
                    result,
                }),
            }
        })
    }

    /// Wait for the device to be completely idle.
    /// This should not be used as a synchronization measure, except on exit or when rebuilding the swapchain.
    fn wait_idle(&self) -> Result<()> {
        unsafe { self.inner.handle.device_wait_idle().op("vkDeviceWaitIdle") }
    }
}

impl RecordCommands for Device {
    fn cmd_begin_render_pass(
        &self,
        cmd: vk::CommandBuffer,
        pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        extent: vk::Extent2D,
        clear: vk::ClearValue,
    ) {
        let info = vk::RenderPassBeginInfo::builder()
            .render_pass(pass)
            .framebuffer(framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D::default(),
                extent,
            })
            .clear_values(slice::from_ref(&clear))
            .build();
        unsafe { self.inner.handle.cmd_begin_render_pass(cmd, &info, vk::SubpassContents::INLINE) }
    }

    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer) {
        unsafe { self.inner.handle.cmd_end_render_pass(cmd) }
    }

    fn cmd_set_viewport_scissor(&self, cmd: vk::CommandBuffer, extent: vk::Extent2D) {
        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: extent.width as f32,
            height: extent.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        let scissor = vk::Rect2D {
            offset: vk::Offset2D::default(),
            extent,
        };
        unsafe {
            self.inner.handle.cmd_set_viewport(cmd, 0, slice::from_ref(&viewport));
            self.inner.handle.cmd_set_scissor(cmd, 0, slice::from_ref(&scissor));
        }
    }

    fn cmd_bind_pipeline(&self, cmd: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.inner
                .handle
                .cmd_bind_pipeline(cmd, vk::PipelineBindPoint::GRAPHICS, pipeline)
        }
    }

    fn cmd_bind_vertex_buffer(&self, cmd: vk::CommandBuffer, binding: u32, buffer: vk::Buffer, offset: vk::DeviceSize) {
        unsafe {
            self.inner
                .handle
                .cmd_bind_vertex_buffers(cmd, binding, slice::from_ref(&buffer), slice::from_ref(&offset))
        }
    }

    fn cmd_bind_index_buffer(&self, cmd: vk::CommandBuffer, buffer: vk::Buffer, offset: vk::DeviceSize, ty: vk::IndexType) {
        unsafe { self.inner.handle.cmd_bind_index_buffer(cmd, buffer, offset, ty) }
    }

    fn cmd_bind_descriptor_set(&self, cmd: vk::CommandBuffer, layout: vk::PipelineLayout, first_set: u32, set: vk::DescriptorSet) {
        unsafe {
            self.inner.handle.cmd_bind_descriptor_sets(
                cmd,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                first_set,
                slice::from_ref(&set),
                &[],
            )
        }
    }

    fn cmd_push_constants(&self, cmd: vk::CommandBuffer, layout: vk::PipelineLayout, stages: vk::ShaderStageFlags, offset: u32, data: &[u8]) {
        unsafe { self.inner.handle.cmd_push_constants(cmd, layout, stages, offset, data) }
    }

    fn cmd_draw(&self, cmd: vk::CommandBuffer, vertex_count: u32, instance_count: u32, first_vertex: u32, first_instance: u32) {
        unsafe {
            self.inner
                .handle
                .cmd_draw(cmd, vertex_count, instance_count, first_vertex, first_instance)
        }
    }

    fn cmd_draw_indexed(
        &self,
        cmd: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.inner
                .handle
                .cmd_draw_indexed(cmd, index_count, instance_count, first_index, vertex_offset, first_instance)
        }
    }
}
