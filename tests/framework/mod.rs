#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ash::vk;
use ash::vk::Handle;

use lantern::{
    Acquired, DeviceProvider, Error, FrameManager, PresentSettings, Presented, RecordCommands, Surface, SurfaceSupport,
    SwapchainConfig, WindowState,
};

type LanternResult<T> = lantern::core::error::Result<T>;

/// A single recorded call on the mock device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Call {
    /// Name of the Vulkan function this call corresponds to.
    pub op: &'static str,
    /// Raw value of the handle the call operates on, or zero.
    pub handle: u64,
}

#[derive(Debug)]
pub struct MockState {
    pub support: SurfaceSupport,
    /// Amount of images the driver creates on top of the requested image count.
    pub extra_images: u32,
    /// Results returned by the next calls to acquire. When empty, images are handed out round-robin.
    pub acquire_script: VecDeque<Result<Acquired, vk::Result>>,
    /// Results returned by the next calls to present. When empty, presentation is optimal.
    pub present_script: VecDeque<Result<Presented, vk::Result>>,
    /// Whether submissions signal their fence right away.
    pub auto_signal: bool,
    pub calls: Vec<Call>,
    pub last_config: Option<SwapchainConfig>,
    pub last_viewport: Option<vk::Extent2D>,
    pub push_constants: Vec<Vec<u8>>,
    /// Live objects, by raw handle.
    live: HashMap<u64, &'static str>,
    fences: HashMap<u64, bool>,
    swapchain_images: HashMap<u64, Vec<vk::Image>>,
    /// Operation that fails after a number of successful calls.
    failures: HashMap<&'static str, (usize, vk::Result)>,
    next_handle: u64,
    next_image: u32,
}

impl MockState {
    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    fn record(&mut self, op: &'static str, handle: u64) {
        self.calls.push(Call {
            op,
            handle,
        });
    }

    /// Record a call that can fail.
    fn call(&mut self, op: &'static str, handle: u64) -> LanternResult<()> {
        self.record(op, handle);
        if let Some((remaining, result)) = self.failures.get_mut(op) {
            if *remaining == 0 {
                let result = *result;
                self.failures.remove(op);
                return Err(Error::Device {
                    operation: op,
                    result,
                });
            }
            *remaining -= 1;
        }
        Ok(())
    }

    fn create(&mut self, op: &'static str, kind: &'static str) -> LanternResult<u64> {
        self.call(op, 0)?;
        let handle = self.handle();
        self.live.insert(handle, kind);
        Ok(handle)
    }

    fn destroy(&mut self, op: &'static str, handle: u64) {
        self.record(op, handle);
        let removed = self.live.remove(&handle);
        assert!(removed.is_some(), "{op} called on unknown or already destroyed handle {handle}");
    }
}

/// In-memory device that records every call made to it.
#[derive(Debug, Clone)]
pub struct MockDevice {
    state: Arc<Mutex<MockState>>,
}

pub fn surface_format(format: vk::Format) -> vk::SurfaceFormatKHR {
    vk::SurfaceFormatKHR {
        format,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    }
}

pub fn extent(width: u32, height: u32) -> vk::Extent2D {
    vk::Extent2D {
        width,
        height,
    }
}

impl MockDevice {
    /// A surface with 800x600 extent, `minImageCount = 2` and no maximum, supporting FIFO and IMMEDIATE.
    pub fn new() -> Self {
        let support = SurfaceSupport {
            capabilities: vk::SurfaceCapabilitiesKHR {
                min_image_count: 2,
                max_image_count: 0,
                current_extent: extent(800, 600),
                min_image_extent: extent(1, 1),
                max_image_extent: extent(4096, 4096),
                current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
                supported_composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
                ..Default::default()
            },
            formats: vec![surface_format(vk::Format::B8G8R8A8_UNORM)],
            present_modes: vec![vk::PresentModeKHR::FIFO, vk::PresentModeKHR::IMMEDIATE],
        };
        MockDevice {
            state: Arc::new(Mutex::new(MockState {
                support,
                extra_images: 0,
                acquire_script: VecDeque::new(),
                present_script: VecDeque::new(),
                auto_signal: true,
                calls: vec![],
                last_config: None,
                last_viewport: None,
                push_constants: vec![],
                live: HashMap::new(),
                fences: HashMap::new(),
                swapchain_images: HashMap::new(),
                failures: HashMap::new(),
                // Start at a high value so handles never collide with the raw surface handle.
                next_handle: 0x1000,
                next_image: 0,
            })),
        }
    }

    pub fn state(&self) -> MutexGuard<MockState> {
        self.state.lock().unwrap()
    }

    /// Change the surface extent reported by the driver, as happens on a window resize.
    pub fn set_surface_extent(&self, width: u32, height: u32) {
        self.state().support.capabilities.current_extent = extent(width, height);
    }

    pub fn push_acquire(&self, result: Result<Acquired, vk::Result>) {
        self.state().acquire_script.push_back(result);
    }

    pub fn push_present(&self, result: Result<Presented, vk::Result>) {
        self.state().present_script.push_back(result);
    }

    /// Make `op` fail with `result` after `after` more successful calls.
    pub fn fail_on(&self, op: &'static str, after: usize, result: vk::Result) {
        self.state().failures.insert(op, (after, result));
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn ops(&self) -> Vec<&'static str> {
        self.state().calls.iter().map(|call| call.op).collect()
    }

    pub fn count(&self, op: &str) -> usize {
        self.state().calls.iter().filter(|call| call.op == op).count()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    /// Amount of objects that were created and not yet destroyed.
    pub fn live_count(&self) -> usize {
        self.state().live.len()
    }

    pub fn live_of_kind(&self, kind: &str) -> usize {
        self.state().live.values().filter(|k| **k == kind).count()
    }

    pub fn is_signaled(&self, fence: u64) -> bool {
        self.state().fences.get(&fence).copied().unwrap_or(false)
    }

    pub fn signal_all_fences(&self) {
        self.state().fences.values_mut().for_each(|signaled| *signaled = true);
    }

    /// A surface handle that is not owned by anyone.
    pub fn surface(&self) -> Surface {
        Surface::from_raw(vk::SurfaceKHR::from_raw(0xdead)).unwrap()
    }
}

impl DeviceProvider for MockDevice {
    fn surface_support(&self, surface: vk::SurfaceKHR) -> LanternResult<SurfaceSupport> {
        let mut state = self.state();
        state.call("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", surface.as_raw())?;
        Ok(state.support.clone())
    }

    fn create_swapchain(&self, _surface: vk::SurfaceKHR, config: &SwapchainConfig) -> LanternResult<vk::SwapchainKHR> {
        let mut state = self.state();
        let handle = state.create("vkCreateSwapchainKHR", "swapchain")?;
        let count = config.image_count + state.extra_images;
        let images = (0..count).map(|_| vk::Image::from_raw(state.handle())).collect();
        state.swapchain_images.insert(handle, images);
        state.last_config = Some(*config);
        state.next_image = 0;
        Ok(vk::SwapchainKHR::from_raw(handle))
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> LanternResult<Vec<vk::Image>> {
        let mut state = self.state();
        state.call("vkGetSwapchainImagesKHR", swapchain.as_raw())?;
        Ok(state.swapchain_images.get(&swapchain.as_raw()).cloned().unwrap_or_default())
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        let mut state = self.state();
        state.swapchain_images.remove(&swapchain.as_raw());
        state.destroy("vkDestroySwapchainKHR", swapchain.as_raw());
    }

    fn create_image_view(&self, _image: vk::Image, _format: vk::Format) -> LanternResult<vk::ImageView> {
        Ok(vk::ImageView::from_raw(self.state().create("vkCreateImageView", "image view")?))
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        self.state().destroy("vkDestroyImageView", view.as_raw());
    }

    fn create_render_pass(&self, _format: vk::Format) -> LanternResult<vk::RenderPass> {
        Ok(vk::RenderPass::from_raw(self.state().create("vkCreateRenderPass", "render pass")?))
    }

    fn destroy_render_pass(&self, pass: vk::RenderPass) {
        self.state().destroy("vkDestroyRenderPass", pass.as_raw());
    }

    fn create_framebuffer(
        &self,
        _pass: vk::RenderPass,
        _view: vk::ImageView,
        _extent: vk::Extent2D,
    ) -> LanternResult<vk::Framebuffer> {
        Ok(vk::Framebuffer::from_raw(self.state().create("vkCreateFramebuffer", "framebuffer")?))
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        self.state().destroy("vkDestroyFramebuffer", framebuffer.as_raw());
    }

    fn create_fence(&self, signaled: bool) -> LanternResult<vk::Fence> {
        let mut state = self.state();
        let handle = state.create("vkCreateFence", "fence")?;
        state.fences.insert(handle, signaled);
        Ok(vk::Fence::from_raw(handle))
    }

    fn wait_for_fence(&self, fence: vk::Fence, _timeout: Option<Duration>) -> LanternResult<()> {
        let mut state = self.state();
        state.call("vkWaitForFences", fence.as_raw())?;
        // An unsignaled fence would block forever, report it as a timeout instead.
        if state.fences.get(&fence.as_raw()).copied().unwrap_or(false) {
            Ok(())
        } else {
            Err(Error::Timeout {
                operation: "vkWaitForFences",
            })
        }
    }

    fn reset_fence(&self, fence: vk::Fence) -> LanternResult<()> {
        let mut state = self.state();
        state.call("vkResetFences", fence.as_raw())?;
        state.fences.insert(fence.as_raw(), false);
        Ok(())
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        let mut state = self.state();
        state.fences.remove(&fence.as_raw());
        state.destroy("vkDestroyFence", fence.as_raw());
    }

    fn create_semaphore(&self) -> LanternResult<vk::Semaphore> {
        Ok(vk::Semaphore::from_raw(self.state().create("vkCreateSemaphore", "semaphore")?))
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        self.state().destroy("vkDestroySemaphore", semaphore.as_raw());
    }

    fn create_command_pool(&self) -> LanternResult<vk::CommandPool> {
        Ok(vk::CommandPool::from_raw(self.state().create("vkCreateCommandPool", "command pool")?))
    }

    fn allocate_command_buffers(&self, pool: vk::CommandPool, count: u32) -> LanternResult<Vec<vk::CommandBuffer>> {
        let mut state = self.state();
        state.call("vkAllocateCommandBuffers", pool.as_raw())?;
        Ok((0..count).map(|_| vk::CommandBuffer::from_raw(state.handle())).collect())
    }

    fn destroy_command_pool(&self, pool: vk::CommandPool) {
        self.state().destroy("vkDestroyCommandPool", pool.as_raw());
    }

    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> LanternResult<()> {
        self.state().call("vkResetCommandBuffer", cmd.as_raw())
    }

    fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> LanternResult<()> {
        self.state().call("vkBeginCommandBuffer", cmd.as_raw())
    }

    fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> LanternResult<()> {
        self.state().call("vkEndCommandBuffer", cmd.as_raw())
    }

    fn acquire_next_image(&self, swapchain: vk::SwapchainKHR, _signal: vk::Semaphore) -> LanternResult<Acquired> {
        let mut state = self.state();
        state.call("vkAcquireNextImageKHR", swapchain.as_raw())?;
        match state.acquire_script.pop_front() {
            Some(Ok(acquired)) => Ok(acquired),
            Some(Err(result)) => Err(Error::Device {
                operation: "vkAcquireNextImageKHR",
                result,
            }),
            None => {
                let count = state
                    .swapchain_images
                    .get(&swapchain.as_raw())
                    .map(|images| images.len() as u32)
                    .unwrap_or(1)
                    .max(1);
                let index = state.next_image % count;
                state.next_image += 1;
                Ok(Acquired::Image {
                    index,
                    suboptimal: false,
                })
            }
        }
    }

    fn queue_submit(
        &self,
        cmd: vk::CommandBuffer,
        _wait: vk::Semaphore,
        _wait_stage: vk::PipelineStageFlags,
        _signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> LanternResult<()> {
        let mut state = self.state();
        state.call("vkQueueSubmit", cmd.as_raw())?;
        state.record("submit fence", fence.as_raw());
        if state.auto_signal {
            state.fences.insert(fence.as_raw(), true);
        }
        Ok(())
    }

    fn queue_present(&self, swapchain: vk::SwapchainKHR, image_index: u32, _wait: vk::Semaphore) -> LanternResult<Presented> {
        let mut state = self.state();
        state.call("vkQueuePresentKHR", swapchain.as_raw())?;
        state.record("present image", image_index as u64);
        match state.present_script.pop_front() {
            Some(Ok(presented)) => Ok(presented),
            Some(Err(result)) => Err(Error::Device {
                operation: "vkQueuePresentKHR",
                result,
            }),
            None => Ok(Presented::Optimal),
        }
    }

    fn wait_idle(&self) -> LanternResult<()> {
        let mut state = self.state();
        state.call("vkDeviceWaitIdle", 0)?;
        // Everything submitted is complete once the device is idle.
        state.fences.values_mut().for_each(|signaled| *signaled = true);
        Ok(())
    }
}

impl RecordCommands for MockDevice {
    fn cmd_begin_render_pass(
        &self,
        _cmd: vk::CommandBuffer,
        _pass: vk::RenderPass,
        framebuffer: vk::Framebuffer,
        _extent: vk::Extent2D,
        _clear: vk::ClearValue,
    ) {
        self.state().record("vkCmdBeginRenderPass", framebuffer.as_raw());
    }

    fn cmd_end_render_pass(&self, cmd: vk::CommandBuffer) {
        self.state().record("vkCmdEndRenderPass", cmd.as_raw());
    }

    fn cmd_set_viewport_scissor(&self, cmd: vk::CommandBuffer, extent: vk::Extent2D) {
        let mut state = self.state();
        state.record("vkCmdSetViewport", cmd.as_raw());
        state.last_viewport = Some(extent);
    }

    fn cmd_bind_pipeline(&self, _cmd: vk::CommandBuffer, pipeline: vk::Pipeline) {
        self.state().record("vkCmdBindPipeline", pipeline.as_raw());
    }

    fn cmd_bind_vertex_buffer(&self, _cmd: vk::CommandBuffer, _binding: u32, buffer: vk::Buffer, _offset: vk::DeviceSize) {
        self.state().record("vkCmdBindVertexBuffers", buffer.as_raw());
    }

    fn cmd_bind_index_buffer(&self, _cmd: vk::CommandBuffer, buffer: vk::Buffer, _offset: vk::DeviceSize, _ty: vk::IndexType) {
        self.state().record("vkCmdBindIndexBuffer", buffer.as_raw());
    }

    fn cmd_bind_descriptor_set(&self, _cmd: vk::CommandBuffer, _layout: vk::PipelineLayout, _first_set: u32, set: vk::DescriptorSet) {
        self.state().record("vkCmdBindDescriptorSets", set.as_raw());
    }

    fn cmd_push_constants(&self, cmd: vk::CommandBuffer, _layout: vk::PipelineLayout, _stages: vk::ShaderStageFlags, _offset: u32, data: &[u8]) {
        let mut state = self.state();
        state.record("vkCmdPushConstants", cmd.as_raw());
        state.push_constants.push(data.to_vec());
    }

    fn cmd_draw(&self, cmd: vk::CommandBuffer, _vertex_count: u32, _instance_count: u32, _first_vertex: u32, _first_instance: u32) {
        self.state().record("vkCmdDraw", cmd.as_raw());
    }

    fn cmd_draw_indexed(
        &self,
        cmd: vk::CommandBuffer,
        _index_count: u32,
        _instance_count: u32,
        _first_index: u32,
        _vertex_offset: i32,
        _first_instance: u32,
    ) {
        self.state().record("vkCmdDrawIndexed", cmd.as_raw());
    }
}

/// Present settings for tests: vsync with the given amount of frames in flight.
pub fn present_settings(frames_in_flight: usize) -> PresentSettings {
    PresentSettings {
        frames_in_flight,
        ..Default::default()
    }
}

/// Creates a frame manager on a mock device, ready for automated tests
pub fn make_frame_manager(frames_in_flight: usize) -> anyhow::Result<(MockDevice, FrameManager<MockDevice>, WindowState)> {
    let _ = pretty_env_logger::try_init();
    let device = MockDevice::new();
    let window = WindowState::new(800, 600);
    let frame = FrameManager::new(device.clone(), device.surface(), &present_settings(frames_in_flight), window.extent())?;
    Ok((device, frame, window))
}

/// Draw callback that records nothing.
pub fn no_draw(_: &mut lantern::DrawContext<MockDevice>) -> anyhow::Result<()> {
    Ok(())
}
