//! Defines the device provider trait, the seam between lantern's presentation logic and the Vulkan device.
//!
//! [`Device`](crate::Device) implements this on top of `ash`. Everything in [`wsi`](crate::wsi) is generic over it,
//! which allows running the frame state machine against any other implementation.

use std::time::Duration;

use ash::vk;

use crate::command_buffer::traits::RecordCommands;
use crate::core::error::Result;

/// Everything a surface reports about its support on a physical device.
#[derive(Debug, Clone, Default)]
pub struct SurfaceSupport {
    /// [`VkSurfaceCapabilitiesKHR`](vk::SurfaceCapabilitiesKHR) of the surface.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// All supported surface formats.
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// All supported present modes.
    pub present_modes: Vec<vk::PresentModeKHR>,
}

/// Swapchain parameters, the result of [`configure`](crate::wsi::swapchain::configure).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SwapchainConfig {
    /// Format and color space of the swapchain images.
    pub format: vk::SurfaceFormatKHR,
    /// Present mode.
    pub present_mode: vk::PresentModeKHR,
    /// Size of the swapchain images.
    pub extent: vk::Extent2D,
    /// Minimum amount of images requested. The driver may create more.
    pub image_count: u32,
    /// Surface transform applied on presentation.
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
    /// Alpha compositing mode.
    pub composite_alpha: vk::CompositeAlphaFlagsKHR,
}

/// Outcome of acquiring a swapchain image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Acquired {
    /// An image was acquired. If `suboptimal` is set, the image can still be used but the swapchain
    /// should be rebuilt after presenting.
    Image {
        index: u32,
        suboptimal: bool,
    },
    /// The swapchain no longer matches the surface and must be rebuilt. No semaphore was signaled.
    OutOfDate,
}

/// Outcome of presenting an image.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Presented {
    Optimal,
    Suboptimal,
    OutOfDate,
}

impl Presented {
    /// Whether the swapchain should be rebuilt after this presentation.
    pub fn needs_rebuild(&self) -> bool {
        !matches!(self, Presented::Optimal)
    }
}

/// Device operations required to drive presentation.
///
/// Implementors are cheap handles to a shared device, every object holds its own clone.
/// All functions returning an error must report it as [`Error::Device`](crate::Error::Device) naming the Vulkan function,
/// except for fence waits that expire, which report [`Error::Timeout`](crate::Error::Timeout).
pub trait DeviceProvider: Clone + RecordCommands {
    /// Query surface capabilities, formats and present modes.
    fn surface_support(&self, surface: vk::SurfaceKHR) -> Result<SurfaceSupport>;

    fn create_swapchain(&self, surface: vk::SurfaceKHR, config: &SwapchainConfig) -> Result<vk::SwapchainKHR>;
    /// Get the images owned by a swapchain. Their amount may differ from the requested image count.
    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>>;
    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR);

    /// Create a 2D color view over a full image with identity swizzle.
    fn create_image_view(&self, image: vk::Image, format: vk::Format) -> Result<vk::ImageView>;
    fn destroy_image_view(&self, view: vk::ImageView);

    /// Create a render pass with a single color attachment that is cleared on load and transitioned to presentation layout.
    fn create_render_pass(&self, format: vk::Format) -> Result<vk::RenderPass>;
    fn destroy_render_pass(&self, pass: vk::RenderPass);
    fn create_framebuffer(&self, pass: vk::RenderPass, view: vk::ImageView, extent: vk::Extent2D) -> Result<vk::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer);

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence>;
    /// Block until the fence is signaled. `None` waits indefinitely.
    fn wait_for_fence(&self, fence: vk::Fence, timeout: Option<Duration>) -> Result<()>;
    fn reset_fence(&self, fence: vk::Fence) -> Result<()>;
    fn destroy_fence(&self, fence: vk::Fence);

    fn create_semaphore(&self) -> Result<vk::Semaphore>;
    fn destroy_semaphore(&self, semaphore: vk::Semaphore);

    /// Create a command pool on the main queue family whose command buffers can be reset individually.
    fn create_command_pool(&self) -> Result<vk::CommandPool>;
    fn allocate_command_buffers(&self, pool: vk::CommandPool, count: u32) -> Result<Vec<vk::CommandBuffer>>;
    /// Destroys the pool and frees all command buffers allocated from it.
    fn destroy_command_pool(&self, pool: vk::CommandPool);
    fn reset_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
    fn begin_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;
    fn end_command_buffer(&self, cmd: vk::CommandBuffer) -> Result<()>;

    fn acquire_next_image(&self, swapchain: vk::SwapchainKHR, signal: vk::Semaphore) -> Result<Acquired>;
    /// Submit a command buffer to the main queue.
    fn queue_submit(
        &self,
        cmd: vk::CommandBuffer,
        wait: vk::Semaphore,
        wait_stage: vk::PipelineStageFlags,
        signal: vk::Semaphore,
        fence: vk::Fence,
    ) -> Result<()>;
    fn queue_present(&self, swapchain: vk::SwapchainKHR, image_index: u32, wait: vk::Semaphore) -> Result<Presented>;

    /// Wait for the device to be completely idle.
    fn wait_idle(&self) -> Result<()>;
}
