//! Render pass and framebuffers for the swapchain images.

use ash::vk;

use crate::core::error::{Error, Result};
use crate::core::traits::DeviceProvider;
use crate::{Device, Swapchain};

/// A render pass with one framebuffer per swapchain image.
///
/// Render targets remember the swapchain generation they were built for. After the swapchain is rebuilt they are stale,
/// and must be rebuilt as well before they can be used again.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct RenderTargets<D: DeviceProvider = Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    render_pass: vk::RenderPass,
    framebuffers: Vec<vk::Framebuffer>,
    extent: vk::Extent2D,
    generation: u64,
    #[derivative(Debug = "ignore")]
    clear_value: vk::ClearValue,
}

impl<D: DeviceProvider> RenderTargets<D> {
    /// Create a render pass for the swapchain format and a framebuffer for every swapchain image view.
    /// Swapchain images are cleared to `clear_color` at the start of the render pass.
    pub fn new(device: D, swapchain: &Swapchain<D>, clear_color: [f32; 4]) -> Result<Self> {
        let mut targets = RenderTargets {
            device,
            render_pass: vk::RenderPass::null(),
            framebuffers: vec![],
            extent: vk::Extent2D::default(),
            generation: 0,
            clear_value: vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: clear_color,
                },
            },
        };
        // Anything created before a failure is destroyed by Drop.
        targets.build(swapchain)?;
        Ok(targets)
    }

    fn build(&mut self, swapchain: &Swapchain<D>) -> Result<()> {
        let extent = swapchain.extent();
        self.render_pass = self.device.create_render_pass(swapchain.format().format)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkRenderPass {:p}", self.render_pass);
        for view in swapchain.views() {
            let framebuffer = self.device.create_framebuffer(self.render_pass, *view, extent)?;
            self.framebuffers.push(framebuffer);
        }
        self.extent = extent;
        self.generation = swapchain.generation();
        Ok(())
    }

    /// Destroy all framebuffers, then the render pass. Safe to call multiple times.
    pub fn teardown(&mut self) {
        for framebuffer in self.framebuffers.drain(..) {
            self.device.destroy_framebuffer(framebuffer);
        }
        if self.render_pass != vk::RenderPass::null() {
            #[cfg(feature = "log-objects")]
            trace!("Destroying VkRenderPass {:p}", self.render_pass);
            self.device.destroy_render_pass(self.render_pass);
            self.render_pass = vk::RenderPass::null();
        }
    }

    /// Build the render targets for a rebuilt swapchain. [`RenderTargets::teardown`] must have been called before
    /// the swapchain replaced its image views.
    pub fn rebuild(&mut self, swapchain: &Swapchain<D>) -> Result<()> {
        if self.render_pass != vk::RenderPass::null() {
            warn!("Render targets rebuilt without a teardown, framebuffers may have outlived their image views.");
            self.teardown();
        }
        if let Err(err) = self.build(swapchain) {
            self.teardown();
            return Err(err);
        }
        Ok(())
    }

    /// Whether these render targets were built for the current state of the swapchain.
    pub fn is_current_for(&self, swapchain: &Swapchain<D>) -> bool {
        self.render_pass != vk::RenderPass::null()
            && self.generation == swapchain.generation()
            && self.framebuffers.len() == swapchain.image_count()
    }

    /// Get the framebuffer for a swapchain image.
    pub fn framebuffer(&self, image_index: u32) -> Result<vk::Framebuffer> {
        self.framebuffers
            .get(image_index as usize)
            .copied()
            .ok_or(Error::ImageIndexOutOfRange {
                index: image_index,
                count: self.framebuffers.len(),
            })
    }

    pub fn framebuffer_count(&self) -> usize {
        self.framebuffers.len()
    }

    /// Get unsafe access to the render pass handle, for example to create pipelines that are compatible with it.
    /// # Safety
    /// The render pass must not be destroyed, and pipelines created with it are only valid until the next rebuild
    /// if the swapchain format changes.
    pub unsafe fn render_pass(&self) -> vk::RenderPass {
        self.render_pass
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn clear_value(&self) -> vk::ClearValue {
        self.clear_value
    }

    /// Swapchain generation these render targets were built for.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<D: DeviceProvider> Drop for RenderTargets<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
