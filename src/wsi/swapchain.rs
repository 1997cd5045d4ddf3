//! Swapchain configuration and lifetime management.
//!
//! [`configure`] is a pure function that turns what a surface supports into the parameters of a new swapchain.
//! [`Swapchain`] owns the resulting `VkSwapchainKHR` together with one image view per swapchain image,
//! and can tear itself down and rebuild when the surface changes.

use ash::vk;

use crate::core::error::{Error, Result};
use crate::core::traits::{DeviceProvider, SurfaceSupport, SwapchainConfig};
use crate::{Device, Surface};

/// Formats tried in order when no preferred format is given, or when the preferred format is unsupported.
const PREFERRED_FORMATS: [vk::SurfaceFormatKHR; 4] = [
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_UNORM,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
];

/// Pick swapchain parameters from the surface support information.
/// # Errors
/// Fails with [`Error::UnsupportedSurface`] if the surface reports no formats or no present modes.
pub fn configure(
    support: &SurfaceSupport,
    vsync: bool,
    preferred_format: Option<vk::SurfaceFormatKHR>,
    window_extent: vk::Extent2D,
) -> Result<SwapchainConfig> {
    if support.formats.is_empty() || support.present_modes.is_empty() {
        return Err(Error::UnsupportedSurface);
    }
    let capabilities = &support.capabilities;
    Ok(SwapchainConfig {
        format: choose_surface_format(&support.formats, preferred_format)?,
        present_mode: choose_present_mode(&support.present_modes, vsync),
        extent: choose_swapchain_extent(capabilities, window_extent),
        image_count: choose_image_count(capabilities),
        pre_transform: capabilities.current_transform,
        composite_alpha: choose_composite_alpha(capabilities.supported_composite_alpha),
    })
}

fn choose_surface_format(formats: &[vk::SurfaceFormatKHR], preferred: Option<vk::SurfaceFormatKHR>) -> Result<vk::SurfaceFormatKHR> {
    if let Some(preferred) = preferred {
        if formats.contains(&preferred) {
            return Ok(preferred);
        }
        debug!("Preferred surface format {preferred:?} is not supported, using a fallback format.");
    }
    PREFERRED_FORMATS
        .iter()
        .find(|format| formats.contains(format))
        .or_else(|| formats.first())
        .copied()
        .ok_or(Error::UnsupportedSurface)
}

fn choose_present_mode(present_modes: &[vk::PresentModeKHR], vsync: bool) -> vk::PresentModeKHR {
    if vsync {
        return vk::PresentModeKHR::FIFO;
    }
    if present_modes.contains(&vk::PresentModeKHR::IMMEDIATE) {
        vk::PresentModeKHR::IMMEDIATE
    } else {
        // VSync, guaranteed to be supported
        warn!("Surface does not support immediate presentation, falling back to FIFO.");
        vk::PresentModeKHR::FIFO
    }
}

fn choose_image_count(capabilities: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let count = capabilities.min_image_count + 1;
    // A maximum of zero means there is no limit
    if capabilities.max_image_count != 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

fn choose_swapchain_extent(capabilities: &vk::SurfaceCapabilitiesKHR, window_extent: vk::Extent2D) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    vk::Extent2D {
        width: window_extent
            .width
            .clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
        height: window_extent
            .height
            .clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
    }
}

fn choose_composite_alpha(supported: vk::CompositeAlphaFlagsKHR) -> vk::CompositeAlphaFlagsKHR {
    const ORDER: [vk::CompositeAlphaFlagsKHR; 4] = [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::INHERIT,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
    ];
    ORDER
        .into_iter()
        .find(|mode| supported.contains(*mode))
        .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// A swapchain is an abstraction of a presentation system. It handles buffering, VSync, and acquiring images
/// to render and present frames to.
///
/// The amount of images and views always match. Both are replaced entirely on [`Swapchain::rebuild`].
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Swapchain<D: DeviceProvider = Device> {
    #[derivative(Debug = "ignore")]
    device: D,
    surface: vk::SurfaceKHR,
    /// Handle to the [`VkSwapchainKHR`](vk::SwapchainKHR) object. Null after teardown.
    handle: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    views: Vec<vk::ImageView>,
    config: SwapchainConfig,
    vsync: bool,
    preferred_format: Option<vk::SurfaceFormatKHR>,
    generation: u64,
}

impl<D: DeviceProvider> Swapchain<D> {
    /// Create a new swapchain for a surface.
    pub fn new(
        device: D,
        surface: &Surface,
        vsync: bool,
        preferred_format: Option<vk::SurfaceFormatKHR>,
        window_extent: vk::Extent2D,
    ) -> Result<Self> {
        let surface = unsafe { surface.handle() };
        let support = device.surface_support(surface)?;
        let config = configure(&support, vsync, preferred_format, window_extent)?;
        let mut swapchain = Swapchain {
            device,
            surface,
            handle: vk::SwapchainKHR::null(),
            images: vec![],
            views: vec![],
            config,
            vsync,
            preferred_format,
            generation: 0,
        };
        swapchain.build()?;
        Ok(swapchain)
    }

    /// Create the swapchain, its images and views from the current configuration.
    /// On failure, everything created so far is destroyed again.
    fn build(&mut self) -> Result<()> {
        self.handle = self.device.create_swapchain(self.surface, &self.config)?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkSwapchainKHR {:p}", self.handle);
        if let Err(err) = self.create_views() {
            self.teardown();
            return Err(err);
        }
        info!(
            "Created swapchain with {} images of {}x{} ({:?}, {:?}).",
            self.images.len(),
            self.config.extent.width,
            self.config.extent.height,
            self.config.format.format,
            self.config.present_mode
        );
        Ok(())
    }

    fn create_views(&mut self) -> Result<()> {
        self.images = self.device.swapchain_images(self.handle)?;
        for image in &self.images {
            let view = self.device.create_image_view(*image, self.config.format.format)?;
            self.views.push(view);
        }
        Ok(())
    }

    /// Destroy all image views, then the swapchain itself. Safe to call multiple times.
    fn teardown(&mut self) {
        for view in self.views.drain(..) {
            self.device.destroy_image_view(view);
        }
        self.images.clear();
        if self.handle != vk::SwapchainKHR::null() {
            #[cfg(feature = "log-objects")]
            trace!("Destroying VkSwapchainKHR {:p}", self.handle);
            self.device.destroy_swapchain(self.handle);
            self.handle = vk::SwapchainKHR::null();
        }
    }

    /// Query the surface and pick the configuration for a new swapchain.
    ///
    /// Returns `None` when the new extent would have zero area, which happens while a window is minimized.
    /// Nothing is destroyed in that case and the caller should try again later.
    pub fn prepare_rebuild(&self, window_extent: vk::Extent2D) -> Result<Option<SwapchainConfig>> {
        let support = self.device.surface_support(self.surface)?;
        let config = configure(&support, self.vsync, self.preferred_format, window_extent)?;
        if config.extent.width == 0 || config.extent.height == 0 {
            debug!("Skipping swapchain rebuild for zero-sized extent.");
            return Ok(None);
        }
        Ok(Some(config))
    }

    /// Destroy the current views and swapchain and build new ones from `config`.
    ///
    /// The device must be idle, and every framebuffer referencing the current image views must already be destroyed.
    /// If building fails the swapchain is left empty, see [`Swapchain::is_valid`].
    pub fn replace(&mut self, config: SwapchainConfig) -> Result<()> {
        self.teardown();
        self.config = config;
        self.build()?;
        self.generation += 1;
        Ok(())
    }

    /// Recreate the swapchain for the current surface state. Shorthand for [`Swapchain::prepare_rebuild`]
    /// followed by [`Swapchain::replace`], with the same requirements.
    ///
    /// Returns `false` without touching the current swapchain when the new extent would have zero area.
    pub fn rebuild(&mut self, window_extent: vk::Extent2D) -> Result<bool> {
        match self.prepare_rebuild(window_extent)? {
            Some(config) => {
                self.replace(config)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Whether the swapchain currently holds a live `VkSwapchainKHR`. This is only false after a rebuild failed.
    pub fn is_valid(&self) -> bool {
        self.handle != vk::SwapchainKHR::null()
    }

    /// Get unsafe access to the underlying vulkan handle.
    /// # Safety
    /// Any vulkan calls on the `VkSwapchainKHR` handle may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }

    pub fn image_count(&self) -> usize {
        self.images.len()
    }

    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }

    /// Swapchain image format.
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.config.format
    }

    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.config.present_mode
    }

    /// Size of the swapchain images. This is effectively the window render area.
    pub fn extent(&self) -> vk::Extent2D {
        self.config.extent
    }

    /// Incremented on every successful rebuild.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<D: DeviceProvider> Drop for Swapchain<D> {
    fn drop(&mut self) {
        self.teardown();
    }
}
