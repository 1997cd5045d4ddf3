//! Exposes all structs needed to store initialization parameters.

use std::time::Duration;

use ash::vk;

use crate::Window;

/// Minimum requirements for the GPU. This will be used to determine what physical device is selected.
/// # Example
/// ```
/// # use lantern::*;
/// let requirements = GPURequirements {
///     dedicated: true,
///     min_video_memory: 1024 * 1024 * 1024,
///     ..Default::default()
/// };
/// ```
#[derive(Default, Debug, Clone)]
pub struct GPURequirements {
    /// Whether a dedicated GPU is required. Setting this to true will discard integrated GPUs.
    pub dedicated: bool,
    /// Minimum amount of video memory required, in bytes. Note that this might count shared memory if RAM is shared.
    pub min_video_memory: usize,
    /// Optional Vulkan 1.0 features that are required from the physical device.
    pub features: vk::PhysicalDeviceFeatures,
    /// Vulkan device extensions that should be present and enabled, on top of `VK_KHR_swapchain`.
    pub device_extensions: Vec<String>,
}

/// Settings for presentation and the frame loop.
#[derive(Debug, Clone)]
pub struct PresentSettings {
    /// Wait for vertical blank before presenting. This selects `FIFO` presentation, otherwise `IMMEDIATE` is used
    /// when the surface supports it.
    pub vsync: bool,
    /// Amount of frames the CPU may record ahead of the GPU. Must be at least one.
    pub frames_in_flight: usize,
    /// Optionally a preferred surface format. If it is not supported or set to None, a format is picked from
    /// a list of common 8-bit formats, or the first one the surface reports.
    pub surface_format: Option<vk::SurfaceFormatKHR>,
    /// Color the swapchain image is cleared to at the start of every frame.
    pub clear_color: [f32; 4],
    /// Maximum time to wait for a frame slot to become available. `None` waits forever.
    pub fence_timeout: Option<Duration>,
}

impl Default for PresentSettings {
    fn default() -> Self {
        PresentSettings {
            vsync: true,
            frames_in_flight: 2,
            surface_format: None,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            fence_timeout: None,
        }
    }
}

/// Application settings used to initialize the lantern context.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct AppSettings<'a> {
    /// Application name. Possibly displayed in debugging tools, task manager, etc.
    pub name: String,
    /// Application version.
    pub version: (u32, u32, u32),
    /// Enable Vulkan validation layers for additional debug output. For developing this should almost always be on.
    pub enable_validation: bool,
    /// Minimum requirements the selected physical device should have.
    pub gpu_requirements: GPURequirements,
    /// Presentation settings.
    pub present: PresentSettings,
    /// The window that we will render to. Do note that this doesn't necessarily need to be a winit window.
    #[derivative(Debug = "ignore")]
    pub window: Option<&'a dyn Window>,
}

/// The app builder is a convenience struct to easily create [`AppSettings`](crate::AppSettings).
///
/// For information about each of the fields, see [`AppSettings`](crate::AppSettings)
/// # Example
/// ```
/// # use lantern::*;
/// let info = AppBuilder::new()
///     .name("My lantern application")
///     .vsync(false)
///     .frames_in_flight(3)
///     .validation(true)
///     .build();
/// assert_eq!(info.present.frames_in_flight, 3);
/// ```
pub struct AppBuilder<'a> {
    inner: AppSettings<'a>,
}

impl<'a> Default for AppBuilder<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> AppBuilder<'a> {
    /// Create a new app builder with default settings.
    pub fn new() -> Self {
        AppBuilder {
            inner: AppSettings {
                name: String::from(""),
                version: (0, 0, 0),
                enable_validation: false,
                gpu_requirements: GPURequirements::default(),
                present: PresentSettings::default(),
                window: None,
            },
        }
    }

    /// Sets the application name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.inner.name = name.into();
        self
    }

    /// Sets the application version.
    pub fn version(mut self, ver: impl Into<(u32, u32, u32)>) -> Self {
        self.inner.version = ver.into();
        self
    }

    /// Enable the Vulkan validation layers.
    pub fn validation(mut self, val: bool) -> Self {
        self.inner.enable_validation = val;
        self
    }

    /// The gpu requirements that the physical device must satisfy.
    pub fn gpu(mut self, gpu: GPURequirements) -> Self {
        self.inner.gpu_requirements = gpu;
        self
    }

    /// The window to present to.
    pub fn window(mut self, window: &'a dyn Window) -> Self {
        self.inner.window = Some(window);
        self
    }

    /// Replace all presentation settings at once.
    pub fn present(mut self, present: PresentSettings) -> Self {
        self.inner.present = present;
        self
    }

    /// Enable or disable vsync.
    pub fn vsync(mut self, vsync: bool) -> Self {
        self.inner.present.vsync = vsync;
        self
    }

    /// Set the amount of frames in flight.
    pub fn frames_in_flight(mut self, count: usize) -> Self {
        self.inner.present.frames_in_flight = count;
        self
    }

    /// Set a preferred surface format.
    pub fn surface_format(mut self, format: vk::SurfaceFormatKHR) -> Self {
        self.inner.present.surface_format = Some(format);
        self
    }

    /// Set the color swapchain images are cleared to.
    pub fn clear_color(mut self, color: [f32; 4]) -> Self {
        self.inner.present.clear_color = color;
        self
    }

    /// Set a maximum wait time for frame slots.
    pub fn fence_timeout(mut self, timeout: Duration) -> Self {
        self.inner.present.fence_timeout = Some(timeout);
        self
    }

    /// Build the resulting application settings.
    pub fn build(self) -> AppSettings<'a> {
        self.inner
    }
}
