//! Exposes methods to make initialization of the library easier without losing flexibility.

use anyhow::Result;

use crate::{AppSettings, DebugMessenger, Device, Error, FrameManager, Instance, PhysicalDevice, Surface};

/// All objects needed to render to a window.
///
/// Fields are declared in reverse creation order, so dropping this destroys everything in a valid order.
#[derive(Debug)]
pub struct Context {
    /// The frame manager, which owns the surface and swapchain.
    pub frame: FrameManager,
    pub device: Device,
    pub physical_device: PhysicalDevice,
    /// Only present if validation layers were enabled.
    pub debug_messenger: Option<DebugMessenger>,
    pub instance: Instance,
}

/// Initialize the Vulkan context and the frame manager for the window given in the settings.
/// # Errors
/// * Fails with [`Error::NoWindow`] if no window was set.
/// * Fails if no physical device satisfies the requirements, or has a queue that can present to the window.
pub fn initialize(settings: &AppSettings) -> Result<Context> {
    let window = settings.window.ok_or(Error::NoWindow)?;
    let instance = Instance::new(settings)?;
    let debug_messenger = if settings.enable_validation {
        Some(DebugMessenger::new(&instance)?)
    } else {
        None
    };
    let surface = Surface::new(&instance, window)?;
    let physical_device = PhysicalDevice::select(&instance, &surface, settings)?;
    let device = Device::new(&instance, &physical_device, settings)?;
    let extent = ash::vk::Extent2D {
        width: window.width(),
        height: window.height(),
    };
    let frame = FrameManager::new(device.clone(), surface, &settings.present, extent)?;
    Ok(Context {
        frame,
        device,
        physical_device,
        debug_messenger,
        instance,
    })
}
