use std::ffi::CStr;

use anyhow::Result;
use ash::vk;

use crate::util::string::wrap_c_str;
use crate::{AppSettings, Error, Instance, Surface};

/// A physical device abstracts away an actual device, like a graphics card or integrated graphics card.
#[derive(Default, Debug)]
pub struct PhysicalDevice {
    /// Handle to the [`VkPhysicalDevice`](vk::PhysicalDevice).
    handle: vk::PhysicalDevice,
    /// [`VkPhysicalDeviceProperties`](vk::PhysicalDeviceProperties) structure with properties of this physical device.
    properties: vk::PhysicalDeviceProperties,
    /// [`VkPhysicalDeviceMemoryProperties`](vk::PhysicalDeviceMemoryProperties) structure with memory properties of the physical device.
    memory_properties: vk::PhysicalDeviceMemoryProperties,
    /// Names of the available device extensions.
    extensions: Vec<String>,
    /// List of [`VkQueueFamilyProperties`](vk::QueueFamilyProperties) with properties of each queue family on the device.
    queue_families: Vec<vk::QueueFamilyProperties>,
    /// Family of the main queue. This queue supports graphics and can present to the surface.
    queue_family: u32,
}

impl PhysicalDevice {
    /// Selects the first physical device that satisfies the requirements and has a queue that supports both
    /// graphics and presentation to the given surface.
    pub fn select(instance: &Instance, surface: &Surface, settings: &AppSettings) -> Result<Self> {
        let devices = unsafe { instance.enumerate_physical_devices()? };
        if devices.is_empty() {
            return Err(anyhow::Error::from(Error::NoGPU));
        }

        let surface_fns = ash::extensions::khr::Surface::new(unsafe { instance.loader() }, instance);
        let surface_handle = unsafe { surface.handle() };
        let mut missing_present_queue = false;

        for device in devices {
            let mut physical_device = PhysicalDevice {
                handle: device,
                properties: unsafe { instance.get_physical_device_properties(device) },
                memory_properties: unsafe { instance.get_physical_device_memory_properties(device) },
                extensions: unsafe { instance.enumerate_device_extension_properties(device)? }
                    .iter()
                    .map(|ext| unsafe { wrap_c_str(ext.extension_name.as_ptr()) })
                    .collect(),
                queue_families: unsafe { instance.get_physical_device_queue_family_properties(device) },
                queue_family: 0,
            };

            if settings.gpu_requirements.dedicated && physical_device.properties.device_type != vk::PhysicalDeviceType::DISCRETE_GPU {
                continue;
            }
            if settings.gpu_requirements.min_video_memory > total_video_memory(&physical_device) {
                continue;
            }

            let swapchain_name = extension_name(ash::extensions::khr::Swapchain::name());
            let all_extensions = settings
                .gpu_requirements
                .device_extensions
                .iter()
                .chain(std::iter::once(&swapchain_name))
                .all(|requested| physical_device.extensions.contains(requested));
            if !all_extensions {
                continue;
            }

            // The main queue must be able to render and present to the surface.
            let mut present_family = None;
            for (index, family) in physical_device.queue_families.iter().enumerate() {
                if !family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
                    continue;
                }
                let supported = unsafe { surface_fns.get_physical_device_surface_support(device, index as u32, surface_handle)? };
                if supported {
                    present_family = Some(index as u32);
                    break;
                }
            }
            let Some(queue_family) = present_family else {
                missing_present_queue = true;
                continue;
            };
            physical_device.queue_family = queue_family;

            let name = unsafe { CStr::from_ptr(physical_device.properties.device_name.as_ptr()) };
            info!(
                "Picked physical device {:?}, driver version {:?}.",
                name, physical_device.properties.driver_version
            );
            info!(
                "Device has {} bytes of available video memory. Using queue family {} for graphics and presentation.",
                total_video_memory(&physical_device),
                queue_family
            );
            return Ok(physical_device);
        }

        if missing_present_queue {
            Err(anyhow::Error::from(Error::NoPresentQueue))
        } else {
            Err(anyhow::Error::from(Error::NoGPU))
        }
    }

    /// Get all queue families available on this device
    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        self.queue_families.as_slice()
    }

    /// Get the family index of the main queue, which supports graphics and presentation.
    pub fn queue_family(&self) -> u32 {
        self.queue_family
    }

    /// Get unsafe access to the physical device handle
    /// # Safety
    /// Any vulkan calls that mutate the physical device may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }
}

fn extension_name(name: &CStr) -> String {
    name.to_string_lossy().into_owned()
}

fn total_video_memory(device: &PhysicalDevice) -> usize {
    device
        .memory_properties
        .memory_heaps
        .iter()
        .take(device.memory_properties.memory_heap_count as usize)
        .map(|heap| heap.size as usize)
        .sum()
}
