//! Wrappers around a `VkSurfaceKHR`

use ash::vk;

use crate::core::error::{Error, Result, VkResultExt};
use crate::{Instance, Window};

/// Owning wrapper around a [`VkSurfaceKHR`](vk::SurfaceKHR).
///
/// The surface must outlive every swapchain created from it. The [`FrameManager`](crate::FrameManager) takes
/// ownership of the surface and destroys it last.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Surface {
    /// Handle to the [`VkSurfaceKHR`](vk::SurfaceKHR)
    handle: vk::SurfaceKHR,
    /// Vulkan extension functions for surface handling. Not set for externally owned surfaces.
    #[derivative(Debug = "ignore")]
    functions: Option<ash::extensions::khr::Surface>,
}

impl Surface {
    /// Create a new surface for a window.
    pub fn new(instance: &Instance, window: &dyn Window) -> Result<Self> {
        let functions = ash::extensions::khr::Surface::new(unsafe { instance.loader() }, instance);
        let handle = unsafe {
            ash_window::create_surface(
                instance.loader(),
                instance,
                window.raw_display_handle(),
                window.raw_window_handle(),
                None,
            )
            .op("vkCreateSurfaceKHR")?
        };
        #[cfg(feature = "log-objects")]
        trace!("Created new VkSurfaceKHR {handle:p}");
        Ok(Surface {
            handle,
            functions: Some(functions),
        })
    }

    /// Wrap a surface that is created and destroyed by someone else.
    /// # Errors
    /// Fails with [`Error::NullSurface`] if the handle is null.
    pub fn from_raw(handle: vk::SurfaceKHR) -> Result<Self> {
        if handle == vk::SurfaceKHR::null() {
            return Err(Error::NullSurface);
        }
        Ok(Surface {
            handle,
            functions: None,
        })
    }

    /// Whether this surface is destroyed when dropped.
    pub fn is_owned(&self) -> bool {
        self.functions.is_some()
    }

    /// Get unsafe access to the underlying `VkSurfaceKHR` object.
    /// # Safety
    /// Any vulkan calls that mutate the surface may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::SurfaceKHR {
        self.handle
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        if let Some(functions) = &self.functions {
            #[cfg(feature = "log-objects")]
            trace!("Destroying VkSurfaceKHR {:p}", self.handle);
            unsafe {
                functions.destroy_surface(self.handle, None);
            }
        }
    }
}
