//! Memory allocation for buffers, based on the [`gpu_allocator`] crate.
//!
//! The [`Allocator`] is `Clone`, `Send` and `Sync`. All its internal state is wrapped inside an `Arc<Mutex<T>>` so it
//! can be passed around freely. Every [`Allocation`] keeps a handle to the allocator it came from and frees itself
//! when dropped.
//!
//! All allocations must be dropped before the [`Device`] and [`Instance`] they were created from.

use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::{Arc, Mutex};

use ash::vk;
use gpu_allocator::vulkan as vk_alloc;
use gpu_allocator::vulkan::AllocationScheme;

use crate::core::error::Result;
use crate::{Device, Instance, PhysicalDevice};

pub mod memory_type;

pub use memory_type::MemoryType;

/// General purpose memory allocator.
#[derive(Clone, Derivative)]
#[derivative(Debug)]
pub struct Allocator {
    #[derivative(Debug = "ignore")]
    alloc: Arc<Mutex<vk_alloc::Allocator>>,
}

/// Memory allocated through an [`Allocator`]. Freed when dropped.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Allocation {
    #[derivative(Debug = "ignore")]
    allocator: Allocator,
    // Always `Some` until the allocation is freed in `Drop`.
    allocation: Option<vk_alloc::Allocation>,
    memory: vk::DeviceMemory,
    offset: vk::DeviceSize,
    size: vk::DeviceSize,
    #[derivative(Debug = "ignore")]
    mapped: Option<NonNull<c_void>>,
}

// SAFETY: The only thing that is not `Send` is the mapped pointer, which points into device memory owned by this allocation.
unsafe impl Send for Allocation {}

impl Allocator {
    /// Create a new allocator.
    /// # Errors
    /// * Fails if creating the internal `gpu_allocator` allocator fails.
    pub fn new(instance: &Instance, device: &Device, physical_device: &PhysicalDevice) -> Result<Self> {
        let alloc = vk_alloc::Allocator::new(&vk_alloc::AllocatorCreateDesc {
            instance: (*instance).clone(),
            // SAFETY: The allocator is dropped before the device, see the module documentation.
            device: unsafe { device.handle() },
            // SAFETY: The user passed in a valid PhysicalDevice reference.
            physical_device: unsafe { physical_device.handle() },
            debug_settings: Default::default(),
            buffer_device_address: false,
        })?;
        Ok(Allocator {
            alloc: Arc::new(Mutex::new(alloc)),
        })
    }

    /// Allocate memory satisfying `requirements` at the given location. The name is used for debug logging.
    /// # Errors
    /// * Fails if the device is out of memory, or no memory type satisfies the requirements.
    pub fn allocate(&mut self, name: &str, requirements: &vk::MemoryRequirements, ty: MemoryType) -> Result<Allocation> {
        let mut alloc = self.alloc.lock()?;
        let allocation = alloc.allocate(&vk_alloc::AllocationCreateDesc {
            name,
            requirements: *requirements,
            location: gpu_allocator::MemoryLocation::from(ty),
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;
        #[cfg(feature = "log-objects")]
        trace!("Allocated {} bytes for {name} ({ty:?})", allocation.size());
        Ok(Allocation {
            allocator: self.clone(),
            // SAFETY: The memory handle is only used together with the offset and size of this allocation.
            memory: unsafe { allocation.memory() },
            offset: allocation.offset(),
            size: allocation.size(),
            mapped: allocation.mapped_ptr(),
            allocation: Some(allocation),
        })
    }

    fn free_impl(&self, allocation: &mut Allocation) -> Result<()> {
        if let Some(inner) = allocation.allocation.take() {
            let mut alloc = self.alloc.lock()?;
            alloc.free(inner)?;
        }
        Ok(())
    }
}

impl Allocation {
    /// Get unsafe access to the underlying `VkDeviceMemory`. Always use together with [`Allocation::offset`].
    /// # Safety
    /// The memory must not be freed, and only the range `offset..offset + size` may be accessed.
    pub unsafe fn memory(&self) -> vk::DeviceMemory {
        self.memory
    }

    /// Offset of this allocation inside its `VkDeviceMemory` block.
    pub fn offset(&self) -> vk::DeviceSize {
        self.offset
    }

    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }

    /// Host pointer to the start of this allocation, or `None` if the memory is not host visible.
    pub fn mapped_ptr(&self) -> Option<NonNull<c_void>> {
        self.mapped
    }
}

impl Drop for Allocation {
    fn drop(&mut self) {
        let allocator = self.allocator.clone();
        if let Err(err) = allocator.free_impl(self) {
            error!("Failed to free allocation: {err}");
        }
    }
}
