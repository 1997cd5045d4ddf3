//! Wrapper for `VkBuffer` objects.
//!
//! A [`Buffer`] owns its Vulkan handle and the memory bound to it. Buffers allocated from host visible memory
//! ([`MemoryType::CpuToGpu`] or [`MemoryType::GpuToCpu`]) stay mapped for their entire lifetime and can be written
//! directly with [`Buffer::write`].
//!
//! # Example
//!
//! ```ignore
//! use lantern::prelude::*;
//!
//! let vertices: [f32; 6] = [0.0, -0.5, 0.5, 0.5, -0.5, 0.5];
//! let buffer = Buffer::from_slice(device.clone(), &mut allocator, &vertices, vk::BufferUsageFlags::VERTEX_BUFFER)?;
//! ```

use std::mem::size_of_val;

use ash::vk;

use crate::allocator::{Allocation, Allocator, MemoryType};
use crate::core::error::{Error, Result, VkResultExt};
use crate::Device;

/// Wrapper around a [`VkBuffer`](vk::Buffer) and its memory.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct Buffer {
    #[derivative(Debug = "ignore")]
    device: Device,
    // Freed after `Drop` destroyed the handle.
    memory: Allocation,
    handle: vk::Buffer,
    size: vk::DeviceSize,
}

impl Buffer {
    /// Allocate a new buffer with a specific size, at a specific memory location.
    /// All usage flags must be given.
    pub fn new(
        device: Device,
        allocator: &mut Allocator,
        size: impl Into<vk::DeviceSize>,
        usage: vk::BufferUsageFlags,
        location: MemoryType,
    ) -> Result<Self> {
        let size = size.into();
        let info = vk::BufferCreateInfo::builder()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .build();
        let handle = unsafe { device.create_buffer(&info, None) }.op("vkCreateBuffer")?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkBuffer {handle:p} (size = {size} bytes)");

        let requirements = unsafe { device.get_buffer_memory_requirements(handle) };
        let bound = allocator
            .allocate("buffer", &requirements, location)
            .and_then(|memory| {
                unsafe { device.bind_buffer_memory(handle, memory.memory(), memory.offset()) }.op("vkBindBufferMemory")?;
                Ok(memory)
            });
        let memory = match bound {
            Ok(memory) => memory,
            Err(err) => {
                unsafe { device.destroy_buffer(handle, None) };
                return Err(err);
            }
        };

        Ok(Buffer {
            device,
            memory,
            handle,
            size,
        })
    }

    /// Create a host visible buffer holding a copy of `data`.
    pub fn from_slice<T: Copy>(device: Device, allocator: &mut Allocator, data: &[T], usage: vk::BufferUsageFlags) -> Result<Self> {
        let size = size_of_val(data) as vk::DeviceSize;
        let mut buffer = Buffer::new(device, allocator, size, usage, MemoryType::CpuToGpu)?;
        buffer.write(0, data)?;
        Ok(buffer)
    }

    /// Copy `data` into the buffer, starting `offset` bytes in.
    /// # Errors
    /// * [`Error::UnmappableBuffer`] if the buffer is not host visible.
    /// * [`Error::BufferOverflow`] if the data does not fit.
    pub fn write<T: Copy>(&mut self, offset: vk::DeviceSize, data: &[T]) -> Result<()> {
        let bytes = size_of_val(data) as vk::DeviceSize;
        check_fits(self.size, offset, bytes)?;
        let pointer = self.memory.mapped_ptr().ok_or(Error::UnmappableBuffer)?;
        // SAFETY: The range was checked to lie inside the buffer, and the mapped pointer points at its first byte.
        unsafe {
            std::ptr::copy_nonoverlapping(
                data.as_ptr().cast::<u8>(),
                pointer.as_ptr().cast::<u8>().add(offset as usize),
                bytes as usize,
            );
        }
        Ok(())
    }

    /// Whether the buffer memory is mapped and can be written through [`Buffer::write`].
    pub fn is_mapped(&self) -> bool {
        self.memory.mapped_ptr().is_some()
    }

    /// Get unsafe access to the underlying `VkBuffer` handle.
    /// # Safety
    /// The buffer must not be destroyed, and must outlive every command buffer it is recorded into.
    pub unsafe fn handle(&self) -> vk::Buffer {
        self.handle
    }

    /// Size of the buffer in bytes. The memory backing it may be larger.
    pub fn size(&self) -> vk::DeviceSize {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkBuffer {:p}", self.handle);
        unsafe {
            self.device.destroy_buffer(self.handle, None);
        }
    }
}

fn check_fits(size: vk::DeviceSize, offset: vk::DeviceSize, required: vk::DeviceSize) -> Result<()> {
    match offset.checked_add(required) {
        Some(end) if end <= size => Ok(()),
        _ => Err(Error::BufferOverflow {
            size,
            offset,
            required,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_must_fit() {
        assert!(check_fits(16, 0, 16).is_ok());
        assert!(check_fits(16, 8, 8).is_ok());
        assert!(check_fits(16, 16, 0).is_ok());
        assert!(matches!(
            check_fits(16, 8, 12),
            Err(Error::BufferOverflow {
                size: 16,
                offset: 8,
                required: 12
            })
        ));
        assert!(check_fits(16, u64::MAX, 2).is_err());
    }
}
