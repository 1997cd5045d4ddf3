//! Builds and writes descriptor sets.

use ash::vk;

use crate::core::error::Result;
use crate::descriptor::descriptor_pool::DescriptorPool;
use crate::{Buffer, DescriptorSetLayout, Device};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
struct BufferBinding {
    binding: u32,
    ty: vk::DescriptorType,
    buffer: vk::Buffer,
    offset: vk::DeviceSize,
    range: vk::DeviceSize,
}

/// Collects the resources bound to a descriptor set, then allocates and writes the set in one go.
#[derive(Debug, Default)]
pub struct DescriptorSetBuilder {
    bindings: Vec<BufferBinding>,
}

impl DescriptorSetBuilder {
    /// Create a new empty descriptor set builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an entire buffer to the given binding as a [`vk::DescriptorType::UNIFORM_BUFFER`]
    pub fn bind_uniform_buffer(self, binding: u32, buffer: &Buffer) -> Self {
        self.bind_buffer(binding, vk::DescriptorType::UNIFORM_BUFFER, buffer)
    }

    /// Bind an entire buffer to the given binding as a [`vk::DescriptorType::STORAGE_BUFFER`]
    pub fn bind_storage_buffer(self, binding: u32, buffer: &Buffer) -> Self {
        self.bind_buffer(binding, vk::DescriptorType::STORAGE_BUFFER, buffer)
    }

    fn bind_buffer(self, binding: u32, ty: vk::DescriptorType, buffer: &Buffer) -> Self {
        // SAFETY: The caller keeps the buffer alive for as long as the descriptor set is used.
        self.bind_raw(binding, ty, unsafe { buffer.handle() }, 0, buffer.size())
    }

    fn bind_raw(mut self, binding: u32, ty: vk::DescriptorType, buffer: vk::Buffer, offset: vk::DeviceSize, range: vk::DeviceSize) -> Self {
        // Rebinding a slot replaces the earlier binding.
        self.bindings.retain(|b| b.binding != binding);
        self.bindings.push(BufferBinding {
            binding,
            ty,
            buffer,
            offset,
            range,
        });
        self
    }

    /// Allocate a set with the given layout from `pool` and write all bindings into it.
    pub fn build(self, pool: &mut DescriptorPool, layout: &DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let set = pool.allocate(layout)?;
        self.write(pool.device(), set);
        Ok(set)
    }

    /// Overwrite the bindings of an existing set. The set must not be in use by a pending command buffer.
    pub fn write(&self, device: &Device, set: vk::DescriptorSet) {
        let infos = self
            .bindings
            .iter()
            .map(|b| vk::DescriptorBufferInfo {
                buffer: b.buffer,
                offset: b.offset,
                range: b.range,
            })
            .collect::<Vec<_>>();
        let writes = self
            .bindings
            .iter()
            .zip(infos.iter())
            .map(|(b, info)| {
                vk::WriteDescriptorSet::builder()
                    .dst_set(set)
                    .dst_binding(b.binding)
                    .descriptor_type(b.ty)
                    .buffer_info(std::slice::from_ref(info))
                    .build()
            })
            .collect::<Vec<_>>();
        unsafe { device.update_descriptor_sets(&writes, &[]) };
    }
}
