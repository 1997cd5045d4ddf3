//! Memory pool for descriptor sets.

use std::collections::BTreeMap;

use ash::vk;

use crate::core::error::{Result, VkResultExt};
use crate::{DescriptorSetLayout, Device};

/// An owned `VkDescriptorPool`. Destroying the pool frees every set allocated from it.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct DescriptorPool {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::DescriptorPool,
    max_sets: u32,
    allocated: u32,
}

/// Total amount of descriptors of each type needed for `sets` copies of a set with the given descriptors.
pub fn pool_sizes(descriptors: &[(vk::DescriptorType, u32)], sets: u32) -> Vec<vk::DescriptorPoolSize> {
    let mut totals = BTreeMap::new();
    for (ty, count) in descriptors {
        *totals.entry(ty.as_raw()).or_insert(0) += count * sets;
    }
    totals
        .into_iter()
        .map(|(ty, descriptor_count)| vk::DescriptorPoolSize {
            ty: vk::DescriptorType::from_raw(ty),
            descriptor_count,
        })
        .collect()
}

impl DescriptorPool {
    /// Create a pool holding at most `max_sets` sets.
    pub fn new(device: Device, sizes: &[vk::DescriptorPoolSize], max_sets: u32) -> Result<Self> {
        let info = vk::DescriptorPoolCreateInfo::builder()
            .pool_sizes(sizes)
            .max_sets(max_sets)
            .build();
        let handle = unsafe { device.create_descriptor_pool(&info, None) }.op("vkCreateDescriptorPool")?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkDescriptorPool {handle:p}");
        Ok(Self {
            device,
            handle,
            max_sets,
            allocated: 0,
        })
    }

    /// Create a pool that fits exactly `sets` sets of one layout, e.g. one per frame in flight.
    pub fn for_layout(device: Device, layout: &DescriptorSetLayout, sets: u32) -> Result<Self> {
        Self::new(device, &pool_sizes(layout.descriptors(), sets), sets)
    }

    /// Allocate a single descriptor set. Its contents are undefined until written.
    /// # Errors
    /// Fails with `VK_ERROR_OUT_OF_POOL_MEMORY` once the pool is exhausted.
    pub fn allocate(&mut self, layout: &DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let layouts = [unsafe { layout.handle() }];
        let info = vk::DescriptorSetAllocateInfo::builder()
            .descriptor_pool(self.handle)
            .set_layouts(&layouts)
            .build();
        let sets = unsafe { self.device.allocate_descriptor_sets(&info) }.op("vkAllocateDescriptorSets")?;
        self.allocated += 1;
        debug!("Allocated descriptor set {} of {}.", self.allocated, self.max_sets);
        Ok(sets[0])
    }

    pub(crate) fn device(&self) -> &Device {
        &self.device
    }

    /// Amount of sets allocated so far.
    pub fn allocated(&self) -> u32 {
        self.allocated
    }

    /// Get unsafe access to the underlying `VkDescriptorPool`.
    /// # Safety
    /// Any vulkan calls that mutate the pool may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::DescriptorPool {
        self.handle
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkDescriptorPool {:p}", self.handle);
        unsafe {
            self.device.destroy_descriptor_pool(self.handle, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sizes_are_summed_per_type() {
        let descriptors = [
            (vk::DescriptorType::UNIFORM_BUFFER, 1),
            (vk::DescriptorType::STORAGE_BUFFER, 2),
            (vk::DescriptorType::UNIFORM_BUFFER, 3),
        ];
        let sizes = pool_sizes(&descriptors, 2)
            .into_iter()
            .map(|size| (size.ty, size.descriptor_count))
            .collect::<Vec<_>>();
        assert_eq!(
            sizes,
            vec![(vk::DescriptorType::UNIFORM_BUFFER, 8), (vk::DescriptorType::STORAGE_BUFFER, 4)]
        );
    }

    #[test]
    fn empty_layout_needs_no_descriptors() {
        assert!(pool_sizes(&[], 3).is_empty());
    }
}
