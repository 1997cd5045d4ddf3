//! Exposes different memory types that determine where memory allocations should live.

/// The memory type of an allocation indicates where it should live.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MemoryType {
    /// GPU only accessible memory. Fastest to access from shaders, but cannot be written from the host.
    GpuOnly,
    /// Host visible memory for uploading data to the GPU, e.g. vertex data or uniform buffers that change every frame.
    CpuToGpu,
    /// Memory useful for CPU readback of data.
    GpuToCpu,
}

impl MemoryType {
    /// Whether allocations of this type can always be mapped.
    pub fn is_host_visible(&self) -> bool {
        !matches!(self, MemoryType::GpuOnly)
    }
}

impl From<MemoryType> for gpu_allocator::MemoryLocation {
    fn from(value: MemoryType) -> Self {
        match value {
            MemoryType::GpuOnly => gpu_allocator::MemoryLocation::GpuOnly,
            MemoryType::CpuToGpu => gpu_allocator::MemoryLocation::CpuToGpu,
            MemoryType::GpuToCpu => gpu_allocator::MemoryLocation::GpuToCpu,
        }
    }
}

#[cfg(test)]
mod tests {
    use gpu_allocator::MemoryLocation;

    use super::*;

    #[test]
    fn maps_to_allocator_location() {
        assert_eq!(MemoryLocation::from(MemoryType::GpuOnly), MemoryLocation::GpuOnly);
        assert_eq!(MemoryLocation::from(MemoryType::CpuToGpu), MemoryLocation::CpuToGpu);
        assert_eq!(MemoryLocation::from(MemoryType::GpuToCpu), MemoryLocation::GpuToCpu);
    }

    #[test]
    fn only_gpu_memory_is_hidden_from_host() {
        assert!(!MemoryType::GpuOnly.is_host_visible());
        assert!(MemoryType::CpuToGpu.is_host_visible());
        assert!(MemoryType::GpuToCpu.is_host_visible());
    }
}
