//! The sync module provides owning wrappers around Vulkan synchronization primitives.
//!
//! - The [`fence`] module provides a wrapper around `VkFence` objects, used for CPU-GPU sync.
//! - The [`semaphore`] module provides a simple wrapper around `VkSemaphore` objects, used for GPU-GPU sync.

pub mod fence;
pub mod semaphore;
