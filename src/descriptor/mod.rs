//! Descriptor set layouts, pools and sets for binding buffers to shaders.
//!
//! Descriptor sets are allocated from a [`DescriptorPool`] and written with a [`DescriptorSetBuilder`]. They are
//! freed together with their pool.
//!
//! # Example
//! ```ignore
//! use lantern::prelude::*;
//!
//! let layout = DescriptorSetLayout::new(device.clone(), &[vk::DescriptorSetLayoutBinding {
//!     binding: 0,
//!     descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
//!     descriptor_count: 1,
//!     stage_flags: vk::ShaderStageFlags::VERTEX,
//!     p_immutable_samplers: std::ptr::null(),
//! }])?;
//! let mut pool = DescriptorPool::for_layout(device.clone(), &layout, 2)?;
//! let set = DescriptorSetBuilder::new()
//!     .bind_uniform_buffer(0, &uniforms)
//!     .build(&mut pool, &layout)?;
//! ```

pub mod builder;
pub mod descriptor_pool;
pub mod set_layout;
