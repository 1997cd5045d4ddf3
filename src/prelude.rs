//! Re-exports all commonly used types. Import with `use lantern::prelude::*;`

pub use ash::vk;

pub use crate::allocator::{Allocation, Allocator, MemoryType};

pub use crate::command_buffer::traits::*;
pub use crate::command_buffer::DrawContext;

pub use crate::core::app_info::*;
pub use crate::core::debug::DebugMessenger;
pub use crate::core::device::Device;
pub use crate::core::error::{Error, VkResultExt};
pub use crate::core::init::{initialize, Context};
pub use crate::core::instance::Instance;
pub use crate::core::physical_device::PhysicalDevice;
pub use crate::core::traits::*;

pub use crate::descriptor::builder::DescriptorSetBuilder;
pub use crate::descriptor::descriptor_pool::DescriptorPool;
pub use crate::descriptor::set_layout::DescriptorSetLayout;

pub use crate::pipeline::builder::PipelineBuilder;
pub use crate::pipeline::pipeline_layout::{PipelineLayout, PushConstantRange};
pub use crate::pipeline::shader::{ShaderCreateInfo, ShaderModule};
pub use crate::pipeline::Pipeline;

pub use crate::resource::buffer::Buffer;

pub use crate::sync::fence::Fence;
pub use crate::sync::semaphore::Semaphore;

pub use crate::wsi::frame::{FrameManager, FrameState, FrameStatus};
pub use crate::wsi::frame_pool::{FramePool, FrameSlot};
pub use crate::wsi::render_target::RenderTargets;
pub use crate::wsi::surface::Surface;
pub use crate::wsi::swapchain::{configure, Swapchain};
pub use crate::wsi::window::{Window, WindowSize, WindowState};

pub use crate::util::byte_size::ByteSize;
