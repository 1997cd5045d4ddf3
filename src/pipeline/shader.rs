//! SPIR-V shader modules.

use std::ffi::CStr;
use std::io::{Cursor, ErrorKind};

use ash::vk;

use crate::core::error::{Error, Result, VkResultExt};
use crate::Device;

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Owned `VkShaderModule`. Shader modules are only needed while creating pipelines and can be dropped afterwards.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct ShaderModule {
    #[derivative(Debug = "ignore")]
    device: Device,
    handle: vk::ShaderModule,
    stage: vk::ShaderStageFlags,
}

/// SPIR-V code for a single shader stage. Use [`ShaderCreateInfo::from_spirv`] or
/// [`ShaderCreateInfo::from_spirv_bytes`] to construct this.
#[derive(Debug, Clone)]
pub struct ShaderCreateInfo {
    stage: vk::ShaderStageFlags,
    code: Vec<u32>,
}

impl ShaderCreateInfo {
    /// Wrap SPIR-V words for a shader stage. The entry point must be called `main`.
    pub fn from_spirv(stage: vk::ShaderStageFlags, code: Vec<u32>) -> Self {
        Self {
            stage,
            code,
        }
    }

    /// Parse a SPIR-V binary as read from disk. Byte-swapped binaries are accepted.
    /// # Errors
    /// Fails with [`Error::InvalidSpirv`] if the length is not a multiple of four or the magic number is wrong.
    pub fn from_spirv_bytes(stage: vk::ShaderStageFlags, bytes: &[u8]) -> Result<Self> {
        Ok(Self::from_spirv(stage, read_spirv(bytes)?))
    }

    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.stage
    }

    pub fn code(&self) -> &[u32] {
        self.code.as_slice()
    }
}

fn read_spirv(bytes: &[u8]) -> Result<Vec<u32>> {
    let words = ash::util::read_spv(&mut Cursor::new(bytes)).map_err(Error::InvalidSpirv)?;
    match words.first() {
        Some(&SPIRV_MAGIC) => Ok(words),
        _ => Err(Error::InvalidSpirv(std::io::Error::new(ErrorKind::InvalidData, "missing SPIR-V magic number"))),
    }
}

impl ShaderModule {
    /// Create a shader module from SPIR-V code.
    pub fn new(device: Device, info: &ShaderCreateInfo) -> Result<Self> {
        let create_info = vk::ShaderModuleCreateInfo::builder().code(info.code()).build();
        let handle = unsafe { device.create_shader_module(&create_info, None) }.op("vkCreateShaderModule")?;
        #[cfg(feature = "log-objects")]
        trace!("Created new VkShaderModule {handle:p}");
        Ok(Self {
            device,
            handle,
            stage: info.stage(),
        })
    }

    /// Stage info for pipeline creation, with `main` as entry point.
    pub(crate) fn stage_info(&self) -> vk::PipelineShaderStageCreateInfo {
        // SAFETY: The literal is nul-terminated and has no interior nul bytes.
        let entry = unsafe { CStr::from_bytes_with_nul_unchecked(b"main\0") };
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(self.stage)
            .module(self.handle)
            .name(entry)
            .build()
    }

    pub fn stage(&self) -> vk::ShaderStageFlags {
        self.stage
    }

    /// Get unsafe access to the underlying `VkShaderModule` object.
    /// # Safety
    /// Any vulkan calls that mutate the shader module may put the system in an undefined state.
    pub unsafe fn handle(&self) -> vk::ShaderModule {
        self.handle
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        #[cfg(feature = "log-objects")]
        trace!("Destroying VkShaderModule {:p}", self.handle);
        unsafe {
            self.device.destroy_shader_module(self.handle, None);
        }
    }
}
