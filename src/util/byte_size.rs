//! Sizes of the formats used for vertex attributes.

use std::mem::size_of;

use ash::vk;

use crate::core::error::{Error, Result};

/// Size in bytes of one element of a format.
pub trait ByteSize {
    /// # Errors
    /// Fails with [`Error::UnsupportedVertexFormat`] for compressed, depth or packed formats.
    fn byte_size(&self) -> Result<usize>;
}

impl ByteSize for vk::Format {
    fn byte_size(&self) -> Result<usize> {
        let size = match *self {
            vk::Format::R32_SFLOAT | vk::Format::R32_UINT | vk::Format::R32_SINT => size_of::<f32>(),
            vk::Format::R32G32_SFLOAT | vk::Format::R32G32_UINT | vk::Format::R32G32_SINT => 2 * size_of::<f32>(),
            vk::Format::R32G32B32_SFLOAT | vk::Format::R32G32B32_UINT | vk::Format::R32G32B32_SINT => 3 * size_of::<f32>(),
            vk::Format::R32G32B32A32_SFLOAT | vk::Format::R32G32B32A32_UINT | vk::Format::R32G32B32A32_SINT => {
                4 * size_of::<f32>()
            }
            vk::Format::R16G16_SFLOAT => 2 * size_of::<u16>(),
            vk::Format::R16G16B16A16_SFLOAT => 4 * size_of::<u16>(),
            vk::Format::R8_UNORM => 1,
            vk::Format::R8G8_UNORM => 2,
            vk::Format::R8G8B8_UNORM => 3,
            vk::Format::R8G8B8A8_UNORM | vk::Format::B8G8R8A8_UNORM | vk::Format::R8G8B8A8_SRGB => 4,
            format => return Err(Error::UnsupportedVertexFormat(format)),
        };
        Ok(size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_vectors() -> Result<()> {
        assert_eq!(vk::Format::R32_SFLOAT.byte_size()?, 4);
        assert_eq!(vk::Format::R32G32_SFLOAT.byte_size()?, 8);
        assert_eq!(vk::Format::R32G32B32_SFLOAT.byte_size()?, 12);
        assert_eq!(vk::Format::R32G32B32A32_SFLOAT.byte_size()?, 16);
        assert_eq!(vk::Format::R8G8B8A8_UNORM.byte_size()?, 4);
        Ok(())
    }

    #[test]
    fn unknown_format() {
        assert!(matches!(
            vk::Format::BC1_RGB_UNORM_BLOCK.byte_size(),
            Err(Error::UnsupportedVertexFormat(vk::Format::BC1_RGB_UNORM_BLOCK))
        ));
    }
}
