//! The core module holds all functionality that is minimally required to initialize a Vulkan context.

pub mod app_info;
pub mod instance;
pub mod device;
pub mod error;
pub mod physical_device;
pub mod debug;
pub mod traits;
pub mod init;
