//! The wsi module provides utilities for interacting with the window and rendering frames.
//!
//! - [`surface`] wraps the `VkSurfaceKHR` created for a window.
//! - [`swapchain`] picks swapchain parameters and owns the swapchain images and views.
//! - [`render_target`] owns the render pass and one framebuffer per swapchain image.
//! - [`frame_pool`] holds the per-frame synchronization primitives and command buffers.
//! - [`frame`] drives the frame lifecycle and rebuilds the swapchain when needed.
//! - [`window`] abstracts over window libraries and tracks resize and minimize signals.

pub mod frame;
pub mod frame_pool;
pub mod render_target;
pub mod surface;
pub mod swapchain;
pub mod window;
