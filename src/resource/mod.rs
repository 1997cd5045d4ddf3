//! GPU resources owned by the application, as opposed to the swapchain resources managed by the frame loop.

pub mod buffer;
