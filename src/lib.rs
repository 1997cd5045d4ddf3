//! Thin Vulkan abstraction centred on the frame loop.
//!
//! Lantern takes care of everything between "I have a window" and "my draw commands end up on screen": creating the
//! Vulkan context, managing the swapchain, frames in flight and their synchronization, and rebuilding the swapchain
//! when the window is resized. On top of that it offers small owned wrappers for the resources a frame usually needs:
//! buffers backed by [`gpu_allocator`], SPIR-V shader modules, graphics pipelines and descriptor sets.
//!
//! # Example
//!
//! For illustrative purposes, we will use winit here. Any windowing library can be supported by implementing
//! [`WindowSize`](crate::WindowSize) together with the `raw-window-handle` traits.
//! ```ignore
//! use winit::window::WindowBuilder;
//! use winit::event_loop::EventLoopBuilder;
//! use lantern::prelude::*;
//!
//! let event_loop = EventLoopBuilder::new().build();
//! let window = WindowBuilder::new()
//!     .with_title("Lantern test app")
//!     .build(&event_loop)?;
//!
//! let settings = AppBuilder::new()
//!     .version((1, 0, 0))
//!     .name("Lantern demo app")
//!     .validation(true)
//!     .window(&window)
//!     .vsync(true)
//!     .frames_in_flight(2)
//!     .clear_color([0.1, 0.1, 0.1, 1.0])
//!     .build();
//!
//! let mut ctx = lantern::initialize(&settings)?;
//! let mut window_state = WindowState::from_window(&window);
//!
//! // Once per iteration of the main loop
//! ctx.frame.new_frame(&mut window_state, |cmd| {
//!     cmd.bind_graphics_pipeline(pipeline)
//!         .bind_vertex_buffer(0, vertex_buffer, 0)
//!         .draw(3, 1, 0, 0);
//!     Ok(())
//! })?;
//! ```
//! For further details, check out the following modules
//! - [`wsi`] for managing your main loop and frame rendering logic.
//! - [`command_buffer`] for the commands available while recording a frame.
//! - [`core`] for initialization of the Vulkan context.
//! - [`sync`] for fences and semaphores.
//! - [`allocator`] and [`resource`] for buffers.
//! - [`pipeline`] and [`descriptor`] for graphics pipelines and descriptor sets.

#[macro_use]
extern crate derivative;
#[macro_use]
extern crate log;

pub mod prelude;
pub use crate::prelude::*;

pub mod allocator;
pub mod command_buffer;
pub mod core;
pub mod descriptor;
pub mod pipeline;
pub mod resource;
pub mod sync;
pub mod util;
pub mod wsi;
