//! Contains all the logic responsible for managing presentation and frame synchronization.
//!
//! Every frame should be contained in a call to [`FrameManager::new_frame`], which takes in a closure that records
//! the frame's draw commands. The frame manager acquires a swapchain image, waits until the frame slot's resources
//! are no longer in use, records, submits and presents. When the swapchain no longer matches the window it is rebuilt,
//! together with the render targets.
//!
//! # Example usage
//!
//! Example code for a main loop using `winit`.
//! ```ignore
//! use winit::event_loop::ControlFlow;
//! use winit::event::{Event, WindowEvent};
//! use lantern::prelude::*;
//!
//! let mut window_state = WindowState::from_window(&window);
//! event_loop.run(move |event, _, control_flow| {
//!     *control_flow = ControlFlow::Poll;
//!     match event {
//!         Event::WindowEvent { event, .. } => {
//!             if let WindowEvent::CloseRequested = event {
//!                 *control_flow = ControlFlow::Exit;
//!             }
//!             window_state.handle_event(&event);
//!         }
//!         Event::MainEventsCleared => {
//!             let status = ctx.frame.new_frame(&mut window_state, |ctx| {
//!                 ctx.bind_graphics_pipeline(pipeline).draw(3, 1, 0, 0);
//!                 Ok(())
//!             })?;
//!         }
//!         _ => (),
//!     }
//! });
//! ```

use ash::vk;

use crate::command_buffer::DrawContext;
use crate::core::error::{Error, Result};
use crate::core::traits::{Acquired, DeviceProvider};
use crate::{Device, FramePool, PresentSettings, RenderTargets, Surface, Swapchain, WindowState};

/// Where the frame manager currently is in the frame lifecycle.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum FrameState {
    /// Between frames.
    #[default]
    Idle,
    /// Waiting for the frame slot and acquiring a swapchain image.
    Acquiring,
    /// The draw callback is recording commands.
    Recording,
    /// Submitting the frame's command buffer.
    Submitting,
    /// Presenting the swapchain image.
    Presenting,
    /// Rebuilding the swapchain and render targets.
    Resizing,
}

/// Result of a call to [`FrameManager::new_frame`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame was presented.
    Presented,
    /// The frame was presented, after which the swapchain was rebuilt.
    PresentedResized,
    /// The swapchain was out of date and has been rebuilt. No frame was rendered.
    Resized,
    /// The swapchain was out of date, but the surface has zero area so the rebuild was postponed.
    /// No frame was rendered.
    Skipped,
    /// The window is minimized. Nothing was done.
    Minimized,
}

#[derive(Debug, Default, Copy, Clone)]
struct FrameCursor {
    slot: usize,
    image: u32,
}

/// Responsible for presentation, frame-frame synchronization and per-frame resources.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FrameManager<D: DeviceProvider = Device> {
    // Field order is drop order. Render targets reference swapchain views, the swapchain references the surface.
    render_targets: RenderTargets<D>,
    swapchain: Swapchain<D>,
    pool: FramePool<D>,
    surface: Surface,
    #[derivative(Debug = "ignore")]
    device: D,
    cursor: FrameCursor,
    /// For every swapchain image, the slot whose fence guards the last submission that rendered to it.
    images_in_flight: Vec<Option<usize>>,
    state: FrameState,
    fence_timeout: Option<std::time::Duration>,
}

impl<D: DeviceProvider> FrameManager<D> {
    /// Create the swapchain, render targets and frame slots for a surface.
    /// The frame manager takes ownership of the surface and destroys it after the swapchain.
    pub fn new(device: D, surface: Surface, settings: &PresentSettings, window_extent: vk::Extent2D) -> Result<Self> {
        let pool = FramePool::new(device.clone(), settings.frames_in_flight)?;
        let swapchain = Swapchain::new(device.clone(), &surface, settings.vsync, settings.surface_format, window_extent)?;
        let render_targets = RenderTargets::new(device.clone(), &swapchain, settings.clear_color)?;
        let images_in_flight = vec![None; swapchain.image_count()];
        Ok(FrameManager {
            render_targets,
            swapchain,
            pool,
            surface,
            device,
            cursor: FrameCursor::default(),
            images_in_flight,
            state: FrameState::Idle,
            fence_timeout: settings.fence_timeout,
        })
    }

    /// Run a single frame.
    ///
    /// The closure records the frame's draw commands. It is called inside the render pass, with viewport and
    /// scissor set to the full swapchain extent. The closure is not called if the window is minimized or the
    /// swapchain turned out to be out of date.
    ///
    /// Transient presentation problems are reported through the returned [`FrameStatus`], never as an error.
    /// # Errors
    /// Any error returned is fatal, including errors from the closure (wrapped in [`Error::Callback`]).
    pub fn new_frame<F>(&mut self, window: &mut WindowState, f: F) -> Result<FrameStatus>
    where
        F: FnOnce(&mut DrawContext<D>) -> anyhow::Result<()>, {
        if window.is_minimized() {
            return Ok(FrameStatus::Minimized);
        }
        let result = self.run_frame(window, f);
        if result.is_err() {
            self.state = FrameState::Idle;
        }
        result
    }

    fn run_frame<F>(&mut self, window: &mut WindowState, f: F) -> Result<FrameStatus>
    where
        F: FnOnce(&mut DrawContext<D>) -> anyhow::Result<()>, {
        let slot_index = self.cursor.slot;

        self.transition(FrameState::Acquiring);
        self.pool.slot(slot_index).in_flight.wait(self.fence_timeout)?;

        let (image_index, acquire_suboptimal) = {
            let slot = self.pool.slot(slot_index);
            let acquired = self
                .device
                .acquire_next_image(unsafe { self.swapchain.handle() }, unsafe { slot.image_ready.handle() })?;
            match acquired {
                Acquired::Image {
                    index,
                    suboptimal,
                } => (index, suboptimal),
                Acquired::OutOfDate => {
                    debug!("Swapchain out of date on acquire, rebuilding.");
                    // The slot's fence was not reset and no semaphore was signaled, so the slot can be skipped safely.
                    let status = if self.rebuild(window.extent())? {
                        window.take_resize();
                        FrameStatus::Resized
                    } else {
                        FrameStatus::Skipped
                    };
                    self.advance();
                    return Ok(status);
                }
            }
        };
        self.cursor.image = image_index;

        let image = image_index as usize;
        if image >= self.images_in_flight.len() {
            return Err(Error::ImageIndexOutOfRange {
                index: image_index,
                count: self.images_in_flight.len(),
            });
        }
        // Another slot may still be rendering to this image.
        if let Some(owner) = self.images_in_flight[image] {
            if owner != slot_index {
                self.pool.slot(owner).in_flight.wait(self.fence_timeout)?;
            }
        }
        self.images_in_flight[image] = Some(slot_index);

        self.transition(FrameState::Recording);
        if !self.render_targets.is_current_for(&self.swapchain) {
            return Err(Error::StaleRenderTargets);
        }
        self.pool.record_into(slot_index, &self.render_targets, image_index, f)?;

        self.transition(FrameState::Submitting);
        let (command_buffer, image_ready, render_complete, in_flight) = {
            let slot = self.pool.slot(slot_index);
            // Only reset once the submission is certain to happen, otherwise the next wait on this fence deadlocks.
            slot.in_flight.reset()?;
            unsafe {
                (
                    slot.command_buffer,
                    slot.image_ready.handle(),
                    slot.render_complete.handle(),
                    slot.in_flight.handle(),
                )
            }
        };
        self.device.queue_submit(
            command_buffer,
            image_ready,
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
            render_complete,
            in_flight,
        )?;

        self.transition(FrameState::Presenting);
        let presented = self
            .device
            .queue_present(unsafe { self.swapchain.handle() }, image_index, render_complete)?;

        let resize_requested = window.resize_requested();
        let status = if presented.needs_rebuild() || acquire_suboptimal || resize_requested {
            debug!(
                "Rebuilding swapchain after present (present: {:?}, suboptimal acquire: {}, resize requested: {}).",
                presented, acquire_suboptimal, resize_requested
            );
            if self.rebuild(window.extent())? {
                window.take_resize();
                FrameStatus::PresentedResized
            } else {
                FrameStatus::Presented
            }
        } else {
            FrameStatus::Presented
        };

        self.advance();
        Ok(status)
    }

    /// Wait for the device to go idle, then rebuild the swapchain and render targets.
    /// Returns false if the rebuild was postponed because the window has zero area.
    fn rebuild(&mut self, window_extent: vk::Extent2D) -> Result<bool> {
        self.transition(FrameState::Resizing);
        self.device.wait_idle()?;
        let Some(config) = self.swapchain.prepare_rebuild(window_extent)? else {
            return Ok(false);
        };
        // Framebuffers go first, they reference the image views the swapchain is about to destroy.
        self.render_targets.teardown();
        self.swapchain.replace(config)?;
        self.render_targets.rebuild(&self.swapchain)?;
        // The device is idle, so no image is guarded by any slot anymore.
        self.images_in_flight = vec![None; self.swapchain.image_count()];
        info!(
            "Rebuilt swapchain with {} images at {}x{}.",
            self.swapchain.image_count(),
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );
        Ok(true)
    }

    fn advance(&mut self) {
        self.cursor.slot = (self.cursor.slot + 1) % self.pool.slot_count();
        self.transition(FrameState::Idle);
    }

    fn transition(&mut self, state: FrameState) {
        trace!("Frame state {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    /// Current lifecycle state. Always [`FrameState::Idle`] between calls to [`FrameManager::new_frame`].
    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Index of the frame slot the next frame will use.
    pub fn current_frame_index(&self) -> usize {
        self.cursor.slot
    }

    /// Index of the most recently acquired swapchain image.
    pub fn image_index(&self) -> u32 {
        self.cursor.image
    }

    /// Amount of frame slots.
    pub fn frames_in_flight(&self) -> usize {
        self.pool.slot_count()
    }

    /// Size of the swapchain images.
    pub fn swap_extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }

    pub fn swapchain(&self) -> &Swapchain<D> {
        &self.swapchain
    }

    pub fn render_targets(&self) -> &RenderTargets<D> {
        &self.render_targets
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }
}

impl<D: DeviceProvider> Drop for FrameManager<D> {
    fn drop(&mut self) {
        if let Err(err) = self.device.wait_idle() {
            error!("Failed to wait for device idle before destroying frame manager: {err}");
        }
    }
}
