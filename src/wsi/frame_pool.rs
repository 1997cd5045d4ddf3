//! Per-frame resources for frames in flight.
//!
//! Every slot owns the synchronization primitives and the command buffer used by one frame. Slots are created once
//! and reused in round-robin order, they are never rebuilt when the swapchain changes.

use ash::vk;

use crate::command_buffer::command_pool::CommandPool;
use crate::command_buffer::DrawContext;
use crate::core::error::{Error, Result};
use crate::core::traits::DeviceProvider;
use crate::{Device, Fence, RenderTargets, Semaphore};

/// Information stored for each in-flight frame.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FrameSlot<D: DeviceProvider = Device> {
    /// Signaled by the GPU when a swapchain image is ready.
    pub(crate) image_ready: Semaphore<D>,
    /// Signaled by the GPU when all commands for a frame have been processed.
    /// We wait on this before presenting.
    pub(crate) render_complete: Semaphore<D>,
    /// Signaled when the frame's submission completes. Created signaled so the first wait returns immediately.
    pub(crate) in_flight: Fence<D>,
    pub(crate) command_buffer: vk::CommandBuffer,
}

impl<D: DeviceProvider> FrameSlot<D> {
    pub fn fence(&self) -> &Fence<D> {
        &self.in_flight
    }
}

/// A ring of frame slots and the command pool their command buffers are allocated from.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct FramePool<D: DeviceProvider = Device> {
    // Slots must be dropped before the pool
    slots: Vec<FrameSlot<D>>,
    pool: CommandPool<D>,
    #[derivative(Debug = "ignore")]
    device: D,
}

impl<D: DeviceProvider> FramePool<D> {
    /// Create `slot_count` frame slots. If any object fails to be created, everything created so far is destroyed.
    /// # Errors
    /// Fails with [`Error::InvalidSlotCount`] if `slot_count` is zero.
    pub fn new(device: D, slot_count: usize) -> Result<Self> {
        if slot_count == 0 {
            return Err(Error::InvalidSlotCount(slot_count));
        }
        let pool = CommandPool::new(device.clone())?;
        let command_buffers = pool.allocate(slot_count as u32)?;
        let slots = command_buffers
            .into_iter()
            .map(|command_buffer| -> Result<FrameSlot<D>> {
                Ok(FrameSlot {
                    image_ready: Semaphore::new(device.clone())?,
                    render_complete: Semaphore::new(device.clone())?,
                    in_flight: Fence::new(device.clone(), true)?,
                    command_buffer,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!("Created frame pool with {slot_count} slots.");
        Ok(FramePool {
            slots,
            pool,
            device,
        })
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Get a frame slot.
    /// # Panics
    /// Panics if the index is out of range.
    pub fn slot(&self, index: usize) -> &FrameSlot<D> {
        &self.slots[index]
    }

    /// Record a frame into a slot's command buffer.
    ///
    /// The command buffer is reset and started, the render pass is started on the framebuffer for `image_index`
    /// with viewport and scissor covering the full render area, and then the callback records its commands.
    /// Afterwards the render pass and command buffer are ended.
    pub fn record_into<F>(&self, slot: usize, targets: &RenderTargets<D>, image_index: u32, f: F) -> Result<()>
    where
        F: FnOnce(&mut DrawContext<D>) -> anyhow::Result<()>, {
        let cmd = self.slots[slot].command_buffer;
        let framebuffer = targets.framebuffer(image_index)?;
        let extent = targets.extent();

        self.device.reset_command_buffer(cmd)?;
        self.device.begin_command_buffer(cmd)?;
        self.device
            .cmd_begin_render_pass(cmd, unsafe { targets.render_pass() }, framebuffer, extent, targets.clear_value());
        self.device.cmd_set_viewport_scissor(cmd, extent);

        let mut ctx = DrawContext::new(&self.device, cmd, extent, slot, image_index);
        let result = f(&mut ctx);
        // Always close the render pass so the command buffer is left in a consistent state.
        self.device.cmd_end_render_pass(cmd);
        self.device.end_command_buffer(cmd)?;
        result.map_err(Error::Callback)
    }
}
