use anyhow::Result;
use ash::vk;
use ash::vk::Handle;

use lantern::{Error, FramePool, GraphicsCmdBuffer, RenderTargets, Swapchain};

use framework::{extent, MockDevice};

mod framework;

#[test]
pub fn slots_start_signaled() -> Result<()> {
    let device = MockDevice::new();
    let pool = FramePool::new(device.clone(), 3)?;
    assert_eq!(pool.slot_count(), 3);
    for index in 0..3 {
        // Waiting on a fresh slot must not block.
        pool.slot(index).fence().wait(None)?;
    }
    assert_eq!(device.live_of_kind("fence"), 3);
    assert_eq!(device.live_of_kind("semaphore"), 6);
    assert_eq!(device.live_of_kind("command pool"), 1);
    Ok(())
}

#[test]
pub fn zero_slots_rejected() -> Result<()> {
    let device = MockDevice::new();
    assert!(matches!(FramePool::new(device.clone(), 0), Err(Error::InvalidSlotCount(0))));
    assert_eq!(device.live_count(), 0);
    Ok(())
}

#[test]
pub fn partial_failure_rolls_back() -> Result<()> {
    let device = MockDevice::new();
    // Fail creating the second slot's fence.
    device.fail_on("vkCreateFence", 1, vk::Result::ERROR_OUT_OF_HOST_MEMORY);
    let err = FramePool::new(device.clone(), 3).unwrap_err();
    assert!(err.to_string().contains("vkCreateFence"));
    assert_eq!(device.live_count(), 0);
    Ok(())
}

#[test]
pub fn record_into_call_order() -> Result<()> {
    let device = MockDevice::new();
    let swapchain = Swapchain::new(device.clone(), &device.surface(), true, None, extent(800, 600))?;
    let targets = RenderTargets::new(device.clone(), &swapchain, [0.0; 4])?;
    let pool = FramePool::new(device.clone(), 2)?;
    device.clear_calls();

    pool.record_into(1, &targets, 2, |ctx| {
        assert_eq!(ctx.frame_index(), 1);
        assert_eq!(ctx.image_index(), 2);
        assert_eq!(ctx.extent(), extent(800, 600));
        ctx.bind_graphics_pipeline(vk::Pipeline::from_raw(11))
            .bind_vertex_buffer(0, vk::Buffer::from_raw(12), 0)
            .bind_index_buffer(vk::Buffer::from_raw(13), 0, vk::IndexType::UINT16)
            .bind_descriptor_set(vk::PipelineLayout::from_raw(14), 0, vk::DescriptorSet::from_raw(15))
            .push_constants(vk::PipelineLayout::from_raw(14), vk::ShaderStageFlags::VERTEX, 0, &[1, 2, 3, 4])
            .draw_indexed(6, 1, 0, 0, 0);
        Ok(())
    })?;

    assert_eq!(
        device.ops(),
        vec![
            "vkResetCommandBuffer",
            "vkBeginCommandBuffer",
            "vkCmdBeginRenderPass",
            "vkCmdSetViewport",
            "vkCmdBindPipeline",
            "vkCmdBindVertexBuffers",
            "vkCmdBindIndexBuffer",
            "vkCmdBindDescriptorSets",
            "vkCmdPushConstants",
            "vkCmdDrawIndexed",
            "vkCmdEndRenderPass",
            "vkEndCommandBuffer",
        ]
    );
    let begin = device.calls()[2];
    assert_eq!(begin.handle, targets.framebuffer(2)?.as_raw());
    assert_eq!(device.state().last_viewport, Some(extent(800, 600)));
    assert_eq!(device.state().push_constants, vec![vec![1, 2, 3, 4]]);
    Ok(())
}

#[test]
pub fn callback_error_is_reported() -> Result<()> {
    let device = MockDevice::new();
    let swapchain = Swapchain::new(device.clone(), &device.surface(), true, None, extent(800, 600))?;
    let targets = RenderTargets::new(device.clone(), &swapchain, [0.0; 4])?;
    let pool = FramePool::new(device.clone(), 1)?;
    device.clear_calls();

    let err = pool
        .record_into(0, &targets, 0, |_| Err(anyhow::anyhow!("pipeline missing")))
        .unwrap_err();
    assert!(matches!(err, Error::Callback(_)));
    assert!(err.to_string().contains("pipeline missing"));
    // The command buffer is still closed properly.
    assert_eq!(device.ops().last().copied(), Some("vkEndCommandBuffer"));
    Ok(())
}
