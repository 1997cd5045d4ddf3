//! Draws a colored triangle that drifts around the window.
//!
//! The shaders in `demos/shaders` must be compiled to SPIR-V first:
//! ```text
//! glslc demos/shaders/triangle.vert -o demos/shaders/triangle.vert.spv
//! glslc demos/shaders/triangle.frag -o demos/shaders/triangle.frag.spv
//! ```

use std::path::Path;
use std::time::Instant;

use anyhow::{Context as _, Result};
use log::{error, info};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::WindowBuilder;

use lantern::prelude::*;

const SHADER_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/shaders");

#[rustfmt::skip]
const VERTICES: [f32; 15] = [
    // position      color
    0.0, -0.5,       1.0, 0.0, 0.0,
    0.5, 0.5,        0.0, 1.0, 0.0,
    -0.5, 0.5,       0.0, 0.0, 1.0,
];

/// Everything the triangle needs. Field order is drop order.
struct Resources {
    pipeline: Pipeline,
    _pool: DescriptorPool,
    _set_layout: DescriptorSetLayout,
    /// One uniform buffer and descriptor set per frame in flight.
    uniforms: Vec<Buffer>,
    sets: Vec<vk::DescriptorSet>,
    vertices: Buffer,
    _allocator: Allocator,
}

fn load_shader(stage: vk::ShaderStageFlags, name: &str) -> Result<ShaderCreateInfo> {
    let path = Path::new(SHADER_DIR).join(name);
    let bytes = std::fs::read(&path).with_context(|| format!("Could not read {}, compile the shaders with glslc first", path.display()))?;
    Ok(ShaderCreateInfo::from_spirv_bytes(stage, &bytes)?)
}

fn create_resources(ctx: &lantern::Context) -> Result<Resources> {
    let mut allocator = Allocator::new(&ctx.instance, &ctx.device, &ctx.physical_device)?;
    let vertices = Buffer::from_slice(ctx.device.clone(), &mut allocator, &VERTICES, vk::BufferUsageFlags::VERTEX_BUFFER)?;

    let set_layout = DescriptorSetLayout::new(
        ctx.device.clone(),
        &[vk::DescriptorSetLayoutBinding {
            binding: 0,
            descriptor_type: vk::DescriptorType::UNIFORM_BUFFER,
            descriptor_count: 1,
            stage_flags: vk::ShaderStageFlags::VERTEX,
            p_immutable_samplers: std::ptr::null(),
        }],
    )?;
    let frames = ctx.frame.frames_in_flight();
    let mut pool = DescriptorPool::for_layout(ctx.device.clone(), &set_layout, frames as u32)?;
    let mut uniforms = Vec::with_capacity(frames);
    let mut sets = Vec::with_capacity(frames);
    for _ in 0..frames {
        let uniform = Buffer::new(
            ctx.device.clone(),
            &mut allocator,
            8 * std::mem::size_of::<f32>() as u64,
            vk::BufferUsageFlags::UNIFORM_BUFFER,
            MemoryType::CpuToGpu,
        )?;
        sets.push(DescriptorSetBuilder::new().bind_uniform_buffer(0, &uniform).build(&mut pool, &set_layout)?);
        uniforms.push(uniform);
    }

    let pipeline = PipelineBuilder::new("triangle")
        .vertex_input(0, vk::VertexInputRate::VERTEX)
        .vertex_attribute(0, 0, vk::Format::R32G32_SFLOAT)?
        .vertex_attribute(0, 1, vk::Format::R32G32B32_SFLOAT)?
        .descriptor_set_layout(&set_layout)
        .attach_shader(load_shader(vk::ShaderStageFlags::VERTEX, "triangle.vert.spv")?)
        .attach_shader(load_shader(vk::ShaderStageFlags::FRAGMENT, "triangle.frag.spv")?)
        .build(ctx.device.clone(), ctx.frame.render_targets())?;

    Ok(Resources {
        pipeline,
        _pool: pool,
        _set_layout: set_layout,
        uniforms,
        sets,
        vertices,
        _allocator: allocator,
    })
}

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    pretty_env_logger::init();

    let event_loop = EventLoopBuilder::new().build();
    let window = WindowBuilder::new()
        .with_title("Lantern triangle")
        .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0))
        .build(&event_loop)?;

    let settings = AppBuilder::new()
        .name("Lantern triangle")
        .version((0, 1, 0))
        .validation(cfg!(debug_assertions))
        .window(&window)
        .frames_in_flight(2)
        .clear_color([0.05, 0.05, 0.05, 1.0])
        .build();
    let mut ctx = initialize(&settings)?;
    let mut window_state = WindowState::from_window(&window);
    let mut resources = Some(create_resources(&ctx)?);
    let start = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;
        match event {
            Event::WindowEvent {
                event,
                ..
            } => {
                if let WindowEvent::CloseRequested = event {
                    *control_flow = ControlFlow::Exit;
                }
                window_state.handle_event(&event);
            }
            Event::MainEventsCleared => {
                let Some(res) = resources.as_mut() else {
                    return;
                };
                let time = start.elapsed().as_secs_f32();
                let result = ctx.frame.new_frame(&mut window_state, |cmd| {
                    let slot = cmd.frame_index();
                    let frame = [1.0, 0.5 + 0.5 * time.sin(), 1.0, 1.0, 0.25 * time.cos(), 0.25 * time.sin(), 0.0, 0.0];
                    // The frame manager waited for this slot, so its uniform buffer is no longer read by the GPU.
                    res.uniforms[slot].write(0, &frame)?;
                    unsafe {
                        cmd.bind_graphics_pipeline(res.pipeline.handle())
                            .bind_descriptor_set(res.pipeline.layout(), 0, res.sets[slot])
                            .bind_vertex_buffer(0, res.vertices.handle(), 0)
                            .draw(3, 1, 0, 0);
                    }
                    Ok(())
                });
                match result {
                    Ok(FrameStatus::Resized) | Ok(FrameStatus::PresentedResized) => {
                        let extent = ctx.frame.swap_extent();
                        info!("Swapchain is now {}x{}", extent.width, extent.height);
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!("Frame failed: {err}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            Event::LoopDestroyed => {
                if let Err(err) = ctx.device.wait_idle() {
                    error!("Failed to wait for the device: {err}");
                }
                resources = None;
            }
            _ => (),
        }
    })
}
