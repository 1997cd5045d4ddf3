use anyhow::Result;
use log::{error, info};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::WindowBuilder;

use lantern::prelude::*;

fn main() -> Result<()> {
    std::env::set_var("RUST_LOG", std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()));
    pretty_env_logger::init();

    let event_loop = EventLoopBuilder::new().build();
    let window = WindowBuilder::new()
        .with_title("Lantern clear screen")
        .with_inner_size(winit::dpi::LogicalSize::new(1280.0, 720.0))
        .build(&event_loop)?;

    let settings = AppBuilder::new()
        .name("Lantern clear screen")
        .version((0, 1, 0))
        .validation(cfg!(debug_assertions))
        .window(&window)
        .frames_in_flight(2)
        .clear_color([0.1, 0.2, 0.3, 1.0])
        .build();
    let mut ctx = initialize(&settings)?;
    let mut window_state = WindowState::from_window(&window);

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
                // Only the clear from the render pass is needed.
                match ctx.frame.new_frame(&mut window_state, |_| Ok(())) {
                    Ok(FrameStatus::Resized) | Ok(FrameStatus::PresentedResized) => {
                        let extent = ctx.frame.swap_extent();
                        info!("Swapchain is now {}x{}", extent.width, extent.height);
                        window.set_title(&format!("Lantern clear screen ({}x{})", extent.width, extent.height));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        error!("Frame failed: {err}");
                        *control_flow = ControlFlow::Exit;
                    }
                }
            }
            _ => (),
        }
    })
}
