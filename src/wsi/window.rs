//! Utilities for generic window handling

use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

/// Trait for windows that exposes the content width and height of a window.
pub trait WindowSize {
    /// Get the width of the window
    fn width(&self) -> u32;
    /// Get the height of the window
    fn height(&self) -> u32;
}

#[cfg(feature = "winit")]
impl WindowSize for winit::window::Window {
    fn width(&self) -> u32 {
        self.inner_size().width
    }

    fn height(&self) -> u32 {
        self.inner_size().height
    }
}

/// Generic "window" trait that is applied to all raw_window_handle providers and those who implement window size
pub trait Window: WindowSize + HasRawDisplayHandle + HasRawWindowHandle {}
impl<T: WindowSize + HasRawDisplayHandle + HasRawWindowHandle> Window for T {}

/// Window signals consumed by the [`FrameManager`](crate::FrameManager).
///
/// The application owns this value and feeds it from its window system's events. The frame manager reads the
/// minimized flag before every frame and consumes the resize flag after presenting.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct WindowState {
    width: u32,
    height: u32,
    resized: bool,
    minimized: bool,
}

impl WindowState {
    /// Create window state for a window with the given content size.
    pub fn new(width: u32, height: u32) -> Self {
        WindowState {
            width,
            height,
            resized: false,
            minimized: width == 0 || height == 0,
        }
    }

    /// Create window state from the current size of a window.
    pub fn from_window(window: &dyn WindowSize) -> Self {
        Self::new(window.width(), window.height())
    }

    /// Update the window size. This always flags a pending resize. A window with zero area is treated as minimized.
    pub fn set_window_values(&mut self, width: u32, height: u32, minimized: bool) {
        self.width = width;
        self.height = height;
        self.minimized = minimized || width == 0 || height == 0;
        self.resized = true;
    }

    /// Mark the window as minimized or restored.
    pub fn set_minimized(&mut self, minimized: bool) {
        self.minimized = minimized;
    }

    /// Request a swapchain rebuild after the next presented frame.
    pub fn request_resize(&mut self) {
        self.resized = true;
    }

    /// Whether a resize is pending.
    pub fn resize_requested(&self) -> bool {
        self.resized
    }

    /// Clear the resize flag, returning whether it was set.
    pub fn take_resize(&mut self) -> bool {
        std::mem::take(&mut self.resized)
    }

    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Current content size of the window.
    pub fn extent(&self) -> vk::Extent2D {
        vk::Extent2D {
            width: self.width,
            height: self.height,
        }
    }

    /// Update the state from a winit window event. Returns true if the event changed the window size.
    #[cfg(feature = "winit")]
    pub fn handle_event(&mut self, event: &winit::event::WindowEvent) -> bool {
        use winit::event::WindowEvent;
        match event {
            WindowEvent::Resized(size) => {
                self.set_window_values(size.width, size.height, false);
                true
            }
            WindowEvent::ScaleFactorChanged {
                new_inner_size,
                ..
            } => {
                self.set_window_values(new_inner_size.width, new_inner_size.height, false);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_area_is_minimized() {
        let mut state = WindowState::new(800, 600);
        assert!(!state.is_minimized());
        state.set_window_values(0, 600, false);
        assert!(state.is_minimized());
        state.set_window_values(1024, 768, false);
        assert!(!state.is_minimized());
        assert_eq!(
            state.extent(),
            vk::Extent2D {
                width: 1024,
                height: 768
            }
        );
    }

    #[test]
    fn resize_flag_is_consumed() {
        let mut state = WindowState::new(800, 600);
        assert!(!state.take_resize());
        state.set_window_values(640, 480, false);
        assert!(state.resize_requested());
        assert!(state.take_resize());
        assert!(!state.take_resize());
    }

    #[test]
    fn explicit_minimize_keeps_size() {
        let mut state = WindowState::new(800, 600);
        state.set_window_values(800, 600, true);
        assert!(state.is_minimized());
        state.set_minimized(false);
        assert!(!state.is_minimized());
    }
}
