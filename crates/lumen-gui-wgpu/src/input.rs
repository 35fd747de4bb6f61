//! Winit input adapter for lumen-gui
//!
//! Converts winit window events into lumen-gui's backend-agnostic
//! [`Event`]s and feeds them to an event queue or render context.

use lumen_gui::{Event, EventQueue, GraphicsBackend, MouseButton, QueueError, RenderContext};
use winit::event::{ElementState, WindowEvent};

/// Extension trait for anything that buffers lumen-gui input
pub trait WinitInputExt {
    /// Enqueue the lumen-gui equivalent of `event`, if it has one.
    ///
    /// Returns `Ok(true)` when an event was queued and `Ok(false)` for window
    /// events that carry no pointer input.
    fn handle_winit_event(&mut self, event: &WindowEvent) -> Result<bool, QueueError>;
}

impl WinitInputExt for EventQueue {
    fn handle_winit_event(&mut self, event: &WindowEvent) -> Result<bool, QueueError> {
        match convert_window_event(event) {
            Some(event) => self.push(event).map(|_| true),
            None => Ok(false),
        }
    }
}

impl<B: GraphicsBackend> WinitInputExt for RenderContext<B> {
    fn handle_winit_event(&mut self, event: &WindowEvent) -> Result<bool, QueueError> {
        match convert_window_event(event) {
            Some(event) => self.push_event(event).map(|_| true),
            None => Ok(false),
        }
    }
}

/// Convert a winit `WindowEvent` into a lumen-gui [`Event`]
pub fn convert_window_event(event: &WindowEvent) -> Option<Event> {
    match event {
        WindowEvent::CursorMoved { position, .. } => Some(Event::MouseMove {
            x: position.x as f32,
            y: position.y as f32,
        }),
        WindowEvent::MouseInput { state, button, .. } => {
            let button = convert_mouse_button(*button);
            Some(match state {
                ElementState::Pressed => Event::MouseDown { button },
                ElementState::Released => Event::MouseUp { button },
            })
        }
        _ => None,
    }
}

/// Convert winit MouseButton to lumen-gui MouseButton
pub fn convert_mouse_button(button: winit::event::MouseButton) -> MouseButton {
    match button {
        winit::event::MouseButton::Left => MouseButton::Left,
        winit::event::MouseButton::Right => MouseButton::Right,
        winit::event::MouseButton::Middle => MouseButton::Middle,
        winit::event::MouseButton::Back => MouseButton::Other(3),
        winit::event::MouseButton::Forward => MouseButton::Other(4),
        winit::event::MouseButton::Other(n) => MouseButton::Other(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_mapping() {
        assert_eq!(
            convert_mouse_button(winit::event::MouseButton::Left),
            MouseButton::Left
        );
        assert_eq!(
            convert_mouse_button(winit::event::MouseButton::Middle),
            MouseButton::Middle
        );
        assert_eq!(
            convert_mouse_button(winit::event::MouseButton::Forward),
            MouseButton::Other(4)
        );
        assert_eq!(
            convert_mouse_button(winit::event::MouseButton::Other(9)),
            MouseButton::Other(9)
        );
    }

    #[test]
    fn test_non_input_events_are_ignored() {
        let mut queue = EventQueue::new(4);
        assert_eq!(queue.handle_winit_event(&WindowEvent::CloseRequested), Ok(false));
        assert_eq!(queue.handle_winit_event(&WindowEvent::Focused(true)), Ok(false));
        assert!(queue.is_empty());
    }
}
