//! Pointer state folded from drained input events
//!
//! The event queue only carries raw deltas; scene code usually wants the
//! current cursor position and which buttons went down or up this tick.

use std::collections::HashSet;

use glam::Vec2;

use crate::event::{Event, MouseButton};

/// Tracks the mouse across ticks.
///
/// `buttons_just_pressed` / `buttons_just_released` only hold what happened
/// in the events applied since the last [`begin_frame`](Self::begin_frame).
#[derive(Debug, Clone, Default)]
pub struct PointerState {
    /// Current cursor position in scene coordinates, if known
    pub cursor_position: Option<Vec2>,

    /// Set of mouse buttons currently held down
    pub buttons_pressed: HashSet<MouseButton>,

    /// Set of mouse buttons that were pressed this frame
    pub buttons_just_pressed: HashSet<MouseButton>,

    /// Set of mouse buttons that were released this frame
    pub buttons_just_released: HashSet<MouseButton>,

    /// When set, window y coordinates are flipped against this height so the
    /// scene sees a bottom-left origin
    flip_height: Option<f32>,
}

impl PointerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer state that maps window y (top-left origin) to `height - y`.
    pub fn with_flipped_y(height: f32) -> Self {
        Self {
            flip_height: Some(height),
            ..Self::default()
        }
    }

    pub fn set_flip_height(&mut self, height: Option<f32>) {
        self.flip_height = height;
    }

    /// Forget per-frame transitions; held buttons and the cursor persist.
    pub fn begin_frame(&mut self) {
        self.buttons_just_pressed.clear();
        self.buttons_just_released.clear();
    }

    pub fn apply(&mut self, event: &Event) {
        match *event {
            Event::MouseMove { x, y } => {
                let y = match self.flip_height {
                    Some(height) => height - y,
                    None => y,
                };
                self.cursor_position = Some(Vec2::new(x, y));
            }
            Event::MouseDown { button } => self.press_button(button),
            Event::MouseUp { button } => self.release_button(button),
        }
    }

    pub fn press_button(&mut self, button: MouseButton) {
        if self.buttons_pressed.insert(button) {
            self.buttons_just_pressed.insert(button);
        }
    }

    pub fn release_button(&mut self, button: MouseButton) {
        if self.buttons_pressed.remove(&button) {
            self.buttons_just_released.insert(button);
        }
    }

    pub fn is_button_down(&self, button: MouseButton) -> bool {
        self.buttons_pressed.contains(&button)
    }

    pub fn is_button_just_pressed(&self, button: MouseButton) -> bool {
        self.buttons_just_pressed.contains(&button)
    }

    pub fn is_button_just_released(&self, button: MouseButton) -> bool {
        self.buttons_just_released.contains(&button)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_press_release() {
        let mut pointer = PointerState::new();

        pointer.apply(&Event::MouseDown { button: MouseButton::Left });
        assert!(pointer.is_button_down(MouseButton::Left));
        assert!(pointer.is_button_just_pressed(MouseButton::Left));
        assert!(!pointer.is_button_just_released(MouseButton::Left));

        // New frame
        pointer.begin_frame();
        assert!(pointer.is_button_down(MouseButton::Left));
        assert!(!pointer.is_button_just_pressed(MouseButton::Left));

        pointer.apply(&Event::MouseUp { button: MouseButton::Left });
        assert!(!pointer.is_button_down(MouseButton::Left));
        assert!(pointer.is_button_just_released(MouseButton::Left));
    }

    #[test]
    fn test_release_without_press_is_ignored() {
        let mut pointer = PointerState::new();
        pointer.apply(&Event::MouseUp { button: MouseButton::Right });
        assert!(!pointer.is_button_just_released(MouseButton::Right));
    }

    #[test]
    fn test_cursor_flip() {
        let mut pointer = PointerState::with_flipped_y(600.0);
        assert_eq!(pointer.cursor_position, None);

        pointer.apply(&Event::MouseMove { x: 10.0, y: 100.0 });
        assert_eq!(pointer.cursor_position, Some(Vec2::new(10.0, 500.0)));

        pointer.set_flip_height(None);
        pointer.apply(&Event::MouseMove { x: 10.0, y: 100.0 });
        assert_eq!(pointer.cursor_position, Some(Vec2::new(10.0, 100.0)));
    }
}
