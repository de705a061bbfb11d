use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{Button, Controller};

/// Pixels per scroll line, used to normalise line-based wheels
const PIXELS_PER_LINE: f32 = 100.0;

/// Adapter that bridges Winit events to the Controller trait
#[derive(Debug, Clone)]
pub struct WinitController {
    /// Currently pressed buttons
    pressed_keys: HashSet<Button>,
    /// All pressed buttons as a vec (for efficient get_down_keys)
    pressed_vec: Vec<Button>,
    /// Current mouse position (relative to window)
    mouse_position: Option<(f32, f32)>,
    /// Mouse movement delta since last reset
    mouse_delta: (f32, f32),
    /// Wheel movement since last reset, in pixels
    scroll_delta: f32,
}

impl WinitController {
    /// Create a new WinitController with no pressed keys
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            pressed_vec: Vec::new(),
            mouse_position: None,
            mouse_delta: (0.0, 0.0),
            scroll_delta: 0.0,
        }
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    if let Some(button) = Self::keycode_to_button(keycode) {
                        self.set_button(button, event.state);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = Self::mouse_button_to_button(*button) {
                    self.set_button(btn, *state);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.move_pointer_to(position.x as f32, position.y as f32);
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_position = None;
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y * PIXELS_PER_LINE,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32,
                };
            }
            _ => {}
        }
    }

    fn set_button(&mut self, button: Button, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(button) {
                    self.pressed_vec.push(button);
                }
            }
            ElementState::Released => {
                if self.pressed_keys.remove(&button) {
                    self.pressed_vec.retain(|&b| b != button);
                }
            }
        }
    }

    fn move_pointer_to(&mut self, x: f32, y: f32) {
        if let Some((old_x, old_y)) = self.mouse_position {
            self.mouse_delta.0 += x - old_x;
            self.mouse_delta.1 += y - old_y;
        }
        self.mouse_position = Some((x, y));
    }

    /// Drop held buttons, e.g. when the GUI captures the pointer mid-drag
    pub fn release_all(&mut self) {
        self.pressed_keys.clear();
        self.pressed_vec.clear();
    }

    /// Reset per-frame state (mouse and wheel deltas)
    /// Call this at the end of each frame after processing input
    pub fn reset_deltas(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.scroll_delta = 0.0;
    }

    /// Get current mouse position (if available)
    pub fn mouse_position(&self) -> Option<(f32, f32)> {
        self.mouse_position
    }

    /// Map Winit KeyCode to Button
    fn keycode_to_button(keycode: KeyCode) -> Option<Button> {
        match keycode {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Button::Shift),
            _ => None,
        }
    }

    /// Map Winit MouseButton to Button
    fn mouse_button_to_button(button: MouseButton) -> Option<Button> {
        match button {
            MouseButton::Left => Some(Button::MouseLeft),
            MouseButton::Right => Some(Button::MouseRight),
            MouseButton::Middle => Some(Button::MouseMiddle),
            _ => None,
        }
    }
}

impl Default for WinitController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for WinitController {
    fn is_down(&self, button: Button) -> bool {
        self.pressed_keys.contains(&button)
    }

    fn get_down_keys(&self) -> &[Button] {
        &self.pressed_vec
    }

    fn pointer_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    fn scroll_delta(&self) -> f32 {
        self.scroll_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Winit event construction requires internal fields that are not publicly accessible,
    // so these tests drive the state helpers directly

    #[test]
    fn test_new_controller_empty() {
        let controller = WinitController::new();
        assert!(!controller.is_down(Button::MouseLeft));
        assert_eq!(controller.get_down_keys().len(), 0);
        assert_eq!(controller.mouse_position(), None);
        assert_eq!(controller.pointer_delta(), (0.0, 0.0));
        assert_eq!(controller.scroll_delta(), 0.0);
    }

    #[test]
    fn test_pointer_delta_accumulates() {
        let mut controller = WinitController::new();
        controller.move_pointer_to(100.0, 100.0);
        assert_eq!(controller.pointer_delta(), (0.0, 0.0));

        controller.move_pointer_to(110.0, 95.0);
        controller.move_pointer_to(115.0, 90.0);
        assert_eq!(controller.pointer_delta(), (15.0, -10.0));

        controller.reset_deltas();
        assert_eq!(controller.pointer_delta(), (0.0, 0.0));
        assert_eq!(controller.mouse_position(), Some((115.0, 90.0)));
    }

    #[test]
    fn test_buttons_press_and_release() {
        let mut controller = WinitController::new();
        controller.set_button(Button::MouseLeft, ElementState::Pressed);
        controller.set_button(Button::MouseLeft, ElementState::Pressed);
        assert_eq!(controller.get_down_keys(), &[Button::MouseLeft]);

        controller.set_button(Button::MouseLeft, ElementState::Released);
        assert!(!controller.is_down(Button::MouseLeft));

        controller.set_button(Button::MouseRight, ElementState::Pressed);
        controller.release_all();
        assert!(controller.get_down_keys().is_empty());
    }
}
