/// Input button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    MouseLeft,
    MouseRight,
    MouseMiddle,
    Shift,
}

/// Controller - pointer and button state sampled once per frame
pub trait Controller {
    /// Check if button is currently down
    fn is_down(&self, button: Button) -> bool;

    /// Get all currently pressed buttons
    fn get_down_keys(&self) -> &[Button];

    /// Pointer movement in physical pixels since the last reset
    fn pointer_delta(&self) -> (f32, f32);

    /// Scroll distance since the last reset, positive away from the user
    fn scroll_delta(&self) -> f32;
}
