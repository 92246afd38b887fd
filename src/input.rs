//! Keyboard → pilot intent mapping
//!
//! Level-triggered: key state is tracked as events arrive and sampled once per
//! tick. No event queue.

use winit::keyboard::KeyCode;

use crate::sim::TickInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Thrust,
    RotateLeft,
    RotateRight,
    Reset,
    Quit,
}

/// Default key bindings (arrows or WASD, R to reset, Escape to quit)
pub fn map_key(key: KeyCode) -> Option<Action> {
    match key {
        KeyCode::ArrowUp | KeyCode::KeyW => Some(Action::Thrust),
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(Action::RotateLeft),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(Action::RotateRight),
        KeyCode::KeyR => Some(Action::Reset),
        KeyCode::Escape => Some(Action::Quit),
        _ => None,
    }
}

/// Which actions are currently held
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    thrust: bool,
    rotate_left: bool,
    rotate_right: bool,
    reset: bool,
    quit: bool,
}

impl InputState {
    pub fn set(&mut self, action: Action, held: bool) {
        match action {
            Action::Thrust => self.thrust = held,
            Action::RotateLeft => self.rotate_left = held,
            Action::RotateRight => self.rotate_right = held,
            Action::Reset => self.reset = held,
            Action::Quit => self.quit = held,
        }
    }

    pub fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        if let Some(action) = map_key(key) {
            self.set(action, pressed);
        }
    }

    /// Drop all held keys (e.g. when the window loses focus)
    pub fn release_all(&mut self) {
        *self = Self::default();
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    /// Snapshot for one tick
    pub fn sample(&self) -> TickInput {
        TickInput {
            thrust: self.thrust,
            rotate_left: self.rotate_left,
            rotate_right: self.rotate_right,
            reset: self.reset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings() {
        assert_eq!(map_key(KeyCode::ArrowUp), Some(Action::Thrust));
        assert_eq!(map_key(KeyCode::KeyW), Some(Action::Thrust));
        assert_eq!(map_key(KeyCode::KeyA), Some(Action::RotateLeft));
        assert_eq!(map_key(KeyCode::ArrowRight), Some(Action::RotateRight));
        assert_eq!(map_key(KeyCode::KeyR), Some(Action::Reset));
        assert_eq!(map_key(KeyCode::Escape), Some(Action::Quit));
        assert_eq!(map_key(KeyCode::KeyZ), None);
    }

    #[test]
    fn test_level_triggered_sampling() {
        let mut input = InputState::default();
        input.handle_key(KeyCode::ArrowUp, true);
        input.handle_key(KeyCode::KeyA, true);

        // Held keys show up in every sample until released
        for _ in 0..3 {
            let tick = input.sample();
            assert!(tick.thrust);
            assert!(tick.rotate_left);
            assert!(!tick.rotate_right);
        }

        input.handle_key(KeyCode::ArrowUp, false);
        assert!(!input.sample().thrust);
        assert!(input.sample().rotate_left);
    }

    #[test]
    fn test_release_all() {
        let mut input = InputState::default();
        input.handle_key(KeyCode::KeyR, true);
        input.handle_key(KeyCode::Escape, true);
        assert!(input.sample().reset);
        assert!(input.quit_requested());

        input.release_all();
        assert_eq!(input.sample(), TickInput::default());
        assert!(!input.quit_requested());
    }
}
