use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Held-state of the two steering directions, sampled once per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
}

impl InputState {
    pub const NONE: Self = Self { left: false, right: false };
    pub const LEFT: Self = Self { left: true, right: false };
    pub const RIGHT: Self = Self { left: false, right: true };

    #[inline(always)]
    pub fn is_idle(&self) -> bool {
        !self.left && !self.right
    }
}

pub fn init_state() -> InputState {
    InputState::default()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Steer {
    Left,
    Right,
}

#[inline(always)]
pub fn steer_from_keycode(code: KeyCode) -> Option<Steer> {
    match code {
        KeyCode::ArrowLeft | KeyCode::KeyA => Some(Steer::Left),
        KeyCode::ArrowRight | KeyCode::KeyD => Some(Steer::Right),
        _ => None,
    }
}

pub fn apply_key(state: &mut InputState, code: KeyCode, pressed: bool) {
    match steer_from_keycode(code) {
        Some(Steer::Left) => state.left = pressed,
        Some(Steer::Right) => state.right = pressed,
        None => {}
    }
}

pub fn handle_keyboard_input(event: &KeyEvent, state: &mut InputState) {
    if let PhysicalKey::Code(code) = event.physical_key {
        apply_key(state, code, event.state == ElementState::Pressed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn press_and_release_track_held_state() {
        let mut state = init_state();
        apply_key(&mut state, KeyCode::KeyA, true);
        apply_key(&mut state, KeyCode::ArrowRight, true);
        assert_eq!(state, InputState { left: true, right: true });

        apply_key(&mut state, KeyCode::KeyA, false);
        assert_eq!(state, InputState::RIGHT);

        apply_key(&mut state, KeyCode::Space, true);
        assert_eq!(state, InputState::RIGHT, "unbound keys are ignored");
    }
}
