//! Keyboard and pointer input from a winit window

use std::cell::Cell;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::{Axis2, DeviceKind, DeviceSlot, InputElement, InputSource, Reading};

/// Input source fed by window events.
///
/// Exposes one keyboard and one pointer. Key and button state persists
/// between reads; scroll movement accumulates until the pointer is read.
#[derive(Debug, Default)]
pub struct WindowInput {
    /// Every key seen so far, in first-seen order
    keys: Vec<(KeyCode, bool)>,
    /// Every mouse button seen so far, in first-seen order
    mouse_buttons: Vec<(MouseButton, bool)>,
    /// Cursor position in canvas pixels
    cursor: Vec2,
    /// Scroll since the last pointer read
    scroll: Cell<Vec2>,
}

impl WindowInput {
    /// Create a source with nothing pressed
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a window event; returns whether it was an input event
    pub fn process_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    self.process_keyboard(key_code, event.state);
                }
                true
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.process_mouse_button(*button, *state);
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.process_cursor(Vec2::new(position.x as f32, position.y as f32));
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(x, y) => Vec2::new(*x, *y),
                    MouseScrollDelta::PixelDelta(pos) => Vec2::new(pos.x as f32, pos.y as f32),
                };
                self.process_scroll(scroll);
                true
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                true
            }
            _ => false,
        }
    }

    /// Process a keyboard event
    pub fn process_keyboard(&mut self, key_code: KeyCode, state: ElementState) {
        set_pressed(&mut self.keys, key_code, state.is_pressed());
    }

    /// Process a mouse button event
    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) {
        set_pressed(&mut self.mouse_buttons, button, state.is_pressed());
    }

    /// Process cursor movement
    pub fn process_cursor(&mut self, position: Vec2) {
        self.cursor = position;
    }

    /// Process scroll wheel movement
    pub fn process_scroll(&mut self, delta: Vec2) {
        self.scroll.set(self.scroll.get() + delta);
    }

    /// Release every key and button, e.g. when the window loses focus
    pub fn release_all(&mut self) {
        self.keys.iter_mut().for_each(|(_, down)| *down = false);
        self.mouse_buttons.iter_mut().for_each(|(_, down)| *down = false);
    }

    /// Check if a key is currently pressed
    #[must_use]
    pub fn is_key_pressed(&self, key: KeyCode) -> bool {
        self.keys.iter().any(|&(k, down)| k == key && down)
    }

    /// Current cursor position
    #[must_use]
    pub fn cursor(&self) -> Vec2 {
        self.cursor
    }

    fn keyboard_reading(&self) -> Reading {
        self.keys
            .iter()
            .map(|&(key, down)| (InputElement::Key(key), pressed_value(down)))
            .collect()
    }

    fn pointer_reading(&self, consume_scroll: bool) -> Reading {
        let scroll = if consume_scroll {
            self.scroll.take()
        } else {
            self.scroll.get()
        };
        let mut reading = Reading::new()
            .with(InputElement::Cursor(Axis2::X), self.cursor.x)
            .with(InputElement::Cursor(Axis2::Y), self.cursor.y);
        for &(button, down) in &self.mouse_buttons {
            reading.set(InputElement::MouseButton(button), pressed_value(down));
        }
        reading
            .with(InputElement::Scroll(Axis2::X), scroll.x)
            .with(InputElement::Scroll(Axis2::Y), scroll.y)
    }
}

impl InputSource for WindowInput {
    fn connected(&self) -> Vec<DeviceSlot> {
        vec![DeviceSlot::KEYBOARD, DeviceSlot::POINTER]
    }

    fn read(&self, slot: DeviceSlot) -> Option<Reading> {
        match (slot.kind, slot.index) {
            (DeviceKind::Keyboard, 0) => Some(self.keyboard_reading()),
            (DeviceKind::Pointer, 0) => Some(self.pointer_reading(true)),
            _ => None,
        }
    }

    fn peek(&self, slot: DeviceSlot) -> Option<Reading> {
        match (slot.kind, slot.index) {
            (DeviceKind::Pointer, 0) => Some(self.pointer_reading(false)),
            _ => self.read(slot),
        }
    }
}

fn set_pressed<T: PartialEq>(states: &mut Vec<(T, bool)>, id: T, pressed: bool) {
    if let Some(entry) = states.iter_mut().find(|(k, _)| *k == id) {
        entry.1 = pressed;
    } else {
        states.push((id, pressed));
    }
}

fn pressed_value(down: bool) -> f32 {
    if down { 1.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyboard_reading() {
        let mut input = WindowInput::new();
        input.process_keyboard(KeyCode::KeyW, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyA, ElementState::Pressed);
        input.process_keyboard(KeyCode::KeyW, ElementState::Released);

        let reading = input.read(DeviceSlot::KEYBOARD).unwrap();
        assert_eq!(reading.get(InputElement::Key(KeyCode::KeyW)), Some(0.0));
        assert_eq!(reading.get(InputElement::Key(KeyCode::KeyA)), Some(1.0));
        assert!(input.is_key_pressed(KeyCode::KeyA));
        assert!(!input.is_key_pressed(KeyCode::KeyW));
    }

    #[test]
    fn test_scroll_resets_after_read() {
        let mut input = WindowInput::new();
        input.process_scroll(Vec2::new(0.0, 1.0));
        input.process_scroll(Vec2::new(0.0, 2.0));
        input.process_cursor(Vec2::new(40.0, 30.0));

        let first = input.read(DeviceSlot::POINTER).unwrap();
        assert_eq!(first.get(InputElement::Scroll(Axis2::Y)), Some(3.0));
        assert_eq!(first.get(InputElement::Cursor(Axis2::X)), Some(40.0));

        let second = input.read(DeviceSlot::POINTER).unwrap();
        assert_eq!(second.get(InputElement::Scroll(Axis2::Y)), Some(0.0));
    }

    #[test]
    fn test_scroll_before_connect_is_reported() {
        use std::cell::RefCell;
        use std::rc::Rc;
        use std::time::Duration;

        use crate::input::{InputEvent, InputManager};

        let mut input = WindowInput::new();
        input.process_scroll(Vec2::new(0.0, 2.0));

        let mut manager = InputManager::new(Duration::from_millis(16));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        manager.on_input(move |event| sink.borrow_mut().push(event.event));

        // Connecting seeds the pointer without eating the pending scroll
        manager.tick(&input);
        assert!(seen.borrow().is_empty());
        let peeked = input.peek(DeviceSlot::POINTER).unwrap();
        assert_eq!(peeked.get(InputElement::Scroll(Axis2::Y)), Some(2.0));

        manager.tick(&input);
        assert_eq!(
            *seen.borrow(),
            vec![InputEvent::ScrollWheelMove {
                axis: Axis2::Y,
                delta: 2.0
            }]
        );
    }

    #[test]
    fn test_release_all() {
        let mut input = WindowInput::new();
        input.process_keyboard(KeyCode::Space, ElementState::Pressed);
        input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        input.release_all();

        let pointer = input.read(DeviceSlot::POINTER).unwrap();
        assert_eq!(pointer.get(InputElement::MouseButton(MouseButton::Left)), Some(0.0));
        assert!(!input.is_key_pressed(KeyCode::Space));
    }

    #[test]
    fn test_only_window_slots() {
        let input = WindowInput::new();
        assert_eq!(input.connected().len(), 2);
        assert!(input.read(DeviceSlot::gamepad(0)).is_none());
    }
}
