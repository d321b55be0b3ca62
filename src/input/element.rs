//! Input element identifiers and change events

use winit::event::MouseButton;
use winit::keyboard::KeyCode;

/// Kind of input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceKind {
    Keyboard,
    Pointer,
    Gamepad,
}

/// Axis of a two-dimensional element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Axis2 {
    X,
    Y,
}

/// One discrete input whose value a device tracks.
///
/// Every element carries a numeric value: keys and mouse buttons read 0 or 1,
/// gamepad buttons may report analog pressure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputElement {
    Key(KeyCode),
    MouseButton(MouseButton),
    /// Pointer position in canvas pixels
    Cursor(Axis2),
    /// Wheel movement since the previous poll
    Scroll(Axis2),
    /// Gamepad button by index
    Button(u32),
    /// Gamepad axis by index
    Axis(u32),
}

impl InputElement {
    /// Relative elements report movement rather than state. They are emitted
    /// whenever non-zero and never stored.
    #[must_use]
    pub const fn is_relative(&self) -> bool {
        matches!(self, Self::Scroll(_))
    }
}

/// Emitted by a device when an element changes or the device goes away
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    MouseButtonDown(MouseButton),
    MouseButtonUp(MouseButton),
    CursorMove { axis: Axis2, value: f32 },
    ScrollWheelMove { axis: Axis2, delta: f32 },
    ButtonValueChange { button: u32, value: f32 },
    AxisValueChange { axis: u32, value: f32 },
    /// The device is gone; nothing follows this event
    Disconnect,
}

impl InputEvent {
    /// Event reporting that `element` now reads `value`
    #[must_use]
    pub fn changed(element: InputElement, value: f32) -> Self {
        let pressed = value >= 0.5;
        match element {
            InputElement::Key(key) if pressed => Self::KeyDown(key),
            InputElement::Key(key) => Self::KeyUp(key),
            InputElement::MouseButton(button) if pressed => Self::MouseButtonDown(button),
            InputElement::MouseButton(button) => Self::MouseButtonUp(button),
            InputElement::Cursor(axis) => Self::CursorMove { axis, value },
            InputElement::Scroll(axis) => Self::ScrollWheelMove { axis, delta: value },
            InputElement::Button(button) => Self::ButtonValueChange { button, value },
            InputElement::Axis(axis) => Self::AxisValueChange { axis, value },
        }
    }

    /// Element this event is about, if any
    #[must_use]
    pub const fn element(&self) -> Option<InputElement> {
        match *self {
            Self::KeyDown(key) | Self::KeyUp(key) => Some(InputElement::Key(key)),
            Self::MouseButtonDown(b) | Self::MouseButtonUp(b) => Some(InputElement::MouseButton(b)),
            Self::CursorMove { axis, .. } => Some(InputElement::Cursor(axis)),
            Self::ScrollWheelMove { axis, .. } => Some(InputElement::Scroll(axis)),
            Self::ButtonValueChange { button, .. } => Some(InputElement::Button(button)),
            Self::AxisValueChange { axis, .. } => Some(InputElement::Axis(axis)),
            Self::Disconnect => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_changed_maps_to_typed_events() {
        assert_eq!(
            InputEvent::changed(InputElement::Key(KeyCode::KeyW), 1.0),
            InputEvent::KeyDown(KeyCode::KeyW)
        );
        assert_eq!(
            InputEvent::changed(InputElement::Key(KeyCode::KeyW), 0.0),
            InputEvent::KeyUp(KeyCode::KeyW)
        );
        assert_eq!(
            InputEvent::changed(InputElement::Axis(1), -0.25),
            InputEvent::AxisValueChange {
                axis: 1,
                value: -0.25
            }
        );
        assert_eq!(
            InputEvent::changed(InputElement::Scroll(Axis2::Y), 3.0),
            InputEvent::ScrollWheelMove {
                axis: Axis2::Y,
                delta: 3.0
            }
        );
    }

    #[test]
    fn test_element_round_trip() {
        let element = InputElement::MouseButton(MouseButton::Left);
        assert_eq!(InputEvent::changed(element, 1.0).element(), Some(element));
        assert_eq!(InputEvent::Disconnect.element(), None);
    }
}
