//! Input devices
//!
//! Keyboards, pointers and gamepads share one contract: a device polls its
//! source at a fixed interval, diffs the reading against what it saw last and
//! emits a typed event for every element that changed.

mod device;
mod element;
#[cfg(feature = "gilrs")]
mod gamepad;
mod manager;
mod source;
mod window;

pub use device::{DeviceId, InputDevice};
pub use element::{Axis2, DeviceKind, InputElement, InputEvent};
#[cfg(feature = "gilrs")]
pub use gamepad::{AXES, BUTTONS, GilrsSource};
pub use manager::{DeviceEvent, InputManager, ManagerEvent};
pub use source::{DeviceSlot, InputSource, Reading, ScriptedSource};
pub use window::WindowInput;
