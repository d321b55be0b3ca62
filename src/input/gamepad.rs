//! Native gamepads through gilrs

use gilrs::{Axis, Button, Gilrs};

use super::{DeviceKind, DeviceSlot, InputSource, Reading};

/// Button order of a gamepad reading, following the standard gamepad layout
pub const BUTTONS: [Button; 17] = [
    Button::South,
    Button::East,
    Button::West,
    Button::North,
    Button::LeftTrigger,
    Button::RightTrigger,
    Button::LeftTrigger2,
    Button::RightTrigger2,
    Button::Select,
    Button::Start,
    Button::LeftThumb,
    Button::RightThumb,
    Button::DPadUp,
    Button::DPadDown,
    Button::DPadLeft,
    Button::DPadRight,
    Button::Mode,
];

/// Axis order of a gamepad reading
pub const AXES: [Axis; 4] = [
    Axis::LeftStickX,
    Axis::LeftStickY,
    Axis::RightStickX,
    Axis::RightStickY,
];

/// Input source exposing every gamepad gilrs can see
pub struct GilrsSource {
    gilrs: Gilrs,
}

impl GilrsSource {
    /// Open the platform gamepad backend
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be initialized
    pub fn new() -> Result<Self, gilrs::Error> {
        Ok(Self {
            gilrs: Gilrs::new()?,
        })
    }
}

impl InputSource for GilrsSource {
    fn refresh(&mut self) {
        // Draining events updates the cached gamepad state
        while self.gilrs.next_event().is_some() {}
    }

    fn connected(&self) -> Vec<DeviceSlot> {
        self.gilrs
            .gamepads()
            .filter_map(|(id, _)| u32::try_from(usize::from(id)).ok())
            .map(DeviceSlot::gamepad)
            .collect()
    }

    fn read(&self, slot: DeviceSlot) -> Option<Reading> {
        if slot.kind != DeviceKind::Gamepad {
            return None;
        }
        let (_, gamepad) = self
            .gilrs
            .gamepads()
            .find(|(id, _)| usize::from(*id) == slot.index as usize)?;

        let buttons: Vec<f32> = BUTTONS
            .iter()
            .map(|&b| gamepad.button_data(b).map_or(0.0, |data| data.value()))
            .collect();
        let axes: Vec<f32> = AXES.iter().map(|&a| gamepad.value(a)).collect();
        Some(Reading::gamepad(&buttons, &axes))
    }
}

impl std::fmt::Debug for GilrsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GilrsSource")
            .field("gamepads", &self.connected().len())
            .finish()
    }
}
