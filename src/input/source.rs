//! Platform input enumeration
//!
//! An [`InputSource`] lists the connected devices and returns a snapshot of
//! each one's element values on request. Devices diff successive snapshots.

use std::collections::BTreeMap;

use super::{DeviceKind, InputElement};

/// Address of a device within its source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceSlot {
    pub kind: DeviceKind,
    pub index: u32,
}

impl DeviceSlot {
    #[must_use]
    pub const fn new(kind: DeviceKind, index: u32) -> Self {
        Self { kind, index }
    }

    /// The single keyboard of a window
    pub const KEYBOARD: Self = Self::new(DeviceKind::Keyboard, 0);
    /// The single pointer of a window
    pub const POINTER: Self = Self::new(DeviceKind::Pointer, 0);

    /// Gamepad at an index
    #[must_use]
    pub const fn gamepad(index: u32) -> Self {
        Self::new(DeviceKind::Gamepad, index)
    }
}

/// Element values of one device at one instant, in reporting order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    values: Vec<(InputElement, f32)>,
}

impl Reading {
    /// Create an empty reading
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gamepad reading: every button by index, then every axis by index
    #[must_use]
    pub fn gamepad(buttons: &[f32], axes: &[f32]) -> Self {
        let buttons = (0u32..).zip(buttons).map(|(i, &v)| (InputElement::Button(i), v));
        let axes = (0u32..).zip(axes).map(|(i, &v)| (InputElement::Axis(i), v));
        Self {
            values: buttons.chain(axes).collect(),
        }
    }

    /// Add an element value
    #[must_use]
    pub fn with(mut self, element: InputElement, value: f32) -> Self {
        self.set(element, value);
        self
    }

    /// Set an element value, replacing an earlier one in place
    pub fn set(&mut self, element: InputElement, value: f32) {
        if let Some(slot) = self.values.iter_mut().find(|(e, _)| *e == element) {
            slot.1 = value;
        } else {
            self.values.push((element, value));
        }
    }

    /// Value of an element
    #[must_use]
    pub fn get(&self, element: InputElement) -> Option<f32> {
        self.values
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, v)| *v)
    }

    /// Elements in reporting order
    pub fn iter(&self) -> impl Iterator<Item = (InputElement, f32)> + '_ {
        self.values.iter().copied()
    }

    /// Number of elements
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the reading has no elements
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FromIterator<(InputElement, f32)> for Reading {
    fn from_iter<T: IntoIterator<Item = (InputElement, f32)>>(iter: T) -> Self {
        let mut reading = Self::new();
        for (element, value) in iter {
            reading.set(element, value);
        }
        reading
    }
}

/// Platform-provided device enumeration and snapshots
pub trait InputSource {
    /// Pull pending platform state; called once per engine tick before polling
    fn refresh(&mut self) {}

    /// Devices currently connected
    fn connected(&self) -> Vec<DeviceSlot>;

    /// Snapshot of a device, or `None` when it cannot be read
    fn read(&self, slot: DeviceSlot) -> Option<Reading>;

    /// Snapshot used to seed a new device; relative movement stays pending
    /// for the next [`InputSource::read`]
    fn peek(&self, slot: DeviceSlot) -> Option<Reading> {
        self.read(slot)
    }
}

/// Two sources side by side, such as window input plus native gamepads.
///
/// The first source wins when both report the same slot.
impl<A: InputSource, B: InputSource> InputSource for (A, B) {
    fn refresh(&mut self) {
        self.0.refresh();
        self.1.refresh();
    }

    fn connected(&self) -> Vec<DeviceSlot> {
        let mut slots = self.0.connected();
        for slot in self.1.connected() {
            if !slots.contains(&slot) {
                slots.push(slot);
            }
        }
        slots
    }

    fn read(&self, slot: DeviceSlot) -> Option<Reading> {
        self.0.read(slot).or_else(|| self.1.read(slot))
    }

    fn peek(&self, slot: DeviceSlot) -> Option<Reading> {
        self.0.peek(slot).or_else(|| self.1.peek(slot))
    }
}

/// An input source driven by code, for tests and replays
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    devices: BTreeMap<DeviceSlot, Reading>,
}

impl ScriptedSource {
    /// Create a source with no devices
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug in a device with an initial reading
    pub fn connect(&mut self, slot: DeviceSlot, reading: Reading) {
        self.devices.insert(slot, reading);
    }

    /// Change one element of a connected device; ignored if not connected
    pub fn set(&mut self, slot: DeviceSlot, element: InputElement, value: f32) {
        if let Some(reading) = self.devices.get_mut(&slot) {
            reading.set(element, value);
        }
    }

    /// Unplug a device; returns whether it was connected
    pub fn disconnect(&mut self, slot: DeviceSlot) -> bool {
        self.devices.remove(&slot).is_some()
    }
}

impl InputSource for ScriptedSource {
    fn connected(&self) -> Vec<DeviceSlot> {
        self.devices.keys().copied().collect()
    }

    fn read(&self, slot: DeviceSlot) -> Option<Reading> {
        self.devices.get(&slot).cloned()
    }
}
