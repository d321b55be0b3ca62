//! Device discovery and per-tick polling

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use rustc_hash::FxHashMap;

use super::{DeviceId, DeviceKind, DeviceSlot, InputDevice, InputEvent, InputSource};
use crate::core::{EngineConfig, EventEmitter, EventSource, ListenerId};
use crate::logic::{Interval, LogicError};

/// An [`InputEvent`] tagged with the device that produced it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceEvent {
    pub device: DeviceId,
    pub slot: DeviceSlot,
    pub event: InputEvent,
}

/// Devices appearing and disappearing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerEvent {
    DeviceAdded { device: DeviceId, slot: DeviceSlot },
    DeviceRemoved { device: DeviceId, slot: DeviceSlot },
}

/// Tracks one [`InputDevice`] per connected slot of an [`InputSource`].
///
/// Every device event is also re-emitted as a [`DeviceEvent`], so game code
/// can subscribe once instead of per device.
pub struct InputManager {
    devices: Vec<InputDevice>,
    poll_intervals: FxHashMap<DeviceKind, Interval>,
    tick_length: Duration,
    next_id: u64,
    events: EventEmitter<ManagerEvent>,
    input: Rc<EventEmitter<DeviceEvent>>,
}

impl InputManager {
    /// Create a manager polling every device once per tick
    #[must_use]
    pub fn new(tick_length: Duration) -> Self {
        Self {
            devices: Vec::new(),
            poll_intervals: FxHashMap::default(),
            tick_length,
            next_id: 1,
            events: EventEmitter::new(),
            input: Rc::new(EventEmitter::new()),
        }
    }

    /// Create a manager using the configured tick length and poll rates
    ///
    /// # Errors
    ///
    /// Returns an error if a poll interval is invalid
    pub fn from_config(config: &EngineConfig) -> Result<Self, LogicError> {
        let mut manager = Self::new(config.tick());
        for kind in [DeviceKind::Keyboard, DeviceKind::Pointer, DeviceKind::Gamepad] {
            manager.set_poll_interval(kind, config.poll_interval(kind))?;
        }
        Ok(manager)
    }

    /// Poll rate for a device kind
    #[must_use]
    pub fn poll_interval(&self, kind: DeviceKind) -> Interval {
        self.poll_intervals
            .get(&kind)
            .copied()
            .unwrap_or(Interval::EVERY_TICK)
    }

    /// Change the poll rate of a device kind, including connected devices
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero ticks
    pub fn set_poll_interval(&mut self, kind: DeviceKind, interval: Interval) -> Result<(), LogicError> {
        interval.to_ticks(self.tick_length)?;
        for device in self.devices.iter_mut().filter(|d| d.slot().kind == kind) {
            device.set_poll_interval(interval)?;
        }
        self.poll_intervals.insert(kind, interval);
        Ok(())
    }

    /// Create devices for slots that appeared in the source.
    ///
    /// Returns the number of devices added.
    pub fn sync(&mut self, source: &dyn InputSource) -> usize {
        let mut added = 0;
        for slot in source.connected() {
            if self.devices.iter().any(|d| d.slot() == slot) {
                continue;
            }
            let Some(initial) = source.peek(slot) else {
                continue;
            };

            let id = DeviceId(self.next_id);
            let device = match InputDevice::new(
                id,
                slot,
                &initial,
                self.poll_interval(slot.kind),
                self.tick_length,
            ) {
                Ok(device) => device,
                Err(err) => {
                    log::warn!("Skipping input {slot:?}: {err}");
                    continue;
                }
            };
            self.next_id += 1;

            let forward = Rc::clone(&self.input);
            device.on_event(move |event| {
                forward.emit(&DeviceEvent {
                    device: id,
                    slot,
                    event: *event,
                });
            });

            log::info!("Input {id} connected as {slot:?}");
            self.devices.push(device);
            self.events.emit(&ManagerEvent::DeviceAdded { device: id, slot });
            added += 1;
        }
        added
    }

    /// Run one engine tick of input handling.
    ///
    /// Devices whose slot vanished from the source are disconnected, the rest
    /// are polled if due, disconnected devices are dropped and new slots get
    /// devices. Returns the number of input events emitted.
    pub fn tick(&mut self, source: &dyn InputSource) -> usize {
        let connected = source.connected();
        let mut emitted = 0;
        for device in &mut self.devices {
            if connected.contains(&device.slot()) {
                emitted += device.tick(source);
            } else {
                device.disconnect();
            }
        }

        let (alive, gone): (Vec<_>, Vec<_>) = self
            .devices
            .drain(..)
            .partition(InputDevice::is_connected);
        self.devices = alive;
        for device in gone {
            self.events.emit(&ManagerEvent::DeviceRemoved {
                device: device.id(),
                slot: device.slot(),
            });
        }

        self.sync(source);
        emitted
    }

    /// Look up a device
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&InputDevice> {
        self.devices.iter().find(|d| d.id() == id)
    }

    /// Look up a device mutably
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut InputDevice> {
        self.devices.iter_mut().find(|d| d.id() == id)
    }

    /// Connected devices in connection order
    pub fn devices(&self) -> impl Iterator<Item = &InputDevice> {
        self.devices.iter()
    }

    /// Connected gamepads in connection order
    pub fn gamepads(&self) -> impl Iterator<Item = &InputDevice> {
        self.of_kind(DeviceKind::Gamepad)
    }

    /// Check if any gamepad is connected
    #[must_use]
    pub fn has_gamepads(&self) -> bool {
        self.gamepads().next().is_some()
    }

    /// First connected keyboard
    #[must_use]
    pub fn keyboard(&self) -> Option<&InputDevice> {
        self.of_kind(DeviceKind::Keyboard).next()
    }

    /// First connected pointer
    #[must_use]
    pub fn pointer(&self) -> Option<&InputDevice> {
        self.of_kind(DeviceKind::Pointer).next()
    }

    /// Listen for events from every device
    pub fn on_input(&self, listener: impl Fn(&DeviceEvent) + 'static) -> ListenerId {
        self.input.subscribe(listener)
    }

    /// Stop listening for device events
    pub fn remove_input_listener(&self, id: ListenerId) -> bool {
        self.input.unsubscribe(id)
    }

    /// Listen for devices being added and removed
    pub fn on_device_change(&self, listener: impl Fn(&ManagerEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    fn of_kind(&self, kind: DeviceKind) -> impl Iterator<Item = &InputDevice> {
        self.devices.iter().filter(move |d| d.slot().kind == kind)
    }
}

impl EventSource for InputManager {
    type Event = ManagerEvent;

    fn events(&self) -> &EventEmitter<ManagerEvent> {
        &self.events
    }
}

impl fmt::Debug for InputManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputManager")
            .field("devices", &self.devices)
            .field("tick_length", &self.tick_length)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use winit::keyboard::KeyCode;

    use super::*;
    use crate::input::{InputElement, Reading, ScriptedSource};

    const TICK: Duration = Duration::from_millis(16);

    #[test]
    fn test_devices_follow_source() {
        let mut source = ScriptedSource::new();
        let mut manager = InputManager::new(TICK);
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        manager.on_device_change(move |event| sink.borrow_mut().push(*event));

        source.connect(DeviceSlot::gamepad(0), Reading::gamepad(&[0.0], &[0.0]));
        source.connect(DeviceSlot::gamepad(1), Reading::gamepad(&[0.0], &[0.0]));
        manager.tick(&source);
        assert_eq!(manager.gamepads().count(), 2);
        assert!(manager.has_gamepads());

        source.disconnect(DeviceSlot::gamepad(0));
        manager.tick(&source);
        assert_eq!(manager.gamepads().count(), 1);
        assert_eq!(manager.gamepads().next().unwrap().slot(), DeviceSlot::gamepad(1));

        let changes = changes.borrow();
        assert_eq!(changes.len(), 3);
        assert!(matches!(
            changes[2],
            ManagerEvent::DeviceRemoved { slot, .. } if slot == DeviceSlot::gamepad(0)
        ));
    }

    #[test]
    fn test_reconnect_is_new_instance() {
        let mut source = ScriptedSource::new();
        let mut manager = InputManager::new(TICK);
        let pad = DeviceSlot::gamepad(0);

        source.connect(pad, Reading::gamepad(&[], &[0.0]));
        manager.tick(&source);
        let first = manager.gamepads().next().unwrap().id();

        source.disconnect(pad);
        manager.tick(&source);
        source.connect(pad, Reading::gamepad(&[], &[0.0]));
        manager.tick(&source);

        let second = manager.gamepads().next().unwrap().id();
        assert_ne!(first, second);
        assert!(manager.device(first).is_none());
    }

    #[test]
    fn test_forwarded_events_are_tagged() {
        let mut source = ScriptedSource::new();
        let mut manager = InputManager::new(TICK);
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        manager.on_input(move |event| sink.borrow_mut().push(*event));

        source.connect(DeviceSlot::KEYBOARD, Reading::new());
        manager.tick(&source);
        source.set(DeviceSlot::KEYBOARD, InputElement::Key(KeyCode::ArrowUp), 1.0);
        manager.tick(&source);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].slot, DeviceSlot::KEYBOARD);
        assert_eq!(seen[0].event, InputEvent::KeyDown(KeyCode::ArrowUp));
        assert!(manager.keyboard().unwrap().is_key_down(KeyCode::ArrowUp));
    }

    #[test]
    fn test_poll_rates_per_kind() {
        let mut source = ScriptedSource::new();
        let mut manager = InputManager::new(TICK);
        manager
            .set_poll_interval(DeviceKind::Gamepad, Interval::Ticks(2))
            .unwrap();

        let pad = DeviceSlot::gamepad(0);
        source.connect(pad, Reading::gamepad(&[], &[0.0]));
        manager.tick(&source);

        source.set(pad, InputElement::Axis(0), 1.0);
        assert_eq!(manager.tick(&source), 0);
        assert_eq!(manager.tick(&source), 1);

        assert!(manager
            .set_poll_interval(DeviceKind::Gamepad, Interval::Ticks(0))
            .is_err());
        assert_eq!(manager.poll_interval(DeviceKind::Gamepad), Interval::Ticks(2));
    }

    #[test]
    fn test_from_config() {
        let config = EngineConfig::default();
        let manager = InputManager::from_config(&config).unwrap();
        assert_eq!(manager.poll_interval(DeviceKind::Gamepad), Interval::Millis(15));
    }
}
