//! Polled input devices
//!
//! A device keeps the last value of every element it has seen. On each poll
//! it compares a fresh [`Reading`] against that state and emits one event per
//! changed element, in the order the reading lists them.

use std::fmt;
use std::time::Duration;

use glam::Vec2;
use rustc_hash::FxHashMap;
use winit::event::MouseButton;
use winit::keyboard::KeyCode;

use super::{Axis2, DeviceSlot, InputElement, InputEvent, InputSource, Reading};
use crate::core::{EventEmitter, EventSource, ListenerId};
use crate::logic::{Interval, LogicError};

/// Identity of one device instance; a re-plugged device gets a new id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub(crate) u64);

impl DeviceId {
    /// Raw id value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

/// One connected keyboard, pointer or gamepad
pub struct InputDevice {
    id: DeviceId,
    slot: DeviceSlot,
    values: FxHashMap<InputElement, f32>,
    tick_length: Duration,
    poll_interval: Interval,
    period: u32,
    elapsed: u32,
    connected: bool,
    events: EventEmitter<InputEvent>,
}

impl InputDevice {
    /// Create a device whose state starts at `initial`.
    ///
    /// The initial reading is stored without emitting events.
    ///
    /// # Errors
    ///
    /// Returns an error if the poll interval is zero ticks
    pub fn new(
        id: DeviceId,
        slot: DeviceSlot,
        initial: &Reading,
        poll_interval: Interval,
        tick_length: Duration,
    ) -> Result<Self, LogicError> {
        let period = poll_interval.to_ticks(tick_length)?;
        let values = initial
            .iter()
            .filter(|(element, _)| !element.is_relative())
            .collect();

        Ok(Self {
            id,
            slot,
            values,
            tick_length,
            poll_interval,
            period,
            elapsed: 0,
            connected: true,
            events: EventEmitter::new(),
        })
    }

    #[must_use]
    pub const fn id(&self) -> DeviceId {
        self.id
    }

    /// Where this device lives in its source
    #[must_use]
    pub const fn slot(&self) -> DeviceSlot {
        self.slot
    }

    /// False once the device has disconnected
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connected
    }

    #[must_use]
    pub const fn poll_interval(&self) -> Interval {
        self.poll_interval
    }

    /// Change the poll rate; the next poll happens one full interval later
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero ticks
    pub fn set_poll_interval(&mut self, interval: Interval) -> Result<(), LogicError> {
        self.period = interval.to_ticks(self.tick_length)?;
        self.poll_interval = interval;
        self.elapsed = 0;
        Ok(())
    }

    /// Last known value of an element, zero if never seen
    #[must_use]
    pub fn value(&self, element: InputElement) -> f32 {
        self.values.get(&element).copied().unwrap_or(0.0)
    }

    /// Gamepad axis value
    #[must_use]
    pub fn axis(&self, index: u32) -> f32 {
        self.value(InputElement::Axis(index))
    }

    /// Gamepad button value
    #[must_use]
    pub fn button(&self, index: u32) -> f32 {
        self.value(InputElement::Button(index))
    }

    /// Check if a key is held
    #[must_use]
    pub fn is_key_down(&self, key: KeyCode) -> bool {
        self.value(InputElement::Key(key)) >= 0.5
    }

    /// Check if a mouse button is held
    #[must_use]
    pub fn is_mouse_button_down(&self, button: MouseButton) -> bool {
        self.value(InputElement::MouseButton(button)) >= 0.5
    }

    /// Pointer position in canvas pixels
    #[must_use]
    pub fn cursor(&self) -> Vec2 {
        Vec2::new(
            self.value(InputElement::Cursor(Axis2::X)),
            self.value(InputElement::Cursor(Axis2::Y)),
        )
    }

    /// Listen for this device's events
    pub fn on_event(&self, listener: impl Fn(&InputEvent) + 'static) -> ListenerId {
        self.events.subscribe(listener)
    }

    /// Count one engine tick and poll when the interval is up.
    ///
    /// Returns the number of events emitted.
    pub fn tick(&mut self, source: &dyn InputSource) -> usize {
        if !self.connected {
            return 0;
        }
        self.elapsed += 1;
        if self.elapsed < self.period {
            return 0;
        }
        self.elapsed = 0;
        self.poll(source)
    }

    /// Read the source now; a device that cannot be read is disconnected
    pub fn poll(&mut self, source: &dyn InputSource) -> usize {
        if !self.connected {
            return 0;
        }
        match source.read(self.slot) {
            Some(reading) => self.apply(&reading),
            None => {
                self.disconnect();
                0
            }
        }
    }

    /// Diff a reading against the stored state and emit changes.
    ///
    /// Elements missing from the reading keep their value. Returns the number
    /// of events emitted.
    pub fn apply(&mut self, reading: &Reading) -> usize {
        if !self.connected {
            return 0;
        }

        let mut emitted = 0;
        for (element, value) in reading.iter() {
            if element.is_relative() {
                if value != 0.0 {
                    self.events.emit(&InputEvent::changed(element, value));
                    emitted += 1;
                }
                continue;
            }

            let previous = self.value(element);
            if same_value(previous, value) {
                continue;
            }
            self.values.insert(element, value);
            self.events.emit(&InputEvent::changed(element, value));
            emitted += 1;
        }
        emitted
    }

    /// Stop polling and emit [`InputEvent::Disconnect`].
    ///
    /// Safe to call more than once; only the first call emits.
    pub fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;
        log::info!("Input {} ({:?}) disconnected", self.id, self.slot);
        self.events.emit(&InputEvent::Disconnect);
    }
}

impl EventSource for InputDevice {
    type Event = InputEvent;

    fn events(&self) -> &EventEmitter<InputEvent> {
        &self.events
    }
}

impl fmt::Debug for InputDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDevice")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("poll_interval", &self.poll_interval)
            .field("connected", &self.connected)
            .field("elements", &self.values.len())
            .finish()
    }
}

fn same_value(a: f32, b: f32) -> bool {
    a == b || (a.is_nan() && b.is_nan())
}
