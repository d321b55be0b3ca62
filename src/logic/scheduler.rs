//! Named periodic callbacks driven by the engine tick

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use crate::core::{EventEmitter, EventSource, FixedStep, ListenerId, panic_message};

/// Time between two runs of a logic entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Interval {
    /// Every `n` ticks
    Ticks(u32),
    /// Every `ms` milliseconds, rounded up to whole ticks
    Millis(u64),
}

impl Interval {
    /// Run on every tick
    pub const EVERY_TICK: Self = Self::Ticks(1);

    /// Number of ticks between runs for a given tick length
    ///
    /// # Errors
    ///
    /// Returns [`LogicError::InvalidInterval`] for `Ticks(0)`
    pub fn to_ticks(self, tick: Duration) -> Result<u32, LogicError> {
        match self {
            Self::Ticks(0) => Err(LogicError::InvalidInterval(self)),
            Self::Ticks(n) => Ok(n),
            Self::Millis(ms) => Ok(FixedStep::ticks_for(Duration::from_millis(ms), tick)),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ticks(n) => write!(f, "{n} ticks"),
            Self::Millis(ms) => write!(f, "{ms} ms"),
        }
    }
}

/// Errors from registering logic
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LogicError {
    #[error("logic `{0}` is already registered")]
    DuplicateName(String),
    #[error("no logic named `{0}`")]
    UnknownName(String),
    #[error("interval {0} never fires")]
    InvalidInterval(Interval),
}

/// A logic callback that returned an error or panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicFailure {
    pub name: String,
    pub tick: u64,
    pub message: String,
}

/// What happened during one scheduler tick
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tick number, starting at 1
    pub tick: u64,
    /// Names of the entries that ran, in run order
    pub fired: Vec<String>,
    pub failures: Vec<LogicFailure>,
}

impl TickReport {
    /// Check if every entry that ran succeeded
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

type LogicFn<C> = Box<dyn FnMut(&mut C) -> anyhow::Result<()>>;

struct LogicEntry<C> {
    name: String,
    interval: Interval,
    period: u32,
    elapsed: u32,
    runs: u64,
    callback: LogicFn<C>,
}

/// Runs named callbacks at independent intervals.
///
/// Entries run in registration order on each tick where their interval has
/// elapsed. A callback that fails or panics is reported and does not stop
/// the entries after it.
pub struct LogicScheduler<C> {
    entries: Vec<LogicEntry<C>>,
    tick_length: Duration,
    tick: u64,
    failures: EventEmitter<LogicFailure>,
}

impl<C> LogicScheduler<C> {
    /// Create a scheduler for a tick length
    #[must_use]
    pub fn new(tick_length: Duration) -> Self {
        Self {
            entries: Vec::new(),
            tick_length: tick_length.max(Duration::from_millis(1)),
            tick: 0,
            failures: EventEmitter::new(),
        }
    }

    /// Register a callback under a unique name
    ///
    /// # Errors
    ///
    /// Returns an error if the name is taken or the interval is zero ticks
    pub fn add_logic<F>(
        &mut self,
        name: impl Into<String>,
        interval: Interval,
        callback: F,
    ) -> Result<(), LogicError>
    where
        F: FnMut(&mut C) -> anyhow::Result<()> + 'static,
    {
        let name = name.into();
        if self.contains(&name) {
            return Err(LogicError::DuplicateName(name));
        }
        let period = interval.to_ticks(self.tick_length)?;

        log::debug!("Registered logic `{name}` every {interval}");
        self.entries.push(LogicEntry {
            name,
            interval,
            period,
            elapsed: 0,
            runs: 0,
            callback: Box::new(callback),
        });
        Ok(())
    }

    /// Unregister a callback; returns whether it was present
    pub fn remove_logic(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.name != name);
        let removed = self.entries.len() != before;
        if removed {
            log::debug!("Removed logic `{name}`");
        }
        removed
    }

    /// Change how often an entry runs, restarting its countdown
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown or the interval is zero ticks
    pub fn set_interval(&mut self, name: &str, interval: Interval) -> Result<(), LogicError> {
        let period = interval.to_ticks(self.tick_length)?;
        let entry = self
            .entries
            .iter_mut()
            .find(|entry| entry.name == name)
            .ok_or_else(|| LogicError::UnknownName(name.to_string()))?;
        entry.interval = interval;
        entry.period = period;
        entry.elapsed = 0;
        Ok(())
    }

    /// Interval of an entry
    #[must_use]
    pub fn interval(&self, name: &str) -> Option<Interval> {
        self.entry(name).map(|entry| entry.interval)
    }

    /// How many times an entry has run
    #[must_use]
    pub fn runs(&self, name: &str) -> Option<u64> {
        self.entry(name).map(|entry| entry.runs)
    }

    /// Check if an entry is registered
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entry(name).is_some()
    }

    /// Registered names in run order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.name.as_str())
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no entries are registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ticks run so far
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Length of one tick
    #[must_use]
    pub const fn tick_length(&self) -> Duration {
        self.tick_length
    }

    /// Listen for callback failures
    pub fn on_failure(&self, listener: impl Fn(&LogicFailure) + 'static) -> ListenerId {
        self.failures.subscribe(listener)
    }

    /// Advance one tick, running every entry that is due
    pub fn tick(&mut self, context: &mut C) -> TickReport {
        self.tick += 1;
        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };

        for entry in &mut self.entries {
            entry.elapsed += 1;
            if entry.elapsed < entry.period {
                continue;
            }
            entry.elapsed = 0;
            entry.runs += 1;
            report.fired.push(entry.name.clone());

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(context)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
            };

            log::warn!("Logic `{}` failed on tick {}: {message}", entry.name, self.tick);
            let failure = LogicFailure {
                name: entry.name.clone(),
                tick: self.tick,
                message,
            };
            self.failures.emit(&failure);
            report.failures.push(failure);
        }

        report
    }

    fn entry(&self, name: &str) -> Option<&LogicEntry<C>> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

impl<C> EventSource for LogicScheduler<C> {
    type Event = LogicFailure;

    fn events(&self) -> &EventEmitter<LogicFailure> {
        &self.failures
    }
}

impl<C> fmt::Debug for LogicScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogicScheduler")
            .field("entries", &self.names().collect::<Vec<_>>())
            .field("tick_length", &self.tick_length)
            .field("tick", &self.tick)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    const TICK: Duration = Duration::from_millis(16);

    #[test]
    fn test_independent_intervals() {
        let mut scheduler = LogicScheduler::<Vec<&'static str>>::new(TICK);
        scheduler
            .add_logic("a", Interval::Ticks(1), |log| {
                log.push("a");
                Ok(())
            })
            .unwrap();
        scheduler
            .add_logic("b", Interval::Ticks(50), |log| {
                log.push("b");
                Ok(())
            })
            .unwrap();

        let mut log = Vec::new();
        for _ in 0..50 {
            scheduler.tick(&mut log);
        }

        assert_eq!(log.iter().filter(|&&n| n == "a").count(), 50);
        assert_eq!(log.iter().filter(|&&n| n == "b").count(), 1);
        // b ran on tick 50, after a
        assert_eq!(&log[log.len() - 2..], &["a", "b"]);
        assert_eq!(scheduler.runs("a"), Some(50));
        assert_eq!(scheduler.runs("b"), Some(1));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut scheduler = LogicScheduler::<()>::new(TICK);
        scheduler.add_logic("move", Interval::EVERY_TICK, |_| Ok(())).unwrap();
        assert_eq!(
            scheduler.add_logic("move", Interval::Ticks(2), |_| Ok(())),
            Err(LogicError::DuplicateName("move".into()))
        );
        assert_eq!(scheduler.interval("move"), Some(Interval::EVERY_TICK));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut scheduler = LogicScheduler::<()>::new(TICK);
        assert_eq!(
            scheduler.add_logic("never", Interval::Ticks(0), |_| Ok(())),
            Err(LogicError::InvalidInterval(Interval::Ticks(0)))
        );
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_millis_round_up() {
        assert_eq!(Interval::Millis(100).to_ticks(TICK), Ok(7));
        assert_eq!(Interval::Millis(16).to_ticks(TICK), Ok(1));
        assert_eq!(Interval::Millis(0).to_ticks(TICK), Ok(1));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut scheduler = LogicScheduler::<u32>::new(TICK);
        scheduler
            .add_logic("count", Interval::EVERY_TICK, |n| {
                *n += 1;
                Ok(())
            })
            .unwrap();

        let mut count = 0;
        scheduler.tick(&mut count);
        assert!(scheduler.remove_logic("count"));
        assert!(!scheduler.remove_logic("count"));
        scheduler.tick(&mut count);
        assert_eq!(count, 1);
    }

    #[test]
    fn test_add_keeps_other_schedules() {
        let mut scheduler = LogicScheduler::<Vec<u64>>::new(TICK);
        scheduler
            .add_logic("slow", Interval::Ticks(3), |log| {
                log.push(0);
                Ok(())
            })
            .unwrap();

        let mut log = Vec::new();
        scheduler.tick(&mut log);
        scheduler.tick(&mut log);
        scheduler.add_logic("late", Interval::Ticks(3), |_| Ok(())).unwrap();
        let report = scheduler.tick(&mut log);

        assert_eq!(report.fired, vec!["slow".to_string()]);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_failures_are_isolated() {
        let mut scheduler = LogicScheduler::<Vec<&'static str>>::new(TICK);
        scheduler
            .add_logic("error", Interval::EVERY_TICK, |_| anyhow::bail!("blocked"))
            .unwrap();
        scheduler
            .add_logic("panic", Interval::EVERY_TICK, |_| panic!("boom"))
            .unwrap();
        scheduler
            .add_logic("after", Interval::EVERY_TICK, |log| {
                log.push("after");
                Ok(())
            })
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        scheduler.on_failure(move |failure| sink.borrow_mut().push(failure.name.clone()));

        let mut log = Vec::new();
        let report = scheduler.tick(&mut log);

        assert_eq!(log, vec!["after"]);
        assert_eq!(report.fired.len(), 3);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].message, "blocked");
        assert!(report.failures[1].message.contains("boom"));
        assert_eq!(*seen.borrow(), vec!["error".to_string(), "panic".to_string()]);
    }

    #[test]
    fn test_set_interval() {
        let mut scheduler = LogicScheduler::<u32>::new(TICK);
        scheduler
            .add_logic("count", Interval::Ticks(10), |n| {
                *n += 1;
                Ok(())
            })
            .unwrap();
        scheduler.set_interval("count", Interval::Ticks(2)).unwrap();
        assert!(matches!(
            scheduler.set_interval("missing", Interval::Ticks(2)),
            Err(LogicError::UnknownName(_))
        ));

        let mut count = 0;
        for _ in 0..4 {
            scheduler.tick(&mut count);
        }
        assert_eq!(count, 2);
    }
}
