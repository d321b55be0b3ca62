//! Core engine module
//!
//! Contains the engine host, configuration, events and the window runner

mod app;
mod config;
mod engine;
mod error;
mod events;
pub mod logger;
mod rect;
mod time;

pub use app::{App, Game, WindowSource};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, EngineContext};
pub use error::EngineError;
pub(crate) use error::panic_message;
pub use events::{EventEmitter, EventSource, ListenerId};
pub use rect::Rect;
pub use time::FixedStep;
