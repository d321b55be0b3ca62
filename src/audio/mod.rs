//! Audio playback collaborator
//!
//! Game code names audio assets as tracks and asks for them to be played,
//! looped or stopped. The engine queues those requests until each track's
//! asset is loaded, then hands them to an [`AudioPlayer`] backend. Mixing and
//! output are the backend's job.

mod manager;
mod player;

pub use manager::{AudioError, AudioManager};
pub use player::{AudioCommand, AudioPlayer, SilentPlayer};
