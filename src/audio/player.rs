//! Playback backend interface

use crate::assets::AudioClip;

/// Instruction for an audio backend
#[derive(Debug, Clone)]
pub enum AudioCommand {
    /// Start a track from the beginning
    Start {
        track: String,
        clip: AudioClip,
        looped: bool,
        volume: f32,
    },
    /// Stop a track
    Stop { track: String },
    /// Stop every track
    StopAll,
    /// Change the volume of a playing track
    SetVolume { track: String, volume: f32 },
}

impl AudioCommand {
    /// Track the command is for, `None` for [`AudioCommand::StopAll`]
    #[must_use]
    pub fn track(&self) -> Option<&str> {
        match self {
            Self::Start { track, .. } | Self::Stop { track } | Self::SetVolume { track, .. } => {
                Some(track)
            }
            Self::StopAll => None,
        }
    }
}

/// Something that can play audio, fed by the engine after each batch of ticks
pub trait AudioPlayer {
    /// Carry out one command
    fn apply(&mut self, command: &AudioCommand);
}

/// Backend that plays nothing and logs what it was asked to do
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

impl AudioPlayer for SilentPlayer {
    fn apply(&mut self, command: &AudioCommand) {
        log::debug!("Audio (silent): {command:?}");
    }
}
