//! Named audio tracks and the requests queued for playback

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use super::{AudioCommand, AudioPlayer};
use crate::assets::{Asset, AssetType};

/// Errors from track registration and playback requests
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AudioError {
    /// Only audio assets can become tracks
    #[error("asset {id} is {actual:?}, not audio")]
    NotAudio { id: u64, actual: AssetType },
    /// No track was added under this name
    #[error("no audio track named `{0}`")]
    UnknownTrack(String),
}

struct Track {
    asset: Asset,
    volume: f32,
}

#[derive(Debug, Clone, PartialEq)]
enum Request {
    Start { track: String, looped: bool },
    Stop(String),
    StopAll,
    Volume(String),
}

impl Request {
    fn is_start_of(&self, name: &str) -> bool {
        matches!(self, Self::Start { track, .. } if track == name)
    }
}

enum Resolved {
    Send(AudioCommand),
    Wait,
    Drop,
}

/// Audio tracks keyed by name, with volume control and a request queue.
///
/// A start request waits in the queue until its asset is loaded, so a game
/// can ask for background music before the file has arrived.
pub struct AudioManager {
    tracks: FxHashMap<String, Track>,
    queue: VecDeque<Request>,
    master_volume: f32,
    muted: bool,
}

impl AudioManager {
    /// Create a manager with no tracks
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracks: FxHashMap::default(),
            queue: VecDeque::new(),
            master_volume: 1.0,
            muted: false,
        }
    }

    /// Register an audio asset under `name`, replacing any previous track
    ///
    /// # Errors
    ///
    /// Returns an error if the asset is not an audio asset
    pub fn add(&mut self, name: impl Into<String>, asset: Asset) -> Result<(), AudioError> {
        if asset.asset_type() != AssetType::Audio {
            return Err(AudioError::NotAudio {
                id: asset.id(),
                actual: asset.asset_type(),
            });
        }
        let name = name.into();
        log::debug!("Audio track `{name}` -> asset {}", asset.id());
        self.tracks.insert(name, Track { asset, volume: 1.0 });
        Ok(())
    }

    /// Remove a track, stopping it; returns its asset
    pub fn remove(&mut self, name: &str) -> Option<Asset> {
        let track = self.tracks.remove(name)?;
        self.queue.retain(|request| !request.is_start_of(name));
        self.queue.push_back(Request::Stop(name.to_string()));
        Some(track.asset)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.tracks.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Play a track once
    ///
    /// # Errors
    ///
    /// Returns an error if no track has this name
    pub fn play(&mut self, name: &str) -> Result<(), AudioError> {
        self.start(name, false)
    }

    /// Play a track on repeat
    ///
    /// # Errors
    ///
    /// Returns an error if no track has this name
    pub fn play_looped(&mut self, name: &str) -> Result<(), AudioError> {
        self.start(name, true)
    }

    /// Stop a track, cancelling a start that is still waiting for data
    ///
    /// # Errors
    ///
    /// Returns an error if no track has this name
    pub fn stop(&mut self, name: &str) -> Result<(), AudioError> {
        self.track(name)?;
        self.queue.retain(|request| !request.is_start_of(name));
        self.queue.push_back(Request::Stop(name.to_string()));
        Ok(())
    }

    /// Stop every track
    pub fn stop_all(&mut self) {
        self.queue.clear();
        self.queue.push_back(Request::StopAll);
    }

    /// Set a track's own volume, clamped at zero
    ///
    /// # Errors
    ///
    /// Returns an error if no track has this name
    pub fn set_volume(&mut self, name: &str, volume: f32) -> Result<(), AudioError> {
        let track = self
            .tracks
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownTrack(name.to_string()))?;
        track.volume = volume.max(0.0);
        self.queue.push_back(Request::Volume(name.to_string()));
        Ok(())
    }

    /// A track's own volume, before master volume and mute
    #[must_use]
    pub fn volume(&self, name: &str) -> Option<f32> {
        self.tracks.get(name).map(|track| track.volume)
    }

    /// Set the volume applied on top of every track
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.max(0.0);
        self.refresh_volumes();
    }

    #[must_use]
    pub const fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Silence every track without forgetting volumes
    pub fn mute(&mut self) {
        self.muted = true;
        self.refresh_volumes();
    }

    /// Undo [`AudioManager::mute`]
    pub fn unmute(&mut self) {
        self.muted = false;
        self.refresh_volumes();
    }

    #[must_use]
    pub const fn is_muted(&self) -> bool {
        self.muted
    }

    /// Requests not yet handed to a player
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Hand every deliverable request to `player`, in request order.
    ///
    /// Starts for tracks whose asset is not loaded yet stay queued. Returns
    /// the number of commands applied.
    pub fn flush(&mut self, player: &mut dyn AudioPlayer) -> usize {
        let mut applied = 0;
        let mut waiting = VecDeque::new();
        while let Some(request) = self.queue.pop_front() {
            match self.resolve(&request) {
                Resolved::Send(command) => {
                    player.apply(&command);
                    applied += 1;
                }
                Resolved::Wait => waiting.push_back(request),
                Resolved::Drop => {}
            }
        }
        self.queue = waiting;
        applied
    }

    fn start(&mut self, name: &str, looped: bool) -> Result<(), AudioError> {
        self.track(name)?;
        self.queue.push_back(Request::Start {
            track: name.to_string(),
            looped,
        });
        Ok(())
    }

    fn track(&self, name: &str) -> Result<&Track, AudioError> {
        self.tracks
            .get(name)
            .ok_or_else(|| AudioError::UnknownTrack(name.to_string()))
    }

    fn refresh_volumes(&mut self) {
        let mut names: Vec<String> = self.tracks.keys().cloned().collect();
        names.sort();
        self.queue.extend(names.into_iter().map(Request::Volume));
    }

    fn effective_volume(&self, track: &Track) -> f32 {
        if self.muted {
            0.0
        } else {
            track.volume * self.master_volume
        }
    }

    fn resolve(&self, request: &Request) -> Resolved {
        match request {
            Request::Start { track: name, looped } => {
                let Some(track) = self.tracks.get(name) else {
                    return Resolved::Drop;
                };
                if !track.asset.is_ready() {
                    return Resolved::Wait;
                }
                let Some(clip) = track.asset.data().and_then(|data| data.as_audio().cloned()) else {
                    log::warn!("Audio track `{name}` is loaded but holds no audio data");
                    return Resolved::Drop;
                };
                Resolved::Send(AudioCommand::Start {
                    track: name.clone(),
                    clip,
                    looped: *looped,
                    volume: self.effective_volume(track),
                })
            }
            Request::Stop(name) => Resolved::Send(AudioCommand::Stop {
                track: name.clone(),
            }),
            Request::StopAll => Resolved::Send(AudioCommand::StopAll),
            Request::Volume(name) => match self.tracks.get(name) {
                Some(track) => Resolved::Send(AudioCommand::SetVolume {
                    track: name.clone(),
                    volume: self.effective_volume(track),
                }),
                None => Resolved::Drop,
            },
        }
    }
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AudioManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioManager")
            .field("tracks", &self.tracks.len())
            .field("pending", &self.queue.len())
            .field("master_volume", &self.master_volume)
            .field("muted", &self.muted)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::assets::{AssetData, AssetState, AudioClip};

    /// Keeps every command it is given
    #[derive(Default)]
    struct Recorder {
        commands: Vec<AudioCommand>,
    }

    impl AudioPlayer for Recorder {
        fn apply(&mut self, command: &AudioCommand) {
            self.commands.push(command.clone());
        }
    }

    fn clip() -> AudioClip {
        AudioClip {
            bytes: Arc::from(vec![0u8; 8]),
            sample_rate: 44_100,
            channels: 2,
        }
    }

    fn mark_loaded(asset: &Asset) {
        asset.set_data(Some(AssetData::Audio(clip())));
        asset.set_state(AssetState::Loaded);
    }

    #[test]
    fn test_add_rejects_non_audio() {
        let mut audio = AudioManager::new();
        let image = Asset::new(AssetType::Image, "map.png");
        assert!(matches!(
            audio.add("map", image),
            Err(AudioError::NotAudio {
                actual: AssetType::Image,
                ..
            })
        ));
        assert!(audio.is_empty());
    }

    #[test]
    fn test_start_waits_for_load() {
        let mut audio = AudioManager::new();
        let music = Asset::new(AssetType::Audio, "bg.ogg");
        audio.add("bg", music.clone()).unwrap();
        audio.play_looped("bg").unwrap();

        let mut player = Recorder::default();
        assert_eq!(audio.flush(&mut player), 0);
        assert_eq!(audio.pending(), 1);

        mark_loaded(&music);
        assert_eq!(audio.flush(&mut player), 1);
        assert_eq!(audio.pending(), 0);
        assert!(matches!(
            &player.commands[0],
            AudioCommand::Start { track, looped: true, volume, clip }
                if track == "bg" && (*volume - 1.0).abs() < 1e-6 && clip.sample_rate == 44_100
        ));
    }

    #[test]
    fn test_stop_cancels_waiting_start() {
        let mut audio = AudioManager::new();
        let effect = Asset::new(AssetType::Audio, "step.wav");
        audio.add("step", effect.clone()).unwrap();
        audio.play("step").unwrap();
        audio.stop("step").unwrap();

        mark_loaded(&effect);
        let mut player = Recorder::default();
        audio.flush(&mut player);

        assert_eq!(player.commands.len(), 1);
        assert!(matches!(&player.commands[0], AudioCommand::Stop { track } if track == "step"));
    }

    #[test]
    fn test_unknown_track() {
        let mut audio = AudioManager::new();
        assert_eq!(
            audio.play("missing"),
            Err(AudioError::UnknownTrack("missing".to_string()))
        );
        assert!(audio.stop("missing").is_err());
        assert!(audio.set_volume("missing", 0.5).is_err());
        assert_eq!(audio.pending(), 0);
    }

    #[test]
    fn test_volume_and_mute() {
        let mut audio = AudioManager::new();
        let music = Asset::new(AssetType::Audio, "bg.ogg");
        mark_loaded(&music);
        audio.add("bg", music).unwrap();

        audio.set_master_volume(0.5);
        audio.set_volume("bg", 0.5).unwrap();
        audio.play("bg").unwrap();
        audio.mute();

        let mut player = Recorder::default();
        audio.flush(&mut player);

        let volumes: Vec<f32> = player
            .commands
            .iter()
            .map(|command| match command {
                AudioCommand::Start { volume, .. } | AudioCommand::SetVolume { volume, .. } => {
                    *volume
                }
                _ => -1.0,
            })
            .collect();
        // Volumes are resolved when flushed, so the mute applies to all of them
        assert_eq!(volumes, vec![0.0, 0.0, 0.0, 0.0]);

        audio.unmute();
        player.commands.clear();
        audio.flush(&mut player);
        assert!(matches!(
            &player.commands[..],
            [AudioCommand::SetVolume { volume, .. }] if (*volume - 0.25).abs() < 1e-6
        ));
        assert_eq!(audio.volume("bg"), Some(0.5));
    }

    #[test]
    fn test_remove_stops_track() {
        let mut audio = AudioManager::new();
        audio
            .add("bg", Asset::new(AssetType::Audio, "bg.ogg"))
            .unwrap();
        audio.play_looped("bg").unwrap();
        assert!(audio.remove("bg").is_some());
        assert!(!audio.contains("bg"));

        let mut player = Recorder::default();
        audio.flush(&mut player);
        assert_eq!(player.commands.len(), 1);
        assert_eq!(player.commands[0].track(), Some("bg"));
    }
}
