//! Load strategies and the completion queue
//!
//! A [`LoadStrategy`] decides how an asset gets its data. The shipped
//! [`FileLoadStrategy`] reads and decodes on a worker thread; the result comes
//! back through a [`LoadQueue`], which the engine pumps once per tick so data
//! and state changes always happen on the engine thread.

use std::cell::RefCell;
use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::{Asset, AssetData, AssetError, AssetState, AssetType, AudioClip};
use crate::core::panic_message;

/// Procedure that fetches and decodes data for an asset.
///
/// Implementations eventually call `set_data` and `set_state` on the asset,
/// or `fail_load` when something goes wrong. They must not block.
pub trait LoadStrategy {
    /// Begin loading `asset`
    fn load(&self, asset: &Asset);
}

impl<F: Fn(&Asset)> LoadStrategy for F {
    fn load(&self, asset: &Asset) {
        self(asset);
    }
}

struct Completion {
    job: u64,
    result: Result<AssetData, AssetError>,
}

struct PendingLoad {
    asset: Asset,
    locator: String,
    generation: u64,
}

#[derive(Default)]
struct QueueState {
    pending: FxHashMap<u64, PendingLoad>,
    next_job: u64,
}

/// Collects results from load workers and applies them on the engine thread.
///
/// Cloning shares the same queue.
#[derive(Clone)]
pub struct LoadQueue {
    sender: Sender<Completion>,
    receiver: Rc<Receiver<Completion>>,
    state: Rc<RefCell<QueueState>>,
}

impl LoadQueue {
    /// Create an empty queue
    #[must_use]
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            sender,
            receiver: Rc::new(receiver),
            state: Rc::new(RefCell::new(QueueState::default())),
        }
    }

    /// Run `work` on a worker thread for `asset`.
    ///
    /// The asset moves to `Loading` immediately. Its data and final state are
    /// set by a later [`LoadQueue::pump`]. A panic in `work` is reported as
    /// [`AssetError::Worker`].
    pub fn submit<F>(&self, asset: &Asset, work: F)
    where
        F: FnOnce() -> Result<AssetData, AssetError> + Send + 'static,
    {
        let job = {
            let mut state = self.state.borrow_mut();
            let job = state.next_job;
            state.next_job += 1;
            state.pending.insert(
                job,
                PendingLoad {
                    asset: asset.clone(),
                    locator: asset.source(),
                    generation: asset.generation(),
                },
            );
            job
        };

        asset.set_state(AssetState::Loading);

        let sender = self.sender.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-load-{job}"))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(work)).unwrap_or_else(|payload| {
                    Err(AssetError::Worker(format!(
                        "panicked: {}",
                        panic_message(payload.as_ref())
                    )))
                });
                // The queue may be gone if the engine shut down mid-load
                let _ = sender.send(Completion { job, result });
            });

        if let Err(e) = spawned {
            self.state.borrow_mut().pending.remove(&job);
            asset.fail_load(AssetError::Worker(e.to_string()));
        }
    }

    /// Apply every completed load. Returns how many results were applied.
    ///
    /// Results for an asset whose source changed while loading are discarded,
    /// even if the source was later set back to the same locator.
    pub fn pump(&self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.receiver.try_recv() {
            if self.deliver(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Block until every pending load has been applied or `timeout` passes.
    ///
    /// Returns how many results were applied. The engine never calls this;
    /// it exists for tools and tests that need loaded data up front.
    pub fn block_until_idle(&self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        let mut applied = self.pump();

        while self.pending_count() > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(completion) => {
                    if self.deliver(completion) {
                        applied += 1;
                    }
                }
                Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => break,
            }
        }

        applied
    }

    /// Number of loads still in flight
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    fn deliver(&self, completion: Completion) -> bool {
        let Some(pending) = self.state.borrow_mut().pending.remove(&completion.job) else {
            return false;
        };

        let asset = pending.asset;
        if asset.generation() != pending.generation {
            log::debug!(
                "Discarding stale load of '{}' for asset {}",
                pending.locator,
                asset.id()
            );
            return false;
        }

        match completion.result {
            Ok(data) => {
                asset.set_data(Some(data));
                asset.set_state(AssetState::Loaded);
                log::debug!("Loaded asset {} from '{}'", asset.id(), pending.locator);
            }
            Err(error) => asset.fail_load(error),
        }
        true
    }
}

impl Default for LoadQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LoadQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadQueue")
            .field("pending", &self.pending_count())
            .finish()
    }
}

/// Reads an asset's source from disk and decodes it as its declared type.
#[derive(Debug, Clone)]
pub struct FileLoadStrategy {
    /// Directory sources are resolved against
    root: PathBuf,
    /// Where completions are delivered
    queue: LoadQueue,
}

impl FileLoadStrategy {
    /// Create a strategy rooted at `root`
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, queue: LoadQueue) -> Self {
        Self {
            root: root.into(),
            queue,
        }
    }

    /// Directory sources are resolved against
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl LoadStrategy for FileLoadStrategy {
    fn load(&self, asset: &Asset) {
        if asset.state() == AssetState::Loading {
            log::debug!("Asset {} is already loading", asset.id());
            return;
        }

        let locator = asset.source();
        let path = self.root.join(&locator);
        let asset_type = asset.asset_type();

        self.queue.submit(asset, move || {
            let bytes = std::fs::read(&path).map_err(|e| AssetError::Io {
                path: path.clone(),
                message: e.to_string(),
            })?;
            decode(asset_type, bytes).map_err(|message| AssetError::Decode {
                locator,
                asset_type,
                message,
            })
        });
    }
}

/// Decode raw bytes as the given asset type
///
/// # Errors
///
/// Returns a description of the decoding failure
pub fn decode(asset_type: AssetType, bytes: Vec<u8>) -> Result<AssetData, String> {
    match asset_type {
        AssetType::Image => decode_image(&bytes),
        AssetType::Audio => decode_audio(bytes),
        AssetType::Text => String::from_utf8(bytes)
            .map(AssetData::Text)
            .map_err(|e| e.to_string()),
        AssetType::Binary => Ok(AssetData::Binary(bytes)),
    }
}

fn decode_image(bytes: &[u8]) -> Result<AssetData, String> {
    let image = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    Ok(AssetData::Image(image.to_rgba8()))
}

fn decode_audio(bytes: Vec<u8>) -> Result<AssetData, String> {
    use rodio::Source;

    let bytes: Arc<[u8]> = Arc::from(bytes);
    let decoder = rodio::Decoder::new(Cursor::new(Arc::clone(&bytes))).map_err(|e| e.to_string())?;

    Ok(AssetData::Audio(AudioClip {
        sample_rate: u32::from(decoder.sample_rate()),
        channels: u16::from(decoder.channels()),
        bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    const WAIT: Duration = Duration::from_secs(5);

    fn write_png(path: &Path, width: u32, height: u32) {
        let image = image::RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        image.save(path).unwrap();
    }

    #[test]
    fn test_text_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("hello.txt"), "hello world").unwrap();

        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Text, "hello.txt");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));

        asset.load().unwrap();
        assert_eq!(asset.state(), AssetState::Loading);

        assert_eq!(queue.block_until_idle(WAIT), 1);
        assert!(asset.is_ready());
        assert_eq!(asset.data().unwrap().as_text(), Some("hello world"));
    }

    #[test]
    fn test_image_file_loads() {
        let dir = tempfile::tempdir().unwrap();
        write_png(&dir.path().join("tiles.png"), 4, 2);

        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Image, "tiles.png");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));
        asset.load().unwrap();
        queue.block_until_idle(WAIT);

        assert!(asset.is_ready());
        assert_eq!(asset.data().unwrap().dimensions(), Some((4, 2)));
    }

    #[test]
    fn test_missing_file_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Image, "nope.png");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));

        let failed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&failed);
        asset.on_error(move |error| {
            assert!(matches!(error, AssetError::Io { .. }));
            flag.set(true);
        });

        asset.load().unwrap();
        queue.block_until_idle(WAIT);

        assert!(failed.get());
        assert_eq!(asset.state(), AssetState::NotLoaded);
        assert!(asset.data().is_none());
    }

    #[test]
    fn test_bad_image_bytes_fail_decode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.png"), b"not a png").unwrap();

        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Image, "broken.png");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));

        let decode_failed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&decode_failed);
        asset.on_error(move |error| flag.set(matches!(error, AssetError::Decode { .. })));

        asset.load().unwrap();
        queue.block_until_idle(WAIT);
        assert!(decode_failed.get());
        assert!(!asset.is_ready());
    }

    #[test]
    fn test_stale_result_discarded() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.txt"), "first").unwrap();

        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Text, "first.txt");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));
        asset.load().unwrap();

        // Source changes before the worker result is applied
        asset.set_source("second.txt");
        queue.block_until_idle(WAIT);

        assert_eq!(queue.pending_count(), 0);
        assert_eq!(asset.state(), AssetState::NotLoaded);
        assert!(asset.data().is_none());
    }

    #[test]
    fn test_source_round_trip_discards_old_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("first.txt"), "first").unwrap();

        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Text, "first.txt");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));
        asset.load().unwrap();

        // Same locator again, but the in-flight job belongs to the old one
        asset.set_source("elsewhere.txt");
        asset.set_source("first.txt");
        queue.block_until_idle(WAIT);

        assert_eq!(queue.pending_count(), 0);
        assert_eq!(asset.state(), AssetState::NotLoaded);
        assert!(asset.data().is_none());
    }

    #[test]
    fn test_worker_panic_fails_load() {
        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Binary, "crash.bin");

        let reported = Rc::new(Cell::new(false));
        let flag = Rc::clone(&reported);
        asset.on_error(move |error| flag.set(matches!(error, AssetError::Worker(_))));

        queue.submit(&asset, || panic!("decoder blew up"));
        assert_eq!(queue.block_until_idle(WAIT), 1);

        assert!(reported.get());
        assert_eq!(queue.pending_count(), 0);
        assert_eq!(asset.state(), AssetState::NotLoaded);

        // A failed load can be retried
        queue.submit(&asset, || Ok(AssetData::Binary(vec![7])));
        queue.block_until_idle(WAIT);
        assert!(asset.is_ready());
    }

    #[test]
    fn test_pump_without_results() {
        let queue = LoadQueue::new();
        assert_eq!(queue.pump(), 0);
        assert_eq!(queue.pending_count(), 0);
    }

    #[test]
    fn test_reload_after_failure() {
        let dir = tempfile::tempdir().unwrap();
        let queue = LoadQueue::new();
        let asset = Asset::new(AssetType::Text, "late.txt");
        asset.set_load_strategy(Rc::new(FileLoadStrategy::new(dir.path(), queue.clone())));

        asset.load().unwrap();
        queue.block_until_idle(WAIT);
        assert_eq!(asset.state(), AssetState::NotLoaded);

        std::fs::write(dir.path().join("late.txt"), "arrived").unwrap();
        asset.load().unwrap();
        queue.block_until_idle(WAIT);
        assert!(asset.is_ready());
    }

    #[test]
    fn test_decode_binary_and_text() {
        let data = decode(AssetType::Binary, vec![0, 1, 2]).unwrap();
        assert!(matches!(data, AssetData::Binary(ref b) if b.len() == 3));

        assert!(decode(AssetType::Text, vec![0xff, 0xfe]).is_err());
        assert!(decode(AssetType::Audio, b"garbage".to_vec()).is_err());
    }
}
