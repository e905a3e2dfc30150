//! Tandem Asset Pipeline
//!
//! Asynchronous asset requests. Decoding runs on the rayon pool; the
//! decoded bytes are handed to the frame loop's [`UploadQueue`] so the
//! GPU-side upload happens on the main thread inside its time budget.
//!
//! Loads are never cancelled. A requested asset stays cached until
//! [`AssetServer::prune`] finds nobody outside the server holding it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tandem_core::upload::UploadQueue;
use thiserror::Error;

/// Asset handle (opaque ID)
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct AssetHandle(u64);

impl AssetHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AssetStatus {
    /// Decoding on a worker thread.
    Loading = 0,
    /// Decoded, waiting for the main thread to upload it.
    Uploading = 1,
    Ready = 2,
    Failed = 3,
}

impl AssetStatus {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => AssetStatus::Loading,
            1 => AssetStatus::Uploading,
            2 => AssetStatus::Ready,
            _ => AssetStatus::Failed,
        }
    }

    /// Ready or failed: no more work will happen for this asset.
    pub fn is_settled(self) -> bool {
        matches!(self, AssetStatus::Ready | AssetStatus::Failed)
    }
}

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("failed to upload {path}: {reason}")]
    Upload { path: PathBuf, reason: String },
}

/// CPU-side decode, run on a worker thread.
pub trait AssetLoader: Send + Sync {
    fn decode(&self, path: &Path) -> Result<Vec<u8>, AssetError>;
}

/// Backend upload of decoded bytes, run on the main thread.
pub trait GpuUploader: Send + Sync {
    fn upload(&self, handle: AssetHandle, path: &Path, bytes: Vec<u8>) -> Result<(), AssetError>;
}

/// Reads the file as-is.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl AssetLoader for FileLoader {
    fn decode(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
        std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}

struct AssetEntry {
    handle: AssetHandle,
    path: PathBuf,
    status: AtomicU8,
}

impl AssetEntry {
    fn status(&self) -> AssetStatus {
        AssetStatus::from_u8(self.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: AssetStatus) {
        self.status.store(status as u8, Ordering::Release);
    }
}

/// Shared reference to a requested asset. Poll [`status`](Self::status).
#[derive(Clone)]
pub struct AssetRef(Arc<AssetEntry>);

impl AssetRef {
    pub fn handle(&self) -> AssetHandle {
        self.0.handle
    }

    pub fn path(&self) -> &Path {
        &self.0.path
    }

    pub fn status(&self) -> AssetStatus {
        self.0.status()
    }
}

impl std::fmt::Debug for AssetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetRef")
            .field("handle", &self.0.handle)
            .field("path", &self.0.path)
            .field("status", &self.status())
            .finish()
    }
}

pub struct AssetServer {
    loader: Arc<dyn AssetLoader>,
    uploader: Arc<dyn GpuUploader>,
    uploads: Arc<UploadQueue>,
    assets: DashMap<PathBuf, Arc<AssetEntry>>,
    next_id: AtomicU64,
}

impl AssetServer {
    pub fn new(
        loader: impl AssetLoader + 'static,
        uploader: impl GpuUploader + 'static,
        uploads: Arc<UploadQueue>,
    ) -> Self {
        Self {
            loader: Arc::new(loader),
            uploader: Arc::new(uploader),
            uploads,
            assets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Request the asset at `path`, starting a load the first time.
    ///
    /// Repeated requests for the same path share one entry.
    pub fn request(&self, path: impl AsRef<Path>) -> AssetRef {
        let path = path.as_ref();
        let mut started = None;
        let entry = self
            .assets
            .entry(path.to_path_buf())
            .or_insert_with(|| {
                let entry = Arc::new(AssetEntry {
                    handle: AssetHandle(self.next_id.fetch_add(1, Ordering::Relaxed)),
                    path: path.to_path_buf(),
                    status: AtomicU8::new(AssetStatus::Loading as u8),
                });
                started = Some(entry.clone());
                entry
            })
            .clone();

        // The map shard lock is released before any work is scheduled.
        if let Some(entry) = started {
            tracing::debug!(path = %entry.path.display(), handle = entry.handle.id(), "loading asset");
            self.spawn_load(entry);
        }
        AssetRef(entry)
    }

    fn spawn_load(&self, entry: Arc<AssetEntry>) {
        let loader = self.loader.clone();
        let uploader = self.uploader.clone();
        let uploads = self.uploads.clone();
        rayon::spawn(move || {
            let bytes = match loader.decode(&entry.path) {
                Ok(bytes) => bytes,
                Err(err) => {
                    entry.set_status(AssetStatus::Failed);
                    tracing::error!(%err, "asset load failed");
                    return;
                }
            };
            entry.set_status(AssetStatus::Uploading);
            // The queued task takes the last worker-side reference.
            uploads.push(move || match uploader.upload(entry.handle, &entry.path, bytes) {
                Ok(()) => {
                    entry.set_status(AssetStatus::Ready);
                    tracing::debug!(path = %entry.path.display(), "asset ready");
                }
                Err(err) => {
                    entry.set_status(AssetStatus::Failed);
                    tracing::error!(%err, "asset upload failed");
                }
            });
        });
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<AssetRef> {
        self.assets
            .get(path.as_ref())
            .map(|entry| AssetRef(entry.value().clone()))
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Drop settled assets nobody else references. Returns how many went.
    pub fn prune(&self) -> usize {
        let before = self.assets.len();
        self.assets
            .retain(|_, entry| Arc::strong_count(entry) > 1 || !entry.status().is_settled());
        let pruned = before.saturating_sub(self.assets.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.assets.len(), "pruned assets");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::{Duration, Instant};

    struct MemoryLoader;

    impl AssetLoader for MemoryLoader {
        fn decode(&self, path: &Path) -> Result<Vec<u8>, AssetError> {
            match path.to_str() {
                Some("broken.bin") => Err(AssetError::Decode {
                    path: path.to_path_buf(),
                    reason: "bad header".into(),
                }),
                _ => Ok(vec![1, 2, 3]),
            }
        }
    }

    #[derive(Default, Clone)]
    struct RecordingUploader {
        uploaded: Arc<Mutex<Vec<(AssetHandle, usize)>>>,
    }

    impl GpuUploader for RecordingUploader {
        fn upload(&self, handle: AssetHandle, _path: &Path, bytes: Vec<u8>) -> Result<(), AssetError> {
            self.uploaded
                .lock()
                .unwrap()
                .push((handle, bytes.len()));
            Ok(())
        }
    }

    fn wait_for_uploads(uploads: &UploadQueue, pending: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while uploads.pending_len() < pending {
            assert!(Instant::now() < deadline, "timed out waiting for {pending} uploads");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    fn wait_for(asset: &AssetRef, status: AssetStatus) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while asset.status() != status {
            assert!(Instant::now() < deadline, "timed out waiting for {status:?}, at {asset:?}");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn decode_then_upload_on_drain() {
        let uploads = Arc::new(UploadQueue::new());
        let uploader = RecordingUploader::default();
        let server = AssetServer::new(MemoryLoader, uploader.clone(), uploads.clone());

        let asset = server.request("mesh.bin");
        let again = server.request("mesh.bin");
        assert_eq!(asset.handle(), again.handle());
        assert_eq!(server.len(), 1);

        wait_for_uploads(&uploads, 1);
        assert_eq!(asset.status(), AssetStatus::Uploading);
        assert_eq!(uploads.drain_all(), 1);

        assert_eq!(asset.status(), AssetStatus::Ready);
        assert_eq!(*uploader.uploaded.lock().unwrap(), vec![(asset.handle(), 3)]);
    }

    #[test]
    fn decode_failure_sets_failed_status() {
        let uploads = Arc::new(UploadQueue::new());
        let server = AssetServer::new(MemoryLoader, RecordingUploader::default(), uploads.clone());

        let asset = server.request("broken.bin");
        wait_for(&asset, AssetStatus::Failed);
        assert_eq!(uploads.pending_len(), 0);
    }

    #[test]
    fn prune_keeps_referenced_and_in_flight_assets() {
        let uploads = Arc::new(UploadQueue::new());
        let server = AssetServer::new(MemoryLoader, RecordingUploader::default(), uploads.clone());

        let kept = server.request("kept.bin");
        let dropped = server.request("dropped.bin");
        wait_for_uploads(&uploads, 2);
        uploads.drain_all();
        drop(dropped);

        assert_eq!(server.prune(), 1);
        assert!(server.get("kept.bin").is_some());
        assert!(server.get("dropped.bin").is_none());
    }

    #[test]
    fn file_loader_reports_missing_files() {
        let err = FileLoader.decode(Path::new("definitely/not/here.bin")).unwrap_err();
        assert!(matches!(err, AssetError::Io { .. }));
    }
}
