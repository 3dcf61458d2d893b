//! Playable track handle.
//!
//! A [`Track`] is a cheap, clonable handle. Clones share the cached duration
//! and favorite flag, so when the backend reports a duration every view
//! holding the same track sees it.

use parking_lot::RwLock;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::error::Result;
use crate::metadata::{self, TrackMetadata};

/// Track metadata for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
}

impl TrackInfo {
    /// Get display artist.
    pub fn display_artist(&self) -> &str {
        self.artist.as_deref().unwrap_or("Unknown Artist")
    }

    /// Get display album.
    pub fn display_album(&self) -> &str {
        self.album.as_deref().unwrap_or("Unknown Album")
    }
}

impl From<TrackMetadata> for TrackInfo {
    fn from(meta: TrackMetadata) -> Self {
        Self {
            title: meta.title,
            artist: meta.artist,
            album: meta.album,
            track_number: meta.track_number,
        }
    }
}

struct TrackInner {
    path: PathBuf,
    info: TrackInfo,
    duration: RwLock<Option<Duration>>,
    favorite: AtomicBool,
}

/// A playable item, identified by its path.
#[derive(Clone)]
pub struct Track {
    inner: Arc<TrackInner>,
}

impl Track {
    /// Create a track with unknown duration.
    pub fn new(path: impl Into<PathBuf>, info: TrackInfo) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                path: path.into(),
                info,
                duration: RwLock::new(None),
                favorite: AtomicBool::new(false),
            }),
        }
    }

    /// Create a track with no tags.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::new(path, TrackInfo::default())
    }

    /// Read tags and duration from the file.
    pub fn probe(path: &Path) -> Result<Self> {
        let meta = metadata::read(path)?;
        let duration = meta.duration;
        let track = Self::new(path, meta.into());
        if let Some(d) = duration {
            track.set_duration(d);
        }
        Ok(track)
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    pub fn info(&self) -> &TrackInfo {
        &self.inner.info
    }

    /// Get the display title (filename if no title tag).
    pub fn display_title(&self) -> String {
        self.inner.info.title.clone().unwrap_or_else(|| {
            self.inner
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| "Unknown".to_string())
        })
    }

    /// Cached duration; `None` until known.
    pub fn duration(&self) -> Option<Duration> {
        *self.inner.duration.read()
    }

    /// Update the cached duration. Returns true if the value changed.
    pub fn set_duration(&self, duration: Duration) -> bool {
        let mut slot = self.inner.duration.write();
        if *slot == Some(duration) {
            return false;
        }
        *slot = Some(duration);
        true
    }

    pub fn is_favorite(&self) -> bool {
        self.inner.favorite.load(Ordering::Acquire)
    }

    pub fn set_favorite(&self, favorite: bool) {
        self.inner.favorite.store(favorite, Ordering::Release);
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.inner.path == other.inner.path
    }
}

impl Eq for Track {}

impl fmt::Debug for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Track")
            .field("path", &self.inner.path)
            .field("title", &self.inner.info.title)
            .field("duration", &self.duration())
            .field("favorite", &self.is_favorite())
            .finish()
    }
}
