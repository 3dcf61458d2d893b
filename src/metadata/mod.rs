//! Audio file metadata reading.
//!
//! Uses the lofty crate for format-independent metadata access. The
//! playback core only needs display tags and the stream duration.

use lofty::file::{AudioFile, TaggedFileExt};
use lofty::probe::Probe;
use lofty::tag::Accessor;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

/// Tags and properties read from an audio file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub track_number: Option<u32>,
    /// `None` when the container does not report a length
    pub duration: Option<Duration>,
}

/// Read tags and duration from `path`.
pub fn read(path: &Path) -> Result<TrackMetadata> {
    if !path.exists() {
        return Err(Error::not_found(path));
    }

    let tagged_file = Probe::open(path)
        .map_err(|e| Error::metadata(path, format!("failed to open for probing: {e}")))?
        .read()
        .map_err(|e| Error::metadata(path, format!("failed to read metadata: {e}")))?;

    // Get the primary tag, or fall back to the first available tag
    let tag = tagged_file
        .primary_tag()
        .or_else(|| tagged_file.first_tag());

    let duration = tagged_file.properties().duration();

    Ok(TrackMetadata {
        title: tag.and_then(|t| t.title().map(|s| s.to_string())),
        artist: tag.and_then(|t| t.artist().map(|s| s.to_string())),
        album: tag.and_then(|t| t.album().map(|s| s.to_string())),
        track_number: tag.and_then(|t| t.track()),
        duration: (!duration.is_zero()).then_some(duration),
    })
}

/// Read only the stream duration.
pub fn read_duration(path: &Path) -> Result<Option<Duration>> {
    read(path).map(|m| m.duration)
}
