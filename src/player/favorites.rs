//! Favorites collaborator.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;

use super::track::Track;

/// The track index's favorites set, as seen by the controller.
pub trait FavoritesIndex: Send + Sync {
    fn add_favorite(&self, track: &Track);

    fn remove_favorite(&self, track: &Track);
}

/// In-memory favorites keyed by track path.
///
/// Keeps each track's `favorite` flag in step with the set.
#[derive(Debug, Default)]
pub struct FavoriteSet {
    paths: RwLock<HashSet<PathBuf>>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, track: &Track) -> bool {
        self.paths.read().contains(track.path())
    }

    pub fn len(&self) -> usize {
        self.paths.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.read().is_empty()
    }
}

impl FavoritesIndex for FavoriteSet {
    fn add_favorite(&self, track: &Track) {
        self.paths.write().insert(track.path().to_path_buf());
        track.set_favorite(true);
    }

    fn remove_favorite(&self, track: &Track) {
        self.paths.write().remove(track.path());
        track.set_favorite(false);
    }
}
