//! Play queue management.
//!
//! [`QueueSource`] is the narrow interface the controller uses to pick the
//! next or previous track. [`PlayQueue`] is the stock implementation; share
//! it with the controller as `Arc<parking_lot::Mutex<PlayQueue>>`.

use parking_lot::Mutex;
use rand::seq::SliceRandom;

use super::track::Track;

/// Track ordering as seen by the controller.
///
/// Implementations are shared with other parts of the application and
/// provide their own synchronisation.
pub trait QueueSource: Send + Sync {
    /// Advance and return the next track, or `None` at the end.
    fn next(&self) -> Option<Track>;

    /// Step back and return the previous track, or `None` at the start.
    fn previous(&self) -> Option<Track>;

    fn shuffle(&self);

    fn unshuffle(&self);

    /// Make `track` the current position (it was just loaded).
    fn set_active(&self, track: &Track);
}

/// The play queue with current position tracking.
#[derive(Debug, Clone)]
pub struct PlayQueue {
    /// All items in the queue
    items: Vec<Track>,
    /// Current position in `items`
    position: Option<usize>,
    /// Shuffle mode enabled
    shuffle: bool,
    /// Shuffled indices (maps shuffle position → item index)
    shuffle_order: Vec<usize>,
    /// Current position in shuffle_order when shuffling
    shuffle_position: Option<usize>,
    /// Wrap around at either end
    wrap: bool,
}

impl Default for PlayQueue {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            position: None,
            shuffle: false,
            shuffle_order: Vec::new(),
            shuffle_position: None,
            wrap: true,
        }
    }
}

impl PlayQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tracks(tracks: impl IntoIterator<Item = Track>) -> Self {
        let mut queue = Self::new();
        for track in tracks {
            queue.add(track);
        }
        queue
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Add an item to the end of the queue.
    pub fn add(&mut self, track: Track) {
        let new_index = self.items.len();
        self.items.push(track);
        if !self.shuffle {
            return;
        }
        // Land somewhere after the current shuffle position
        let insert_after = self.shuffle_position.map_or(0, |p| p + 1);
        let insert_pos = if insert_after >= self.shuffle_order.len() {
            self.shuffle_order.len()
        } else {
            let mut rng = rand::rng();
            rand::Rng::random_range(&mut rng, insert_after..=self.shuffle_order.len())
        };
        self.shuffle_order.insert(insert_pos, new_index);
    }

    /// Clear the queue.
    pub fn clear(&mut self) {
        self.items.clear();
        self.position = None;
        self.shuffle_order.clear();
        self.shuffle_position = None;
    }

    pub fn items(&self) -> &[Track] {
        &self.items
    }

    /// Get current item.
    pub fn current(&self) -> Option<&Track> {
        self.position.and_then(|i| self.items.get(i))
    }

    /// Whether `skip_forward`/`previous` wrap at the ends.
    pub fn set_wrap(&mut self, wrap: bool) {
        self.wrap = wrap;
    }

    /// Advance to next track and return it.
    pub fn skip_forward(&mut self) -> Option<&Track> {
        if self.items.is_empty() {
            return None;
        }

        if self.shuffle && !self.shuffle_order.is_empty() {
            let len = self.shuffle_order.len();
            let next = self.shuffle_position.map_or(0, |p| p + 1);
            let next = if next < len {
                next
            } else if self.wrap {
                // Reshuffle for the next pass
                self.generate_shuffle_order();
                0
            } else {
                return None;
            };
            self.shuffle_position = Some(next);
            self.position = Some(self.shuffle_order[next]);
            return self.current();
        }

        let next = self.position.map_or(0, |p| p + 1);
        if next < self.items.len() {
            self.position = Some(next);
        } else if self.wrap {
            self.position = Some(0);
        } else {
            return None; // End of queue
        }
        self.current()
    }

    /// Go to previous track and return it.
    pub fn previous(&mut self) -> Option<&Track> {
        if self.items.is_empty() {
            return None;
        }

        if self.shuffle && !self.shuffle_order.is_empty() {
            let prev = match self.shuffle_position {
                Some(p) if p > 0 => p - 1,
                _ if self.wrap => self.shuffle_order.len() - 1,
                _ => return None,
            };
            self.shuffle_position = Some(prev);
            self.position = Some(self.shuffle_order[prev]);
            return self.current();
        }

        let prev = match self.position {
            Some(p) if p > 0 => p - 1,
            _ if self.wrap => self.items.len() - 1,
            _ => return None, // Start of queue
        };
        self.position = Some(prev);
        self.current()
    }

    /// Jump to a specific position.
    pub fn jump_to(&mut self, index: usize) -> Option<&Track> {
        if index >= self.items.len() {
            return None;
        }
        self.position = Some(index);
        if self.shuffle
            && let Some(shuffle_pos) = self.shuffle_order.iter().position(|&i| i == index)
        {
            self.shuffle_position = Some(shuffle_pos);
        }
        self.current()
    }

    /// Set shuffle mode.
    pub fn set_shuffle(&mut self, enabled: bool) {
        self.shuffle = enabled;
        if enabled {
            self.generate_shuffle_order();
        } else {
            self.shuffle_order.clear();
            self.shuffle_position = None;
        }
    }

    pub fn is_shuffled(&self) -> bool {
        self.shuffle
    }

    /// Generate a new shuffle order, keeping the current track first.
    fn generate_shuffle_order(&mut self) {
        let mut indices: Vec<usize> = (0..self.items.len()).collect();
        indices.shuffle(&mut rand::rng());

        self.shuffle_position = None;
        if let Some(current) = self.position
            && let Some(pos) = indices.iter().position(|&i| i == current)
        {
            indices.remove(pos);
            indices.insert(0, current);
            self.shuffle_position = Some(0);
        }

        self.shuffle_order = indices;
    }
}

impl QueueSource for Mutex<PlayQueue> {
    fn next(&self) -> Option<Track> {
        self.lock().skip_forward().cloned()
    }

    fn previous(&self) -> Option<Track> {
        self.lock().previous().cloned()
    }

    fn shuffle(&self) {
        self.lock().set_shuffle(true);
    }

    fn unshuffle(&self) {
        self.lock().set_shuffle(false);
    }

    fn set_active(&self, track: &Track) {
        let mut queue = self.lock();
        if let Some(index) = queue.items.iter().position(|t| t == track) {
            queue.jump_to(index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_queue(names: &[&str]) -> PlayQueue {
        PlayQueue::from_tracks(names.iter().map(|n| Track::from_path(format!("/music/{n}.mp3"))))
    }

    fn title(track: Option<&Track>) -> Option<String> {
        track.map(|t| t.display_title())
    }

    #[test]
    fn skip_forward_wraps_by_default() {
        let mut q = make_queue(&["a", "b"]);
        assert_eq!(title(q.skip_forward()), Some("a".into()));
        assert_eq!(title(q.skip_forward()), Some("b".into()));
        assert_eq!(title(q.skip_forward()), Some("a".into()));
    }

    #[test]
    fn no_wrap_stops_at_ends() {
        let mut q = make_queue(&["a", "b"]);
        q.set_wrap(false);
        q.skip_forward();
        q.skip_forward();
        assert!(q.skip_forward().is_none());
        assert_eq!(title(q.current()), Some("b".into()));

        assert_eq!(title(q.previous()), Some("a".into()));
        assert!(q.previous().is_none());
    }

    #[test]
    fn previous_wraps_to_end() {
        let mut q = make_queue(&["a", "b", "c"]);
        q.skip_forward();
        assert_eq!(title(q.previous()), Some("c".into()));
    }

    #[test]
    fn empty_queue_yields_nothing() {
        let mut q = PlayQueue::new();
        assert!(q.skip_forward().is_none());
        assert!(q.previous().is_none());
    }

    #[test]
    fn shuffle_keeps_current_first_and_visits_everything() {
        let mut q = make_queue(&["a", "b", "c", "d", "e"]);
        q.jump_to(2);
        q.set_shuffle(true);
        assert!(q.is_shuffled());
        assert_eq!(q.shuffle_order[0], 2);

        let mut seen = vec![q.current().cloned().unwrap()];
        for _ in 0..4 {
            seen.push(q.skip_forward().cloned().unwrap());
        }
        for track in q.items() {
            assert!(seen.contains(track), "{track:?} never played");
        }
    }

    #[test]
    fn unshuffle_returns_to_linear_order() {
        let mut q = make_queue(&["a", "b", "c"]);
        q.jump_to(0);
        q.set_shuffle(true);
        q.set_shuffle(false);
        assert_eq!(title(q.skip_forward()), Some("b".into()));
    }

    #[test]
    fn add_while_shuffled_extends_order() {
        let mut q = make_queue(&["a", "b"]);
        q.set_shuffle(true);
        q.add(Track::from_path("/music/c.mp3"));
        assert_eq!(q.shuffle_order.len(), 3);
        assert!(q.shuffle_order.contains(&2));
    }

    #[test]
    fn shared_queue_set_active_moves_position() {
        let q = Mutex::new(make_queue(&["a", "b", "c"]));
        q.set_active(&Track::from_path("/music/b.mp3"));
        assert_eq!(q.next().map(|t| t.display_title()), Some("c".into()));
        assert_eq!(q.previous().map(|t| t.display_title()), Some("b".into()));
    }

    #[test]
    fn clear_resets_position() {
        let mut q = make_queue(&["a"]);
        q.skip_forward();
        q.clear();
        assert!(q.is_empty());
        assert!(q.current().is_none());
    }
}
