//! Logical key actions, independent of any input device.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a bound key does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyAction {
    #[serde(alias = "play-pause-toggle")]
    PlayPause,
    SeekBackward,
    SeekForward,
    VolumeUp,
    VolumeDown,
}

/// Which edge of a key stroke an event reports. Held keys repeat
/// `Pressed` and end with one `Released`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEdge {
    Pressed,
    Released,
}

/// Key name → action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    bindings: BTreeMap<String, KeyAction>,
}

impl Default for Keymap {
    fn default() -> Self {
        Self::from_bindings(default_bindings())
    }
}

impl Keymap {
    /// Build from a name → action table. Names are matched case-insensitively.
    pub fn from_bindings(bindings: BTreeMap<String, KeyAction>) -> Self {
        Self {
            bindings: bindings
                .into_iter()
                .map(|(k, v)| (k.trim().to_lowercase(), v))
                .collect(),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<KeyAction> {
        self.bindings.get(&key.trim().to_lowercase()).copied()
    }

    /// Keys bound to `action`, sorted.
    pub fn keys_for(&self, action: KeyAction) -> Vec<&str> {
        self.bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.as_str())
            .collect()
    }
}

/// The stock bindings.
pub fn default_bindings() -> BTreeMap<String, KeyAction> {
    [
        ("space", KeyAction::PlayPause),
        ("pause", KeyAction::PlayPause),
        ("left", KeyAction::SeekBackward),
        ("right", KeyAction::SeekForward),
        ("up", KeyAction::VolumeUp),
        ("down", KeyAction::VolumeDown),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keymap_lookups() {
        let map = Keymap::default();
        assert_eq!(map.lookup("Space"), Some(KeyAction::PlayPause));
        assert_eq!(map.lookup(" left "), Some(KeyAction::SeekBackward));
        assert_eq!(map.lookup("f13"), None);
        assert_eq!(map.keys_for(KeyAction::PlayPause), vec!["pause", "space"]);
    }

    #[test]
    fn actions_parse_from_kebab_case() {
        let table: BTreeMap<String, KeyAction> =
            toml::from_str("j = \"seek-backward\"\nk = \"play-pause-toggle\"").unwrap();
        let map = Keymap::from_bindings(table);
        assert_eq!(map.lookup("J"), Some(KeyAction::SeekBackward));
        assert_eq!(map.lookup("k"), Some(KeyAction::PlayPause));
    }
}
