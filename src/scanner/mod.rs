use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions recognised as audio (compared case-insensitively).
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "ogg", "wav", "m4a"];

/// True if `path` has an audio file extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Scans the given root directory recursively for audio files.
///
/// Supported extensions: mp3, flac, ogg, wav, m4a (case-insensitive).
/// Unreadable entries are skipped. Results are sorted by path.
pub fn scan(root: &Path) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file() && is_audio_file(entry.path()))
        .map(|entry| entry.into_path())
        .collect();
    paths.sort();
    tracing::debug!("Found {} audio files under {:?}", paths.len(), root);
    paths
}

/// Expand each input into audio files: directories are scanned, files are
/// kept as given when they look like audio.
pub fn expand(inputs: &[PathBuf]) -> Vec<PathBuf> {
    inputs
        .iter()
        .flat_map(|input| {
            if input.is_dir() {
                scan(input)
            } else if is_audio_file(input) {
                vec![input.clone()]
            } else {
                tracing::warn!("Ignoring non-audio path {:?}", input);
                Vec::new()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::tempdir;

    #[test]
    fn test_scan_audio_files() {
        let dir = tempdir().unwrap();
        let root = dir.path();

        // Create dummy files in root
        File::create(root.join("song.mp3")).unwrap();
        File::create(root.join("music.flac")).unwrap();
        File::create(root.join("notes.txt")).unwrap(); // Should be ignored
        File::create(root.join("image.png")).unwrap(); // Should be ignored
        File::create(root.join("UPPERCASE.OGG")).unwrap(); // Should be found (case-insensitive)

        // Create subdirectory
        let subdir = root.join("subdir");
        std::fs::create_dir(&subdir).unwrap();
        File::create(subdir.join("track.wav")).unwrap();
        File::create(subdir.join("ignore.doc")).unwrap(); // Should be ignored

        let paths = scan(root);

        assert_eq!(paths.len(), 4);

        let file_names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(|s| s.to_string()))
            .collect();

        assert!(file_names.contains(&"song.mp3".to_string()));
        assert!(file_names.contains(&"music.flac".to_string()));
        assert!(file_names.contains(&"track.wav".to_string()));
        assert!(file_names.contains(&"UPPERCASE.OGG".to_string()));

        assert!(!file_names.contains(&"notes.txt".to_string()));
        assert!(!file_names.contains(&"image.png".to_string()));

        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);
    }

    #[test]
    fn test_expand_mixes_files_and_dirs() {
        let dir = tempdir().unwrap();
        let album = dir.path().join("album");
        std::fs::create_dir(&album).unwrap();
        File::create(album.join("01.flac")).unwrap();
        File::create(album.join("02.flac")).unwrap();
        let single = dir.path().join("single.m4a");
        File::create(&single).unwrap();

        let expanded = expand(&[single.clone(), album, dir.path().join("readme.md")]);
        assert_eq!(expanded.len(), 3);
        assert_eq!(expanded[0], single);
    }

    #[test]
    fn test_scan_missing_root_is_empty() {
        assert!(scan(Path::new("/definitely/not/here")).is_empty());
    }
}
