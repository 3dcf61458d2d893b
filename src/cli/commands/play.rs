//! Interactive headless playback.
//!
//! Stdin lines are key names from the keymap (`right`, `space`, ...) with an
//! optional repeat count, or one of the words `next`, `prev`, `fav`,
//! `restart`, `quit`. `right 3` is three presses of a held key followed by
//! one release.

use crossbeam_channel::{RecvTimeoutError, unbounded};
use parking_lot::Mutex;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::player::{
    ClockBackend, Collaborators, ErrorNotice, FavoriteSet, KeyEdge, Keymap, PlayQueue,
    PlaybackController, Track, TransportState, UiBindings, event_channel, format_duration,
    ui_channel,
};
use crate::scanner;

/// How often the console redraws while idle.
const UI_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Play the given paths until the queue runs out or the user quits
pub fn cmd_play(config: &Config, paths: &[PathBuf], shuffle: bool) -> anyhow::Result<()> {
    let inputs = if paths.is_empty() {
        config.library.paths.clone()
    } else {
        paths.to_vec()
    };
    let files = scanner::expand(&inputs);
    if files.is_empty() {
        println!("No audio files found.");
        return Ok(());
    }

    let tracks: Vec<Track> = files
        .into_iter()
        .map(|path| {
            Track::probe(&path).unwrap_or_else(|e| {
                debug!("Could not read tags from {:?}: {}", path, e);
                Track::from_path(path)
            })
        })
        .collect();
    println!("Queued {} track(s)", tracks.len());

    let mut queue = PlayQueue::from_tracks(tracks);
    // RepeatAll stops at the end of the queue
    queue.set_wrap(false);
    let queue = Arc::new(Mutex::new(queue));

    let (sink, events) = event_channel();
    let backend = ClockBackend::new(sink, config.clock_config())?;
    let (ui_handle, ui_queue) = ui_channel();
    let controller = PlaybackController::new(
        Box::new(backend),
        events,
        Collaborators {
            queue: queue.clone(),
            favorites: Arc::new(FavoriteSet::new()),
            ui: ui_handle,
        },
        config.controller_config(),
    )?;
    let event_loop = controller.spawn_event_loop()?;

    if shuffle {
        controller.shuffle();
    }
    let first = queue.lock().skip_forward().cloned();
    controller.load(first);
    controller.play();

    let lines = spawn_stdin_reader()?;
    let keymap = config.keymap();
    let mut console = ConsoleUi::default();
    let mut input_open = true;

    loop {
        ui_queue.drain_into(&mut console);
        if controller.transport() == TransportState::Empty {
            break;
        }

        if !input_open {
            thread::sleep(UI_POLL_INTERVAL);
            continue;
        }
        match lines.recv_timeout(UI_POLL_INTERVAL) {
            Ok(line) => {
                if !handle_line(&controller, &keymap, &line) {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                debug!("stdin closed, playing to the end of the queue");
                input_open = false;
            }
        }
    }

    controller.dispose();
    if event_loop.join().is_err() {
        warn!("Controller event loop panicked");
    }
    ui_queue.drain_into(&mut console);
    println!();
    info!("Playback finished");
    Ok(())
}

/// Apply one input line. Returns false when the user asked to quit.
fn handle_line(controller: &PlaybackController, keymap: &Keymap, line: &str) -> bool {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return true;
    };

    match word {
        "q" | "quit" | "exit" => return false,
        "n" | "next" => controller.next(),
        "p" | "prev" | "previous" => controller.previous(),
        "fav" | "favorite" => controller.toggle_favorite(),
        "restart" => controller.restart(),
        "stop" => controller.stop(),
        key => match keymap.lookup(key) {
            Some(action) => {
                let presses = words
                    .next()
                    .and_then(|n| n.parse::<usize>().ok())
                    .unwrap_or(1);
                for _ in 0..presses {
                    controller.handle_key(action, KeyEdge::Pressed);
                }
                controller.handle_key(action, KeyEdge::Released);
            }
            None => println!("\nUnknown key or command: {}", key),
        },
    }
    true
}

fn spawn_stdin_reader() -> std::io::Result<crossbeam_channel::Receiver<String>> {
    let (tx, rx) = unbounded();
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Renders controller updates as terminal lines.
#[derive(Debug, Default)]
pub struct ConsoleUi {
    position: Duration,
    total: Option<Duration>,
    paused: bool,
    volume: Option<f64>,
    last_drawn_secs: Option<u64>,
}

impl ConsoleUi {
    /// The status line for the current state.
    pub fn status_line(&self) -> String {
        let total = self
            .total
            .map(format_duration)
            .unwrap_or_else(|| "--:--".to_string());
        let marker = if self.paused { "⏸" } else { "▶" };
        let volume = self
            .volume
            .map(|v| format!("  vol {:>3.0}%", v * 100.0))
            .unwrap_or_default();
        format!(
            "{} {} / {}{}",
            marker,
            format_duration(self.position),
            total,
            volume
        )
    }

    fn redraw(&mut self) {
        self.last_drawn_secs = Some(self.position.as_secs());
        print!("\r{:<40}", self.status_line());
        let _ = std::io::stdout().flush();
    }
}

impl UiBindings for ConsoleUi {
    fn push_track_info(&mut self, track: Option<&Track>) {
        self.position = Duration::ZERO;
        self.total = track.and_then(Track::duration);
        match track {
            Some(track) => println!(
                "\n♪ {} - {} ({})",
                track.info().display_artist(),
                track.display_title(),
                track.info().display_album()
            ),
            None => println!("\n■ Stopped"),
        }
    }

    fn push_play_state(&mut self, paused: bool) {
        self.paused = paused;
        self.redraw();
    }

    fn push_position(&mut self, position: Duration) {
        self.position = position;
        if self.last_drawn_secs != Some(position.as_secs()) {
            self.redraw();
        }
    }

    fn push_total_duration(&mut self, total: Duration) {
        self.total = (!total.is_zero()).then_some(total);
        self.redraw();
    }

    fn push_volume(&mut self, volume: f64) {
        self.volume = Some(volume);
        self.redraw();
    }

    fn push_favorite(&mut self, favorite: bool) {
        if favorite {
            println!("\n♥ Favorite");
        }
    }

    fn show_error(&mut self, notice: &ErrorNotice) {
        eprintln!("\n✗ {}", notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_line_formats_state() {
        let mut ui = ConsoleUi::default();
        assert_eq!(ui.status_line(), "▶ 0:00 / --:--");

        ui.push_total_duration(Duration::from_secs(185));
        ui.push_position(Duration::from_secs(61));
        ui.push_volume(0.5);
        ui.push_play_state(true);
        assert_eq!(ui.status_line(), "⏸ 1:01 / 3:05  vol  50%");
    }

    #[test]
    fn test_track_change_resets_position() {
        let mut ui = ConsoleUi::default();
        ui.push_position(Duration::from_secs(30));
        ui.push_track_info(None);
        assert_eq!(ui.position, Duration::ZERO);
        assert!(ui.total.is_none());
    }

    #[test]
    fn test_play_with_nothing_to_play() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        cmd_play(&config, &[dir.path().to_path_buf()], false).unwrap();
    }
}
