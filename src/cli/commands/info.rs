//! File inspection and config commands.

use std::path::Path;

use crate::config::{self, Config};
use crate::error::ResultExt;
use crate::metadata;
use crate::player::format_duration;

/// Print tags and duration of an audio file
pub fn cmd_info(path: &Path) -> anyhow::Result<()> {
    let meta = metadata::read(path).with_context(format!("reading {}", path.display()))?;

    println!("File:     {}", path.display());
    println!("Title:    {}", meta.title.as_deref().unwrap_or("-"));
    println!("Artist:   {}", meta.artist.as_deref().unwrap_or("-"));
    println!("Album:    {}", meta.album.as_deref().unwrap_or("-"));
    if let Some(n) = meta.track_number {
        println!("Track:    {}", n);
    }
    match meta.duration {
        Some(d) => println!("Duration: {}", format_duration(d)),
        None => println!("Duration: unknown"),
    }
    Ok(())
}

/// Print the config location, optionally writing a default file there
pub fn cmd_config(path: Option<&Path>, init: bool, force: bool) -> anyhow::Result<()> {
    let Some(path) = path else {
        anyhow::bail!("Could not determine config directory; pass --config");
    };

    if !init {
        let state = if path.exists() { "exists" } else { "not created" };
        println!("{} ({})", path.display(), state);
        return Ok(());
    }

    if path.exists() && !force {
        println!("{} already exists (use --force to overwrite)", path.display());
        return Ok(());
    }
    config::save_to(&Config::default(), path)?;
    println!("✓ Wrote default config to {}", path.display());
    Ok(())
}
