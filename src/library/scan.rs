use std::path::Path;

use lofty::prelude::*;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::config::LibrarySettings;

use super::display::display_from_fields;
use super::model::Track;

/// Configured extensions, lowercased and without leading dots.
fn normalized_extensions(settings: &LibrarySettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn has_extension(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| exts.iter().any(|e| e.eq_ignore_ascii_case(ext)))
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_str().is_some_and(|n| n.starts_with('.'))
}

struct Tags {
    title: String,
    artist: Option<String>,
    duration_ms: u64,
}

/// Title, artist and length from the file's tags.
///
/// Files lofty cannot parse keep the stem as title and a zero length;
/// the media engine decides later whether they are actually playable.
fn read_tags(path: &Path) -> Tags {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN");
    let mut tags = Tags {
        title: stem.to_string(),
        artist: None,
        duration_ms: 0,
    };

    let tagged = match lofty::read_from_path(path) {
        Ok(t) => t,
        Err(e) => {
            debug!(path = %path.display(), error = %e, "no readable tags");
            return tags;
        }
    };
    tags.duration_ms = tagged.properties().duration().as_millis() as u64;

    let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) else {
        return tags;
    };
    if let Some(title) = tag.title().filter(|v| !v.trim().is_empty()) {
        tags.title = title.to_string();
    }
    tags.artist = tag
        .artist()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    tags
}

/// Enumerate audio files under `dir` according to `settings`.
///
/// Entries that cannot be read are skipped. The result is sorted by display
/// name (case-insensitive) and ids follow that order.
pub fn scan(dir: &Path, settings: &LibrarySettings) -> Vec<Track> {
    let exts = normalized_extensions(settings);

    let mut walker = WalkDir::new(dir).follow_links(settings.follow_links);
    // Non-recursive means the root directory only.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    let mut tracks: Vec<Track> = walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || settings.include_hidden || !is_hidden(e))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() || e.path().is_file())
        .filter(|e| has_extension(e.path(), &exts))
        .map(|e| {
            let path = e.into_path();
            let tags = read_tags(&path);
            let display_name = display_from_fields(
                &path,
                &tags.title,
                tags.artist.as_deref(),
                &settings.display_fields,
                &settings.display_separator,
            );
            Track {
                id: 0,
                path,
                display_name,
                title: tags.title,
                artist: tags.artist,
                duration_ms: tags.duration_ms,
            }
        })
        .collect();

    tracks.sort_by_cached_key(|t| t.display_name.to_lowercase());
    for (i, t) in tracks.iter_mut().enumerate() {
        t.id = i as u64;
    }

    info!(dir = %dir.display(), count = tracks.len(), "catalog scanned");
    tracks
}
