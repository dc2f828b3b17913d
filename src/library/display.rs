use std::path::Path;

use crate::config::TrackDisplayField;

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

fn field_text(
    field: TrackDisplayField,
    path: &Path,
    title: &str,
    artist: Option<&str>,
) -> Option<String> {
    match field {
        TrackDisplayField::Title => non_blank(title),
        TrackDisplayField::Artist => artist.and_then(non_blank),
        TrackDisplayField::Filename => path.file_stem().and_then(|s| s.to_str()).and_then(non_blank),
        TrackDisplayField::Path => Some(path.display().to_string()),
    }
}

/// The list label for a track: the configured `fields` joined by `sep`.
///
/// Blank fields are dropped; if all are blank the title is used as is.
pub fn display_from_fields(
    path: &Path,
    title: &str,
    artist: Option<&str>,
    fields: &[TrackDisplayField],
    sep: &str,
) -> String {
    let parts: Vec<String> = fields
        .iter()
        .filter_map(|f| field_text(*f, path, title, artist))
        .collect();

    if parts.is_empty() {
        title.to_string()
    } else {
        parts.join(sep)
    }
}
