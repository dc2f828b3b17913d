use std::path::PathBuf;

/// One playable item produced by the catalog.
///
/// Tracks are created once per scan and never mutated afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Unique within one catalog load; assigned in catalog order.
    pub id: u64,
    pub path: PathBuf,
    pub display_name: String,
    pub title: String,
    pub artist: Option<String>,
    /// Zero when the container does not report a length.
    pub duration_ms: u64,
}
