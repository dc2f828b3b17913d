//! Track catalog: enumerates playable files on disk.
//!
//! The catalog is a collaborator of the player; it produces an ordered,
//! immutable list of `Track`s that the controller references by index.

mod display;
mod model;
mod scan;

pub use model::Track;
pub use scan::scan;
