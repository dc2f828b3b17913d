//! `rodio`-backed implementation of `MediaEngine`.

mod backend;
mod navigation;
mod sink;

pub use backend::RodioEngine;

use std::path::PathBuf;

use thiserror::Error;

use crate::player::PlayerError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no audio output device: {0}")]
    Output(String),

    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        source: rodio::decoder::DecoderError,
    },
}

impl From<EngineError> for PlayerError {
    fn from(e: EngineError) -> Self {
        PlayerError::EngineInit(e.to_string())
    }
}
