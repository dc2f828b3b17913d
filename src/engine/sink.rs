//! The output seam: turning a `Track` into something that plays it.
//!
//! `QueueEngine` only talks to these traits; `DeviceOutput` backs them with
//! a rodio stream and one `Sink` per item.

use std::fs::File;
use std::io::BufReader;
use std::time::Duration;

use rodio::{Decoder, OutputStream, OutputStreamBuilder, Sink, Source};
use tracing::info;

use crate::library::Track;

use super::EngineError;

/// One opened item.
pub trait ItemSink {
    fn start(&self);
    fn hold(&self);
    /// Stop output and release the item.
    fn discard(&self);
    /// Whether the item has played to its end.
    fn is_drained(&self) -> bool;
    fn position_ms(&self) -> u64;
    fn seek_to(&self, position_ms: u64) -> Result<(), String>;
}

pub struct Opened<S> {
    pub sink: S,
    /// Length reported by the decoder, if the format exposes it.
    pub duration_ms: Option<u64>,
}

pub trait Output {
    type Sink: ItemSink;

    /// Decode `track` and queue it, paused.
    fn open(&self, track: &Track) -> Result<Opened<Self::Sink>, EngineError>;
}

/// The default audio device.
pub struct DeviceOutput {
    stream: OutputStream,
}

impl DeviceOutput {
    pub fn open_default() -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio prints to stderr when the stream is dropped; that would
        // land on top of the TUI.
        stream.log_on_drop(false);
        info!("audio output opened");
        Ok(Self { stream })
    }
}

impl Output for DeviceOutput {
    type Sink = Sink;

    fn open(&self, track: &Track) -> Result<Opened<Sink>, EngineError> {
        let file = File::open(&track.path).map_err(|source| EngineError::Open {
            path: track.path.clone(),
            source,
        })?;

        let source = Decoder::new(BufReader::new(file)).map_err(|source| EngineError::Decode {
            path: track.path.clone(),
            source,
        })?;
        let duration_ms = source
            .total_duration()
            .map(|d: Duration| d.as_millis() as u64);

        let sink = Sink::connect_new(self.stream.mixer());
        sink.pause();
        sink.append(source);

        Ok(Opened { sink, duration_ms })
    }
}

impl ItemSink for Sink {
    fn start(&self) {
        self.play();
    }

    fn hold(&self) {
        self.pause();
    }

    fn discard(&self) {
        self.stop();
    }

    fn is_drained(&self) -> bool {
        self.empty()
    }

    fn position_ms(&self) -> u64 {
        self.get_pos().as_millis() as u64
    }

    fn seek_to(&self, position_ms: u64) -> Result<(), String> {
        self.try_seek(Duration::from_millis(position_ms))
            .map_err(|e| e.to_string())
    }
}
