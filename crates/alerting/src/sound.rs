//! Fire-and-forget alert sound playback

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::thread;

use rodio::{Decoder, OutputStream, Sink};
use thiserror::Error;
use tracing::warn;

/// Audio playback error types
#[derive(Error, Debug)]
pub enum AudioError {
    #[error("failed to open alert asset: {0}")]
    Asset(#[from] std::io::Error),

    #[error("audio device unavailable: {0}")]
    Device(#[from] rodio::StreamError),

    #[error("failed to decode alert asset: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),

    #[error("audio output error: {0}")]
    Output(#[from] rodio::PlayError),
}

/// Alert sound seam. Implementations must not block the caller and
/// must swallow their own failures.
pub trait AlertSound {
    /// Trigger one playback of the alert sound.
    fn play(&self);
}

/// Plays a WAV asset on a detached thread. Each firing is independent;
/// any failure (missing asset, device error) is logged and dropped.
#[derive(Debug, Clone)]
pub struct WavAlert {
    asset: PathBuf,
}

impl WavAlert {
    pub fn new(asset: impl Into<PathBuf>) -> Self {
        Self {
            asset: asset.into(),
        }
    }

    fn play_blocking(path: &Path) -> Result<(), AudioError> {
        let (_stream, handle) = OutputStream::try_default()?;
        let source = Decoder::new(BufReader::new(File::open(path)?))?;
        let sink = Sink::try_new(&handle)?;
        sink.append(source);
        sink.sleep_until_end();
        Ok(())
    }
}

impl AlertSound for WavAlert {
    fn play(&self) {
        let path = self.asset.clone();
        let spawned = thread::Builder::new()
            .name("alert-sound".into())
            .spawn(move || {
                if let Err(err) = Self::play_blocking(&path) {
                    warn!(%err, path = %path.display(), "failed to play alert sound");
                }
            });
        if let Err(err) = spawned {
            warn!(%err, "failed to spawn alert sound thread");
        }
    }
}

/// No-op sound for muted sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct MutedAlert;

impl AlertSound for MutedAlert {
    fn play(&self) {}
}

impl<T: AlertSound + ?Sized> AlertSound for Box<T> {
    fn play(&self) {
        (**self).play();
    }
}
