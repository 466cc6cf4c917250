//! Background fetch-and-decode so the frame loop never blocks on a load.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use super::error::AudioError;
use super::source::{self, AudioSource, DecodedAudio};

/// Runs at most one load at a time on a worker thread
///
/// A request made while another is still in flight is rejected; the caller
/// keeps its trigger disabled until [`AudioLoader::poll`] yields a result.
#[derive(Default)]
pub struct AudioLoader {
    pending: Option<PendingLoad>,
}

struct PendingLoad {
    label: String,
    receiver: Receiver<Result<DecodedAudio, AudioError>>,
}

impl AudioLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `source` in the background
    pub fn request(&mut self, source: AudioSource) -> Result<(), AudioError> {
        let label = source.label();
        self.spawn(label, move || source::load(source))
    }

    fn spawn<F>(&mut self, label: String, job: F) -> Result<(), AudioError>
    where
        F: FnOnce() -> Result<DecodedAudio, AudioError> + Send + 'static,
    {
        if let Some(pending) = &self.pending {
            return Err(AudioError::LoadInProgress(pending.label.clone()));
        }

        let (sender, receiver) = mpsc::channel();

        thread::Builder::new()
            .name("audio-loader".to_string())
            .spawn(move || {
                // Receiver may be gone if the loader was dropped; nothing to do then
                let _ = sender.send(job());
            })
            .map_err(|e| AudioError::Worker(format!("failed to spawn loader thread: {}", e)))?;

        log::info!("Loading {}...", label);
        self.pending = Some(PendingLoad { label, receiver });
        Ok(())
    }

    /// Non-blocking check for a finished load
    pub fn poll(&mut self) -> Option<Result<DecodedAudio, AudioError>> {
        let pending = self.pending.as_ref()?;
        let result = match pending.receiver.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(AudioError::Worker(format!(
                "loader for {} exited without a result",
                pending.label
            ))),
        };

        self.pending = None;
        Some(result)
    }

    /// Block until the in-flight load finishes
    pub fn wait(&mut self) -> Option<Result<DecodedAudio, AudioError>> {
        let pending = self.pending.take()?;
        Some(pending.receiver.recv().unwrap_or_else(|_| {
            Err(AudioError::Worker(format!(
                "loader for {} exited without a result",
                pending.label
            )))
        }))
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }
}
