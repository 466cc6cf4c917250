//! Audio engine owning the live session and its spectrum analyser.

use std::sync::{Arc, PoisonError};

use super::analyser::SpectrumAnalyser;
use super::error::AudioError;
use super::playback::{ActiveOutput, OutputBackend, Playback, SharedPlayback};
use super::source::{self, AudioSource, DecodedAudio};
use crate::params::AnalyserConfig;

/// One decoded buffer playing in a loop through one output
pub struct AudioSession {
    /// Dropped first so the stream stops before the buffer goes away
    output: Box<dyn ActiveOutput>,
    playback: SharedPlayback,
    label: String,
}

impl AudioSession {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn playback(&self) -> &SharedPlayback {
        &self.playback
    }
}

/// Audio system managing the single live session and frequency analysis
///
/// At most one session exists at a time. Replacing it decodes the new input
/// first, then tears the old session down, then opens the new output.
pub struct AudioEngine {
    backend: Box<dyn OutputBackend>,
    analyser_config: AnalyserConfig,
    analyser: SpectrumAnalyser,
    session: Option<AudioSession>,
    /// Reused copy of the playback tap
    time_domain: Vec<f32>,
}

impl AudioEngine {
    pub fn new(backend: Box<dyn OutputBackend>) -> Self {
        Self::with_analyser_config(backend, AnalyserConfig::default())
    }

    pub fn with_analyser_config(backend: Box<dyn OutputBackend>, config: AnalyserConfig) -> Self {
        Self {
            backend,
            analyser: SpectrumAnalyser::new(config.clone()),
            analyser_config: config,
            session: None,
            time_domain: Vec::new(),
        }
    }

    /// Load, decode and start playing `source`, replacing any current session
    ///
    /// Blocks on fetch and decode. On fetch/decode failure the current session
    /// keeps playing untouched.
    pub fn setup_audio(&mut self, source: AudioSource) -> Result<(), AudioError> {
        let decoded = source::load(source)?;
        self.install(decoded)
    }

    /// Start playing already-decoded audio, replacing any current session
    pub fn install(&mut self, audio: DecodedAudio) -> Result<(), AudioError> {
        let label = audio.label.clone();
        let duration = audio.duration_secs();

        // Old output stops here, before the new one exists
        if let Some(previous) = self.session.take() {
            log::info!("Stopping audio session: {}", previous.label);
        }

        self.analyser = SpectrumAnalyser::new(self.analyser_config.clone());
        self.time_domain.clear();

        let playback = Playback::shared(audio);
        let output = self.backend.open(Arc::clone(&playback))?;

        log::info!("Playing {} ({:.1}s, looping)", label, duration);

        self.session = Some(AudioSession {
            output,
            playback,
            label,
        });
        Ok(())
    }

    /// Refresh and return the current frequency snapshot
    ///
    /// `None` when no session is active. The slice is reused on every call.
    pub fn get_audio_data(&mut self) -> Option<&[u8]> {
        let session = self.session.as_ref()?;
        session
            .playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .copy_tap(&mut self.time_domain);

        Some(self.analyser.analyse(&self.time_domain))
    }

    /// Advance clock-driven outputs by one frame
    pub fn tick(&mut self, delta_time: f32) {
        if let Some(session) = self.session.as_mut() {
            session.output.pump(delta_time);
        }
    }

    /// Stop and drop the current session
    pub fn stop(&mut self) {
        if let Some(previous) = self.session.take() {
            log::info!("Stopping audio session: {}", previous.label);
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&AudioSession> {
        self.session.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::playback::HeadlessBackend;
    use crate::audio::source::tests::wav_bytes;
    use crate::params::FREQUENCY_BIN_COUNT;
    use std::cell::Cell;
    use std::rc::Rc;

    /// Backend recording how many outputs are alive at once
    #[derive(Default, Clone)]
    struct CountingBackend {
        live: Rc<Cell<usize>>,
        peak: Rc<Cell<usize>>,
        opened: Rc<Cell<usize>>,
    }

    struct CountingOutput {
        live: Rc<Cell<usize>>,
    }

    impl ActiveOutput for CountingOutput {}

    impl Drop for CountingOutput {
        fn drop(&mut self) {
            self.live.set(self.live.get() - 1);
        }
    }

    impl OutputBackend for CountingBackend {
        fn open(&mut self, _playback: SharedPlayback) -> Result<Box<dyn ActiveOutput>, AudioError> {
            self.live.set(self.live.get() + 1);
            self.peak.set(self.peak.get().max(self.live.get()));
            self.opened.set(self.opened.get() + 1);
            Ok(Box::new(CountingOutput {
                live: Rc::clone(&self.live),
            }))
        }
    }

    struct FailingBackend;

    impl OutputBackend for FailingBackend {
        fn open(&mut self, _playback: SharedPlayback) -> Result<Box<dyn ActiveOutput>, AudioError> {
            Err(AudioError::Device("no device".to_string()))
        }
    }

    fn wav_source() -> AudioSource {
        AudioSource::Blob {
            bytes: wav_bytes(1, 8000, 4000),
            mime_type: Some("audio/wav".to_string()),
        }
    }

    #[test]
    fn test_no_session_means_no_data() {
        let mut engine = AudioEngine::new(Box::new(HeadlessBackend::default()));
        assert!(!engine.is_active());
        assert!(engine.get_audio_data().is_none());

        // Ticking without a session is harmless
        engine.tick(0.016);
        assert!(engine.get_audio_data().is_none());
    }

    #[test]
    fn test_snapshot_length_after_setup() {
        let mut engine = AudioEngine::new(Box::new(HeadlessBackend::default()));
        engine.setup_audio(wav_source()).unwrap();
        engine.tick(0.05);

        let snapshot = engine.get_audio_data().unwrap();
        assert_eq!(snapshot.len(), FREQUENCY_BIN_COUNT);
        assert!(snapshot.iter().any(|&b| b > 0));
    }

    #[test]
    fn test_replacement_keeps_one_output() {
        let backend = CountingBackend::default();
        let mut engine = AudioEngine::new(Box::new(backend.clone()));

        engine.setup_audio(wav_source()).unwrap();
        engine.setup_audio(wav_source()).unwrap();
        engine.setup_audio(wav_source()).unwrap();

        assert_eq!(backend.opened.get(), 3);
        assert_eq!(backend.live.get(), 1);
        assert_eq!(backend.peak.get(), 1);

        engine.stop();
        assert_eq!(backend.live.get(), 0);
        assert!(!engine.is_active());
    }

    #[test]
    fn test_failed_decode_keeps_previous_session() {
        let backend = CountingBackend::default();
        let mut engine = AudioEngine::new(Box::new(backend.clone()));
        engine.setup_audio(wav_source()).unwrap();

        let err = engine
            .setup_audio(AudioSource::Blob {
                bytes: b"nope".to_vec(),
                mime_type: None,
            })
            .unwrap_err();

        assert!(matches!(err, AudioError::Decode { .. }));
        assert!(engine.is_active());
        assert_eq!(backend.live.get(), 1);
        assert_eq!(backend.opened.get(), 1);
    }

    #[test]
    fn test_device_failure_leaves_no_session() {
        let mut engine = AudioEngine::new(Box::new(FailingBackend));
        let err = engine.setup_audio(wav_source()).unwrap_err();

        assert!(matches!(err, AudioError::Device(_)));
        assert!(!engine.is_active());
        assert!(engine.get_audio_data().is_none());
    }
}
