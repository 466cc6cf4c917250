//! Looping buffer playback and the output backends that drive it.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use super::error::AudioError;
use super::source::DecodedAudio;
use crate::params::{audio_constants::HEADLESS_SAMPLE_RATE, ANALYSER_FFT_SIZE};

/// Playback shared between the output callback and the analyser
pub type SharedPlayback = Arc<Mutex<Playback>>;

/// Looping playback of a decoded buffer
///
/// Every rendered frame is also pushed (mono-mixed) into a tap holding the
/// last `ANALYSER_FFT_SIZE` samples, which is what the analyser reads.
#[derive(Debug)]
pub struct Playback {
    audio: DecodedAudio,
    /// Read position in source frames (fractional when resampling)
    cursor: f64,
    /// Source frames advanced per output frame
    step: f64,
    tap: VecDeque<f32>,
    frames_rendered: u64,
}

impl Playback {
    pub fn new(audio: DecodedAudio) -> Self {
        Self {
            audio,
            cursor: 0.0,
            step: 1.0,
            tap: VecDeque::with_capacity(ANALYSER_FFT_SIZE),
            frames_rendered: 0,
        }
    }

    pub fn shared(audio: DecodedAudio) -> SharedPlayback {
        Arc::new(Mutex::new(Self::new(audio)))
    }

    pub fn audio(&self) -> &DecodedAudio {
        &self.audio
    }

    /// Set the device rate; the buffer is resampled to it on the fly
    pub fn set_output_rate(&mut self, output_rate: u32) {
        self.step = self.audio.sample_rate as f64 / output_rate.max(1) as f64;
    }

    /// Total output frames rendered since start
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Fill an interleaved output buffer, looping at the end of the source
    pub fn render(&mut self, out: &mut [f32], out_channels: usize) {
        let frames = self.audio.frames();
        let src_channels = self.audio.channels as usize;

        if frames == 0 || out_channels == 0 {
            out.fill(0.0);
            return;
        }

        for frame in out.chunks_mut(out_channels) {
            let index = self.cursor as usize;
            let next = (index + 1) % frames;
            let frac = (self.cursor - index as f64) as f32;

            let sample_at = |channel: usize| {
                let a = self.audio.samples[index * src_channels + channel];
                let b = self.audio.samples[next * src_channels + channel];
                a + (b - a) * frac
            };

            let mono = (0..src_channels).map(|c| sample_at(c)).sum::<f32>() / src_channels as f32;

            if out_channels == 1 {
                frame[0] = mono;
            } else {
                for (c, slot) in frame.iter_mut().enumerate() {
                    *slot = sample_at(c % src_channels);
                }
            }

            if self.tap.len() == ANALYSER_FFT_SIZE {
                self.tap.pop_front();
            }
            self.tap.push_back(mono);

            self.cursor += self.step;
            if self.cursor >= frames as f64 {
                self.cursor %= frames as f64;
            }
            self.frames_rendered += 1;
        }
    }

    /// Copy the tap (oldest first) into `dest`
    pub fn copy_tap(&self, dest: &mut Vec<f32>) {
        dest.clear();
        dest.extend(self.tap.iter().copied());
    }
}

/// A running output; stops producing sound when dropped
pub trait ActiveOutput {
    /// Advance by one frame of wall time (only meaningful for clock-driven outputs)
    fn pump(&mut self, _delta_time: f32) {}
}

/// Something that can start pulling audio from a playback
pub trait OutputBackend {
    fn open(&mut self, playback: SharedPlayback) -> Result<Box<dyn ActiveOutput>, AudioError>;
}

/// Default system output device through cpal
#[derive(Debug, Default)]
pub struct CpalBackend;

struct CpalOutput {
    /// Audio output stream (kept alive)
    _stream: cpal::Stream,
}

impl ActiveOutput for CpalOutput {}

impl OutputBackend for CpalBackend {
    fn open(&mut self, playback: SharedPlayback) -> Result<Box<dyn ActiveOutput>, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("No audio output device found".to_string()))?;

        let config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("Failed to get audio config: {}", e)))?;

        let channels = config.channels() as usize;
        let sample_rate = config.sample_rate().0;

        log::info!(
            "Audio: {} @ {}Hz, {} channels",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            sample_rate,
            channels
        );

        playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_output_rate(sample_rate);

        let callback_playback = Arc::clone(&playback);
        let stream = device
            .build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    callback_playback
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .render(data, channels);
                },
                |err| log::error!("Audio stream error: {}", err),
                None,
            )
            .map_err(|e| AudioError::Device(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| AudioError::Device(format!("Failed to start audio stream: {}", e)))?;

        Ok(Box::new(CpalOutput { _stream: stream }))
    }
}

/// Device-less output that renders playback in step with the frame clock
#[derive(Debug)]
pub struct HeadlessBackend {
    sample_rate: u32,
    channels: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self {
            sample_rate: HEADLESS_SAMPLE_RATE,
            channels: 2,
        }
    }
}

struct HeadlessOutput {
    playback: SharedPlayback,
    sample_rate: u32,
    channels: usize,
    /// Fractional frames carried between pumps
    pending_frames: f64,
    scratch: Vec<f32>,
}

impl ActiveOutput for HeadlessOutput {
    fn pump(&mut self, delta_time: f32) {
        self.pending_frames += delta_time.max(0.0) as f64 * self.sample_rate as f64;
        let frames = self.pending_frames.floor() as usize;
        if frames == 0 {
            return;
        }
        self.pending_frames -= frames as f64;

        self.scratch.resize(frames * self.channels, 0.0);
        self.playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(&mut self.scratch, self.channels);
    }
}

impl OutputBackend for HeadlessBackend {
    fn open(&mut self, playback: SharedPlayback) -> Result<Box<dyn ActiveOutput>, AudioError> {
        playback
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .set_output_rate(self.sample_rate);

        Ok(Box::new(HeadlessOutput {
            playback,
            sample_rate: self.sample_rate,
            channels: self.channels,
            pending_frames: 0.0,
            scratch: Vec::new(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mono(samples: &[f32], sample_rate: u32) -> DecodedAudio {
        DecodedAudio {
            samples: samples.to_vec().into(),
            channels: 1,
            sample_rate,
            label: "test".to_string(),
        }
    }

    #[test]
    fn test_mono_source_duplicates_and_loops() {
        let mut playback = Playback::new(mono(&[0.1, 0.2, 0.3], 100));
        playback.set_output_rate(100);

        let mut out = vec![0.0; 8]; // 4 stereo frames
        playback.render(&mut out, 2);

        assert_eq!(out, vec![0.1, 0.1, 0.2, 0.2, 0.3, 0.3, 0.1, 0.1]);
        assert_eq!(playback.frames_rendered(), 4);
    }

    #[test]
    fn test_stereo_source_to_mono_output_averages() {
        let audio = DecodedAudio {
            samples: vec![0.2, 0.4, -0.2, -0.4].into(),
            channels: 2,
            sample_rate: 100,
            label: "test".to_string(),
        };
        let mut playback = Playback::new(audio);
        playback.set_output_rate(100);

        let mut out = vec![0.0; 2];
        playback.render(&mut out, 1);

        assert!((out[0] - 0.3).abs() < 1e-6);
        assert!((out[1] + 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_resampling_interpolates() {
        let mut playback = Playback::new(mono(&[0.0, 1.0], 100));
        playback.set_output_rate(200); // half-step per output frame

        let mut out = vec![0.0; 4];
        playback.render(&mut out, 1);

        assert_eq!(out, vec![0.0, 0.5, 1.0, 0.5]);
    }

    #[test]
    fn test_tap_keeps_latest_window() {
        let samples: Vec<f32> = (0..ANALYSER_FFT_SIZE * 2).map(|i| i as f32).collect();
        let mut playback = Playback::new(mono(&samples, 100));
        playback.set_output_rate(100);

        let mut out = vec![0.0; ANALYSER_FFT_SIZE + 10];
        playback.render(&mut out, 1);

        let mut tap = Vec::new();
        playback.copy_tap(&mut tap);
        assert_eq!(tap.len(), ANALYSER_FFT_SIZE);
        assert_eq!(tap[0], 10.0);
        assert_eq!(*tap.last().unwrap(), (ANALYSER_FFT_SIZE + 9) as f32);
    }

    #[test]
    fn test_headless_output_follows_frame_clock() {
        let playback = Playback::shared(mono(&[0.5; 1000], HEADLESS_SAMPLE_RATE));
        let mut backend = HeadlessBackend::default();
        let mut output = backend.open(Arc::clone(&playback)).unwrap();

        output.pump(0.25);
        output.pump(0.25);

        assert_eq!(
            playback.lock().unwrap().frames_rendered(),
            HEADLESS_SAMPLE_RATE as u64 / 2
        );
    }
}
