//! Built-in default track, rendered offline from a Glicol composition.

use glicol::Engine;

use super::error::AudioError;
use super::source::DecodedAudio;
use crate::params::audio_constants::{
    BLOCK_SIZE, DEFAULT_TRACK_SAMPLE_RATE, DEFAULT_TRACK_SECONDS,
};

/// Glicol composition: kick-ish bass pulse under a filtered saw lead
pub const DEFAULT_COMPOSITION: &str = r#"
~gate: speed 2.0 >> seq 60 _60 _~a 48
~a: choose 48 48 48 72 0 0 0
~amp: ~gate >> envperc 0.001 0.1
~pit: ~gate >> mul 261.63
~lead: saw ~pit >> mul ~amp >> lpf ~mod 5.0 >> mul 0.1
~mod: sin 0.2 >> mul 1300 >> add 1500
~bass: sin 55 >> mul ~amp >> mul 0.4
o: mix ~lead ~bass >> plate 0.1
"#;

/// Render the default composition to a stereo buffer
pub fn render_default_track() -> Result<DecodedAudio, AudioError> {
    render_composition(
        DEFAULT_COMPOSITION,
        DEFAULT_TRACK_SAMPLE_RATE,
        DEFAULT_TRACK_SECONDS,
    )
}

/// Render `code` for `seconds` at `sample_rate` into interleaved stereo
pub fn render_composition(
    code: &str,
    sample_rate: u32,
    seconds: f32,
) -> Result<DecodedAudio, AudioError> {
    let mut engine = Engine::<BLOCK_SIZE>::new();
    engine.set_sr(sample_rate as usize);
    engine.update_with_code(code);
    engine
        .update()
        .map_err(|e| AudioError::Synthesis(format!("Glicol engine init failed: {:?}", e)))?;

    let total_frames = (seconds * sample_rate as f32).ceil() as usize;
    let mut samples = Vec::with_capacity(total_frames * 2);
    let mut frame_idx = 0;

    while frame_idx < total_frames {
        let (buffers, _) = engine.next_block(vec![]);
        let frames_to_copy = (total_frames - frame_idx).min(BLOCK_SIZE);

        for i in 0..frames_to_copy {
            // Hard clip to ±0.5 so the looped track never blasts the output
            samples.push(buffers[0][i].clamp(-0.5, 0.5));
            samples.push(buffers[1][i].clamp(-0.5, 0.5));
        }
        frame_idx += frames_to_copy;
    }

    log::debug!(
        "Rendered default track: {} frames @ {}Hz",
        total_frames,
        sample_rate
    );

    Ok(DecodedAudio {
        samples: samples.into(),
        channels: 2,
        sample_rate,
        label: "<default track>".to_string(),
    })
}
