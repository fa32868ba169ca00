//! PCM post-processing applied between capture and encoding
//!
//! Capture keeps mono i16 samples at the device rate; these helpers turn
//! them into what the configuration asks for.

use rubato::{FftFixedIn, Resampler};

use crate::application::ports::BackendError;

/// Peak level `normalize_peak` scales to (about -1 dBFS)
pub const NORMALIZE_TARGET_PEAK: i16 = 29_000;

/// Gate threshold used for noise suppression (about -50 dBFS)
pub const NOISE_GATE_THRESHOLD: i16 = 100;

/// Frames per noise gate window (10ms at 48kHz)
const GATE_WINDOW: usize = 480;

/// Mix interleaved multi-channel audio to mono
pub fn downmix_to_mono(samples: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels as usize)
        .map(|chunk| {
            let sum: i32 = chunk.iter().map(|&s| s as i32).sum();
            (sum / chunk.len() as i32) as i16
        })
        .collect()
}

/// Convert f32 samples in [-1.0, 1.0] to i16
pub fn f32_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Lay mono audio out as `channels` interleaved channels
pub fn expand_channels(mono: &[i16], channels: u16) -> Vec<i16> {
    if channels <= 1 {
        return mono.to_vec();
    }

    let mut out = Vec::with_capacity(mono.len() * channels as usize);
    for &sample in mono {
        for _ in 0..channels {
            out.push(sample);
        }
    }
    out
}

/// Resample mono audio from `source_rate` to `target_rate`
pub fn resample(
    samples: &[i16],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<i16>, BackendError> {
    if source_rate == target_rate || samples.is_empty() {
        return Ok(samples.to_vec());
    }

    let samples_f32: Vec<f32> = samples.iter().map(|&s| s as f32 / 32768.0).collect();

    let ratio = target_rate as f64 / source_rate as f64;
    let output_len = (samples_f32.len() as f64 * ratio).ceil() as usize;

    let mut resampler = FftFixedIn::<f32>::new(
        source_rate as usize,
        target_rate as usize,
        1024, // Chunk size
        2,    // Sub-chunks
        1,    // Mono
    )
    .map_err(|e| BackendError::RecordingFailed(format!("Resampler init failed: {}", e)))?;

    let mut output = Vec::with_capacity(output_len);
    let mut input_pos = 0;

    while input_pos < samples_f32.len() {
        let frames_needed = resampler.input_frames_next();
        let end_pos = (input_pos + frames_needed).min(samples_f32.len());
        let mut chunk = samples_f32[input_pos..end_pos].to_vec();
        // Pad the final chunk
        chunk.resize(frames_needed, 0.0);

        let resampled = resampler
            .process(&[chunk], None)
            .map_err(|e| BackendError::RecordingFailed(format!("Resampling failed: {}", e)))?;

        output.extend(
            resampled[0]
                .iter()
                .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16),
        );
        input_pos = end_pos;
    }

    output.truncate(output_len);
    Ok(output)
}

/// Silence windows whose peak stays under `threshold`
pub fn noise_gate(samples: &mut [i16], threshold: i16) {
    for window in samples.chunks_mut(GATE_WINDOW) {
        let peak = window.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
        if peak < threshold.unsigned_abs() {
            window.fill(0);
        }
    }
}

/// Scale audio so its peak reaches `target`. Silence is left untouched.
pub fn normalize_peak(samples: &mut [i16], target: i16) {
    let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap_or(0);
    if peak == 0 {
        return;
    }

    let gain = target.unsigned_abs() as f32 / peak as f32;
    for sample in samples.iter_mut() {
        *sample = (*sample as f32 * gain).clamp(i16::MIN as f32, i16::MAX as f32) as i16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_single_channel() {
        let mono = vec![100i16, 200, 300];
        assert_eq!(downmix_to_mono(&mono, 1), mono);
    }

    #[test]
    fn downmix_two_channels() {
        let stereo = vec![100i16, 200, 300, 400];
        assert_eq!(downmix_to_mono(&stereo, 2), vec![150, 350]);
    }

    #[test]
    fn expand_mono_to_stereo() {
        assert_eq!(expand_channels(&[1, 2], 2), vec![1, 1, 2, 2]);
        assert_eq!(expand_channels(&[1, 2], 1), vec![1, 2]);
    }

    #[test]
    fn f32_conversion_clamps() {
        assert_eq!(f32_to_i16(&[0.0, 1.0, -2.0]), vec![0, i16::MAX, -i16::MAX]);
    }

    #[test]
    fn resample_same_rate_is_identity() {
        let samples = vec![1i16, 2, 3];
        assert_eq!(resample(&samples, 16000, 16000).unwrap(), samples);
    }

    #[test]
    fn resample_changes_length_by_ratio() {
        let samples = vec![0i16; 48000];
        let out = resample(&samples, 48000, 16000).unwrap();
        assert!(out.len() <= 16000);
        assert!(out.len() > 15000);
    }

    #[test]
    fn noise_gate_silences_quiet_windows() {
        let mut samples = vec![10i16; GATE_WINDOW];
        samples.extend(vec![5000i16; GATE_WINDOW]);
        noise_gate(&mut samples, NOISE_GATE_THRESHOLD);
        assert!(samples[..GATE_WINDOW].iter().all(|&s| s == 0));
        assert!(samples[GATE_WINDOW..].iter().all(|&s| s == 5000));
    }

    #[test]
    fn normalize_scales_to_target_peak() {
        let mut samples = vec![1000i16, -2000, 500];
        normalize_peak(&mut samples, NORMALIZE_TARGET_PEAK);
        let peak = samples.iter().map(|s| s.unsigned_abs()).max().unwrap();
        assert!((peak as i32 - NORMALIZE_TARGET_PEAK as i32).abs() <= 1);
        assert!(samples[1] < 0);
    }

    #[test]
    fn normalize_leaves_silence() {
        let mut samples = vec![0i16; 10];
        normalize_peak(&mut samples, NORMALIZE_TARGET_PEAK);
        assert!(samples.iter().all(|&s| s == 0));
    }
}
