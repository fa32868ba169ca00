//! FLAC encoder
//!
//! FLAC provides lossless compression at roughly 40-60% of WAV size.
//! Samples are 16-bit; rate and channel count follow the configuration.

use flacenc::bitsink::ByteSink;
use flacenc::component::BitRepr;
use flacenc::config;
use flacenc::error::Verify;
use flacenc::source::MemSource;

use super::encoding::EncodingError;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: usize = 16;

/// Encode interleaved PCM samples to FLAC format
pub fn encode_to_flac(
    pcm_samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, EncodingError> {
    // flacenc uses i32 internally
    let samples_i32: Vec<i32> = pcm_samples.iter().map(|&s| s as i32).collect();

    let config = config::Encoder::default()
        .into_verified()
        .map_err(|(_, e)| EncodingError::FlacConfig(format!("{:?}", e)))?;

    let source = MemSource::from_samples(
        &samples_i32,
        channels as usize,
        BITS_PER_SAMPLE,
        sample_rate as usize,
    );

    let flac_stream = flacenc::encode_with_fixed_block_size(&config, source, config.block_size)
        .map_err(|e| EncodingError::FlacEncode(format!("{:?}", e)))?;

    let mut sink = ByteSink::new();
    flac_stream
        .write(&mut sink)
        .map_err(|e| EncodingError::FlacWrite(e.to_string()))?;

    Ok(sink.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_silence() {
        let silence = vec![0i16; 16000];
        let flac_data = encode_to_flac(&silence, 16000, 1).unwrap();
        assert!(flac_data.len() > 50);
        // FLAC magic number: "fLaC"
        assert_eq!(&flac_data[0..4], b"fLaC");
    }

    #[test]
    fn encode_stereo() {
        let silence = vec![0i16; 2 * 4410];
        let result = encode_to_flac(&silence, 44100, 2);
        assert!(result.is_ok());
    }

    #[test]
    fn encode_with_signal_compresses() {
        let rate = 16000;
        let samples: Vec<i16> = (0..rate as usize)
            .map(|i| {
                let t = i as f32 / rate as f32;
                (f32::sin(2.0 * std::f32::consts::PI * 440.0 * t) * 16000.0) as i16
            })
            .collect();

        let flac_data = encode_to_flac(&samples, rate, 1).unwrap();
        assert!(flac_data.len() < samples.len() * 2);
    }
}
