//! WAV and raw PCM16 encoders

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::encoding::EncodingError;

/// Bits per sample (16-bit audio)
const BITS_PER_SAMPLE: u16 = 16;

/// Encode interleaved i16 samples as a 16-bit PCM WAV file
pub fn encode_to_wav(
    pcm_samples: &[i16],
    sample_rate: u32,
    channels: u16,
) -> Result<Vec<u8>, EncodingError> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer =
            WavWriter::new(&mut cursor, spec).map_err(|e| EncodingError::Wav(e.to_string()))?;
        for &sample in pcm_samples {
            writer
                .write_sample(sample)
                .map_err(|e| EncodingError::Wav(e.to_string()))?;
        }
        writer
            .finalize()
            .map_err(|e| EncodingError::Wav(e.to_string()))?;
    }

    Ok(cursor.into_inner())
}

/// Encode interleaved i16 samples as headerless little-endian PCM
pub fn encode_to_pcm16(pcm_samples: &[i16]) -> Vec<u8> {
    pcm_samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_has_riff_header() {
        let silence = vec![0i16; 1600];
        let wav = encode_to_wav(&silence, 16000, 1).unwrap();
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        // 44-byte header plus 2 bytes per sample
        assert_eq!(wav.len(), 44 + silence.len() * 2);
    }

    #[test]
    fn wav_reads_back_with_spec() {
        let samples: Vec<i16> = (0..200).map(|i| i as i16).collect();
        let wav = encode_to_wav(&samples, 44100, 2).unwrap();
        let reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().sample_rate, 44100);
        assert_eq!(reader.len() as usize, samples.len());
    }

    #[test]
    fn pcm16_is_little_endian() {
        assert_eq!(encode_to_pcm16(&[1, -1]), vec![1, 0, 0xff, 0xff]);
    }
}
