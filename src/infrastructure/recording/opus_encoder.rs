//! Opus encoder writing an Ogg Opus stream
//!
//! libopus only accepts 8, 12, 16, 24 and 48 kHz input; other rates are
//! rejected rather than silently resampled. Frames are 20ms.

use ogg::writing::PacketWriteEndInfo;

use super::encoding::EncodingError;

/// Sample rates libopus accepts
pub const SUPPORTED_SAMPLE_RATES: [u32; 5] = [8000, 12000, 16000, 24000, 48000];

/// Ogg Opus granule positions always count 48kHz samples
const GRANULE_RATE: u64 = 48_000;

/// Largest packet libopus produces
const MAX_PACKET_SIZE: usize = 4000;

/// Check that libopus can encode `sample_rate` with `channels`
pub fn check_format(sample_rate: u32, channels: u16) -> Result<(), EncodingError> {
    if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
        return Err(EncodingError::Unsupported(format!(
            "Opus does not support a sample rate of {} Hz",
            sample_rate
        )));
    }
    if !(1..=2).contains(&channels) {
        return Err(EncodingError::Unsupported(format!(
            "Opus encoder does not support {} channels",
            channels
        )));
    }
    Ok(())
}

/// Opus encoder for a fixed rate, channel count and bit rate
pub struct OpusEncoder {
    encoder: opus::Encoder,
    sample_rate: u32,
    channels: u16,
    serial: u32,
    granule_pos: u64,
}

impl OpusEncoder {
    /// Create an encoder
    pub fn new(sample_rate: u32, channels: u16, bit_rate: u32) -> Result<Self, EncodingError> {
        check_format(sample_rate, channels)?;
        let opus_channels = if channels == 1 {
            opus::Channels::Mono
        } else {
            opus::Channels::Stereo
        };

        let opus_err = |e: opus::Error| EncodingError::OpusEncode(e.to_string());
        let mut encoder = opus::Encoder::new(sample_rate, opus_channels, opus::Application::Audio)
            .map_err(opus_err)?;
        encoder
            .set_bitrate(opus::Bitrate::Bits(bit_rate.min(i32::MAX as u32) as i32))
            .map_err(opus_err)?;
        encoder.set_vbr(true).map_err(opus_err)?;
        encoder.set_inband_fec(true).map_err(opus_err)?;

        Ok(Self {
            encoder,
            sample_rate,
            channels,
            serial: rand_serial(),
            granule_pos: 0,
        })
    }

    /// Samples per channel in one 20ms frame
    pub fn frame_size(&self) -> usize {
        self.sample_rate as usize / 50
    }

    /// Encode interleaved PCM samples into a complete Ogg Opus file
    pub fn encode_to_ogg(&mut self, pcm_samples: &[i16]) -> Result<Vec<u8>, EncodingError> {
        let mut ogg_data = Vec::new();
        let mut packet_writer =
            ogg::writing::PacketWriter::new(std::io::Cursor::new(&mut ogg_data));

        self.write_opus_header(&mut packet_writer)?;

        let frame_len = self.frame_size() * self.channels as usize;
        let granule_step = self.frame_size() as u64 * GRANULE_RATE / self.sample_rate as u64;
        let frame_count = pcm_samples.len().div_ceil(frame_len).max(1);

        for frame_num in 0..frame_count {
            let start = (frame_num * frame_len).min(pcm_samples.len());
            let end = (start + frame_len).min(pcm_samples.len());
            let mut frame = pcm_samples[start..end].to_vec();
            // Pad last frame
            frame.resize(frame_len, 0);

            let mut opus_packet = vec![0u8; MAX_PACKET_SIZE];
            let len = self
                .encoder
                .encode(&frame, &mut opus_packet)
                .map_err(|e| EncodingError::OpusEncode(e.to_string()))?;
            opus_packet.truncate(len);

            self.granule_pos += granule_step;
            let end_info = if frame_num + 1 == frame_count {
                PacketWriteEndInfo::EndStream
            } else {
                PacketWriteEndInfo::NormalPacket
            };

            packet_writer
                .write_packet(opus_packet, self.serial, end_info, self.granule_pos)
                .map_err(|e| EncodingError::OggWrite(e.to_string()))?;
        }

        drop(packet_writer);
        Ok(ogg_data)
    }

    /// Write Opus identification and comment headers
    fn write_opus_header<W: std::io::Write>(
        &self,
        writer: &mut ogg::writing::PacketWriter<W>,
    ) -> Result<(), EncodingError> {
        let mut id_header = Vec::with_capacity(19);
        id_header.extend_from_slice(b"OpusHead");
        id_header.push(1); // Version
        id_header.push(self.channels as u8);
        id_header.extend_from_slice(&0u16.to_le_bytes()); // Pre-skip
        id_header.extend_from_slice(&self.sample_rate.to_le_bytes());
        id_header.extend_from_slice(&0i16.to_le_bytes()); // Output gain
        id_header.push(0); // Channel mapping family

        writer
            .write_packet(id_header, self.serial, PacketWriteEndInfo::EndPage, 0)
            .map_err(|e| EncodingError::OggWrite(e.to_string()))?;

        let mut comment_header = Vec::new();
        comment_header.extend_from_slice(b"OpusTags");
        let vendor = env!("CARGO_PKG_NAME").as_bytes();
        comment_header.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        comment_header.extend_from_slice(vendor);
        comment_header.extend_from_slice(&0u32.to_le_bytes()); // No user comments

        writer
            .write_packet(comment_header, self.serial, PacketWriteEndInfo::EndPage, 0)
            .map_err(|e| EncodingError::OggWrite(e.to_string()))?;

        Ok(())
    }
}

/// Generate a pseudo-random serial number for the Ogg stream
fn rand_serial() -> u32 {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    (duration.as_secs() as u32) ^ duration.subsec_nanos()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encoder_creates_for_supported_rate() {
        assert!(OpusEncoder::new(48000, 2, 128_000).is_ok());
        assert!(OpusEncoder::new(16000, 1, 16_000).is_ok());
    }

    #[test]
    fn unsupported_rate_is_rejected() {
        let err = OpusEncoder::new(44100, 2, 128_000).err().unwrap();
        assert!(matches!(err, EncodingError::Unsupported(_)));
    }

    #[test]
    fn encode_silence() {
        let mut encoder = OpusEncoder::new(16000, 1, 16_000).unwrap();
        let silence = vec![0i16; 16000];
        let ogg_data = encoder.encode_to_ogg(&silence).unwrap();
        assert!(ogg_data.len() > 50);
        assert!(ogg_data.starts_with(b"OggS"));
    }

    #[test]
    fn frame_size_is_20ms() {
        let encoder = OpusEncoder::new(16000, 1, 16_000).unwrap();
        assert_eq!(encoder.frame_size(), 320);
    }
}
