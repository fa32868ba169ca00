//! FFmpeg transcoder for the AAC and AMR encoders

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::fs;
use tokio::process::Command;

use super::encoding::EncodingError;
use crate::domain::recording::AudioEncoder;

/// Temp file removed on drop
struct TempAudioFile {
    path: PathBuf,
}

impl TempAudioFile {
    fn new(extension: &str) -> Self {
        let timestamp = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let path = std::env::temp_dir().join(format!(
            "audio-recorder-{}-{}.{}",
            std::process::id(),
            timestamp,
            extension
        ));
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempAudioFile {
    fn drop(&mut self) {
        // Best-effort cleanup
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Transcodes WAV audio through an `ffmpeg` executable
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    program: PathBuf,
}

impl FfmpegTranscoder {
    /// Use `ffmpeg` from `PATH`
    pub fn new() -> Self {
        Self::with_program("ffmpeg")
    }

    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Whether the executable can be run
    pub async fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Build the output arguments for `encoder`
    fn build_codec_args(encoder: AudioEncoder, bit_rate: u32) -> Result<Vec<String>, EncodingError> {
        let mut args: Vec<String> = match encoder {
            AudioEncoder::AacLc => vec!["-c:a", "aac", "-profile:a", "aac_low"],
            AudioEncoder::AacHe => vec!["-c:a", "aac", "-profile:a", "aac_he"],
            AudioEncoder::AacEld => vec!["-c:a", "aac", "-profile:a", "aac_ld"],
            // AMR is narrowband mono
            AudioEncoder::AmrNb => vec!["-c:a", "libopencore_amrnb", "-ar", "8000", "-ac", "1"],
            AudioEncoder::AmrWb => vec!["-c:a", "libvo_amrwbenc", "-ar", "16000", "-ac", "1"],
            other => {
                return Err(EncodingError::Unsupported(format!(
                    "{} is not transcoded with FFmpeg",
                    other
                )))
            }
        }
        .into_iter()
        .map(String::from)
        .collect();

        args.push("-b:a".to_string());
        args.push(bit_rate.to_string());
        Ok(args)
    }

    /// Convert a WAV file in memory to `encoder`
    pub async fn transcode(
        &self,
        wav: &[u8],
        encoder: AudioEncoder,
        bit_rate: u32,
    ) -> Result<Vec<u8>, EncodingError> {
        let codec_args = Self::build_codec_args(encoder, bit_rate)?;
        let input = TempAudioFile::new("wav");
        let output = TempAudioFile::new(encoder.extension());

        fs::write(input.path(), wav)
            .await
            .map_err(|e| EncodingError::Transcode(e.to_string()))?;

        tracing::debug!(%encoder, bit_rate, "transcoding with ffmpeg");

        let result = Command::new(&self.program)
            .args(["-hide_banner", "-loglevel", "error", "-y", "-i"])
            .arg(input.path())
            .args(&codec_args)
            .arg(output.path())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EncodingError::FfmpegNotFound
                } else {
                    EncodingError::Transcode(e.to_string())
                }
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(EncodingError::Transcode(format!(
                "FFmpeg exited with error: {}",
                stderr.lines().last().unwrap_or("unknown error")
            )));
        }

        let data = fs::read(output.path())
            .await
            .map_err(|e| EncodingError::Transcode(e.to_string()))?;
        if data.is_empty() {
            return Err(EncodingError::Transcode("FFmpeg produced no output".to_string()));
        }
        Ok(data)
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aac_profiles() {
        let args = FfmpegTranscoder::build_codec_args(AudioEncoder::AacHe, 64_000).unwrap();
        assert_eq!(args[..4], ["-c:a", "aac", "-profile:a", "aac_he"]);
        assert_eq!(args[args.len() - 1], "64000");
    }

    #[test]
    fn amr_is_mono_narrowband() {
        let args = FfmpegTranscoder::build_codec_args(AudioEncoder::AmrNb, 12_200).unwrap();
        assert!(args.contains(&"libopencore_amrnb".to_string()));
        assert!(args.contains(&"8000".to_string()));
    }

    #[test]
    fn wav_is_not_transcoded() {
        assert!(matches!(
            FfmpegTranscoder::build_codec_args(AudioEncoder::Wav, 128_000),
            Err(EncodingError::Unsupported(_))
        ));
    }

    #[test]
    fn temp_file_is_removed_on_drop() {
        let path = {
            let file = TempAudioFile::new("wav");
            std::fs::write(file.path(), b"x").unwrap();
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn missing_program_is_unavailable() {
        let transcoder = FfmpegTranscoder::with_program("/nonexistent/ffmpeg-binary");
        assert!(!transcoder.is_available().await);
        let err = transcoder
            .transcode(b"RIFF", AudioEncoder::AacLc, 64_000)
            .await
            .unwrap_err();
        assert_eq!(err, EncodingError::FfmpegNotFound);
    }
}
