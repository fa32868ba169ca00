//! Simulated recording backend for testing without hardware.
//!
//! Sessions behave like a real backend, reporting every transition, but
//! produce a WAV of silence sized by how long the session was recording.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::encoding::write_artifact;
use super::lock;
use super::wav_encoder::encode_to_wav;
use crate::application::ports::{BackendError, RecorderBackend, StartRequest};
use crate::application::StateReporter;
use crate::domain::recording::{
    AudioEncoder, InputDevice, RecorderState, RecordingArtifact,
};

/// Sample rate of the generated silence
const SIMULATED_SAMPLE_RATE: u32 = 16_000;

/// Silence kept for sessions too short to measure
const MIN_FRAMES: usize = 160;

struct SimulatedSession {
    request: StartRequest,
    paused: bool,
    /// Time spent recording before the current segment
    recorded: Duration,
    /// Start of the current recording segment, `None` while paused
    segment_start: Option<Instant>,
}

impl SimulatedSession {
    fn elapsed(&self) -> Duration {
        self.recorded + self.segment_start.map(|s| s.elapsed()).unwrap_or_default()
    }
}

/// In-memory recording backend.
///
/// ```
/// use audio_recorder::infrastructure::recording::SimulatedBackend;
/// use audio_recorder::domain::AudioEncoder;
///
/// let backend = SimulatedBackend::new()
///     .with_supported_encoders([AudioEncoder::Wav])
///     .with_permission(false);
/// ```
pub struct SimulatedBackend {
    reporter: Mutex<Option<StateReporter>>,
    session: Mutex<Option<SimulatedSession>>,
    supported: HashSet<AudioEncoder>,
    devices: Vec<InputDevice>,
    permission: AtomicBool,
    latency: Mutex<Duration>,
    permission_queries: AtomicUsize,
}

impl SimulatedBackend {
    /// A backend supporting every encoder, with one device and permission granted
    pub fn new() -> Self {
        Self {
            reporter: Mutex::new(None),
            session: Mutex::new(None),
            supported: AudioEncoder::ALL.into_iter().collect(),
            devices: vec![InputDevice::new("simulated-0", "Simulated Microphone")],
            permission: AtomicBool::new(true),
            latency: Mutex::new(Duration::ZERO),
            permission_queries: AtomicUsize::new(0),
        }
    }

    pub fn with_supported_encoders(
        mut self,
        encoders: impl IntoIterator<Item = AudioEncoder>,
    ) -> Self {
        self.supported = encoders.into_iter().collect();
        self
    }

    pub fn with_devices(mut self, devices: Vec<InputDevice>) -> Self {
        self.devices = devices;
        self
    }

    pub fn with_permission(self, granted: bool) -> Self {
        self.set_permission(granted);
        self
    }

    /// Delay applied to every operation
    pub fn with_latency(self, latency: Duration) -> Self {
        self.set_latency(latency);
        self
    }

    pub fn set_permission(&self, granted: bool) {
        self.permission.store(granted, Ordering::SeqCst);
    }

    pub fn set_latency(&self, latency: Duration) {
        *lock(&self.latency) = latency;
    }

    /// Number of `has_permission` calls served so far
    pub fn permission_queries(&self) -> usize {
        self.permission_queries.load(Ordering::SeqCst)
    }

    async fn delay(&self) {
        let latency = *lock(&self.latency);
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }

    fn report(&self, state: RecorderState) {
        let reporter = lock(&self.reporter).clone();
        if let Some(reporter) = reporter {
            reporter.report(state);
        }
    }

    fn take_session(&self) -> Result<SimulatedSession, BackendError> {
        lock(&self.session).take().ok_or(BackendError::NotRecording)
    }

    /// Set the paused flag of the running session
    fn set_paused(&self, paused: bool) -> Result<(), BackendError> {
        let mut guard = lock(&self.session);
        let session = guard.as_mut().ok_or(BackendError::NotRecording)?;
        if session.paused == paused {
            return Ok(());
        }
        session.paused = paused;
        if paused {
            session.recorded = session.elapsed();
            session.segment_start = None;
        } else {
            session.segment_start = Some(Instant::now());
        }
        Ok(())
    }
}

impl Default for SimulatedBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn silence_for(elapsed: Duration, channels: u16) -> Vec<i16> {
    let frames = (SIMULATED_SAMPLE_RATE as u128 * elapsed.as_millis() / 1000) as usize;
    vec![0i16; frames.max(MIN_FRAMES) * channels.max(1) as usize]
}

#[async_trait]
impl RecorderBackend for SimulatedBackend {
    fn attach(&self, reporter: StateReporter) {
        *lock(&self.reporter) = Some(reporter);
    }

    async fn start(&self, request: StartRequest) -> Result<(), BackendError> {
        self.delay().await;
        let encoder = request.configuration.encoder();
        if !self.supported.contains(&encoder) {
            return Err(BackendError::UnsupportedEncoder(encoder));
        }
        if !self.permission.load(Ordering::SeqCst) {
            return Err(BackendError::PermissionDenied);
        }
        if let Some(device) = request.configuration.device() {
            if !self.devices.iter().any(|d| d.id == device.id) {
                return Err(BackendError::DeviceNotFound(device.id.clone()));
            }
        }

        {
            let mut session = lock(&self.session);
            if session.is_some() {
                return Err(BackendError::AlreadyRecording);
            }
            *session = Some(SimulatedSession {
                request,
                paused: false,
                recorded: Duration::ZERO,
                segment_start: Some(Instant::now()),
            });
        }
        self.report(RecorderState::Recording);
        Ok(())
    }

    async fn stop(&self) -> Result<Option<RecordingArtifact>, BackendError> {
        self.delay().await;
        let session = self.take_session()?;
        self.report(RecorderState::Stopped);

        let elapsed = session.elapsed();
        let configuration = session.request.configuration;
        let samples = silence_for(elapsed, configuration.channels());
        let wav = encode_to_wav(&samples, SIMULATED_SAMPLE_RATE, configuration.channels())?;
        tracing::debug!(?elapsed, size = wav.len(), "simulated recording finished");

        write_artifact(wav, AudioEncoder::Wav, session.request.output_path)
            .await
            .map(Some)
    }

    async fn cancel(&self) -> Result<(), BackendError> {
        self.delay().await;
        self.take_session()?;
        self.report(RecorderState::Stopped);
        Ok(())
    }

    async fn pause(&self) -> Result<(), BackendError> {
        self.delay().await;
        self.set_paused(true)?;
        self.report(RecorderState::Paused);
        Ok(())
    }

    async fn resume(&self) -> Result<(), BackendError> {
        self.delay().await;
        self.set_paused(false)?;
        self.report(RecorderState::Recording);
        Ok(())
    }

    async fn is_recording(&self) -> Result<bool, BackendError> {
        self.delay().await;
        Ok(lock(&self.session).is_some())
    }

    async fn is_paused(&self) -> Result<bool, BackendError> {
        self.delay().await;
        Ok(lock(&self.session).as_ref().is_some_and(|s| s.paused))
    }

    async fn is_supported_encoder(&self, encoder: AudioEncoder) -> Result<bool, BackendError> {
        self.delay().await;
        Ok(self.supported.contains(&encoder))
    }

    async fn list_input_devices(&self) -> Result<Vec<InputDevice>, BackendError> {
        self.delay().await;
        Ok(self.devices.clone())
    }

    async fn has_permission(&self) -> Result<bool, BackendError> {
        self.delay().await;
        self.permission_queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.permission.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::recording::RecorderConfiguration;

    fn request() -> StartRequest {
        StartRequest {
            output_path: None,
            configuration: RecorderConfiguration::default(),
        }
    }

    #[test]
    fn silence_scales_with_elapsed_time() {
        assert_eq!(silence_for(Duration::from_millis(100), 1).len(), 1600);
        assert_eq!(silence_for(Duration::from_millis(100), 2).len(), 3200);
        assert_eq!(silence_for(Duration::ZERO, 1).len(), MIN_FRAMES);
    }

    #[tokio::test]
    async fn stop_without_path_returns_wav_bytes() {
        let backend = SimulatedBackend::new();
        backend.start(request()).await.unwrap();
        let artifact = backend.stop().await.unwrap().unwrap();
        let audio = artifact.audio().unwrap();
        assert!(audio.data().starts_with(b"RIFF"));
        assert!(!artifact.is_empty());
    }

    #[tokio::test]
    async fn second_start_is_rejected() {
        let backend = SimulatedBackend::new();
        backend.start(request()).await.unwrap();
        assert_eq!(
            backend.start(request()).await.unwrap_err(),
            BackendError::AlreadyRecording
        );
    }

    #[tokio::test]
    async fn unsupported_encoder_is_rejected() {
        let backend = SimulatedBackend::new().with_supported_encoders([AudioEncoder::Wav]);
        let mut req = request();
        req.configuration = RecorderConfiguration::new().with_encoder(AudioEncoder::Opus);
        assert_eq!(
            backend.start(req).await.unwrap_err(),
            BackendError::UnsupportedEncoder(AudioEncoder::Opus)
        );
    }

    #[tokio::test]
    async fn pause_tracks_flag() {
        let backend = SimulatedBackend::new();
        assert_eq!(backend.pause().await.unwrap_err(), BackendError::NotRecording);
        backend.start(request()).await.unwrap();
        backend.pause().await.unwrap();
        assert!(backend.is_paused().await.unwrap());
        backend.resume().await.unwrap();
        assert!(!backend.is_paused().await.unwrap());
    }

    #[tokio::test]
    async fn permission_queries_are_counted() {
        let backend = SimulatedBackend::new().with_permission(false);
        assert!(!backend.has_permission().await.unwrap());
        assert!(!backend.has_permission().await.unwrap());
        assert_eq!(backend.permission_queries(), 2);
    }
}
