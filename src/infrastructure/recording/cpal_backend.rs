//! Desktop recording backend using cpal
//!
//! Capture runs on a dedicated thread since `cpal::Stream` is not `Send`.
//! Samples are kept mono at the device rate and only shaped into the
//! configured rate and channel layout on stop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::thread::JoinHandle;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, SampleRate, StreamConfig};
use tokio::sync::{oneshot, Mutex, OnceCell};

use super::encoding::{check_options, encode, in_process_supported, write_artifact};
use super::ffmpeg::FfmpegTranscoder;
use super::lock;
use super::processing::{
    downmix_to_mono, expand_channels, f32_to_i16, noise_gate, normalize_peak, resample,
    NOISE_GATE_THRESHOLD, NORMALIZE_TARGET_PEAK,
};
use crate::application::ports::{BackendError, RecorderBackend, StartRequest};
use crate::application::StateReporter;
use crate::domain::recording::{
    AudioEncoder, InputDevice, RecorderConfiguration, RecorderState, RecordingArtifact,
};

/// How often the capture thread checks for a stop request
const CAPTURE_POLL: std::time::Duration = std::time::Duration::from_millis(20);

/// Handle on the capture side shared with the stream callback
#[derive(Clone)]
struct CaptureSink {
    buffer: Arc<StdMutex<Vec<i16>>>,
    paused: Arc<AtomicBool>,
    device_sample_rate: Arc<AtomicU32>,
}

impl CaptureSink {
    fn push(&self, mono: &[i16]) {
        // Paused frames are dropped
        if self.paused.load(Ordering::SeqCst) {
            return;
        }
        lock(&self.buffer).extend_from_slice(mono);
    }
}

/// A running capture thread and the request it serves
struct ActiveCapture {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
    request: StartRequest,
}

/// Recording backend for desktop hosts
pub struct CpalBackend {
    reporter: StdMutex<Option<StateReporter>>,
    sink: CaptureSink,
    active: Mutex<Option<ActiveCapture>>,
    transcoder: FfmpegTranscoder,
    transcoder_available: OnceCell<bool>,
}

impl CpalBackend {
    pub fn new() -> Self {
        Self::with_transcoder(FfmpegTranscoder::new())
    }

    /// Create a backend that transcodes AAC and AMR with `transcoder`
    pub fn with_transcoder(transcoder: FfmpegTranscoder) -> Self {
        Self {
            reporter: StdMutex::new(None),
            sink: CaptureSink {
                buffer: Arc::new(StdMutex::new(Vec::new())),
                paused: Arc::new(AtomicBool::new(false)),
                device_sample_rate: Arc::new(AtomicU32::new(0)),
            },
            active: Mutex::new(None),
            transcoder,
            transcoder_available: OnceCell::new(),
        }
    }

    fn report(&self, state: RecorderState) {
        let reporter = lock(&self.reporter).clone();
        if let Some(reporter) = reporter {
            reporter.report(state);
        }
    }

    async fn supports(&self, encoder: AudioEncoder) -> bool {
        if in_process_supported(encoder) {
            return true;
        }
        if !encoder.requires_transcoder() {
            return false;
        }
        *self
            .transcoder_available
            .get_or_init(|| self.transcoder.is_available())
            .await
    }

    /// End the capture thread and take what it recorded
    async fn finish_capture(&self, capture: ActiveCapture) -> Result<Vec<i16>, BackendError> {
        capture.running.store(false, Ordering::SeqCst);
        let handle = capture.handle;
        tokio::task::spawn_blocking(move || handle.join())
            .await
            .map_err(|e| BackendError::RecordingFailed(format!("Task join error: {}", e)))?
            .map_err(|_| BackendError::RecordingFailed("Capture thread panicked".into()))?;

        self.sink.paused.store(false, Ordering::SeqCst);
        Ok(std::mem::take(&mut *lock(&self.sink.buffer)))
    }

    fn find_input_device(device_id: Option<&str>) -> Result<cpal::Device, BackendError> {
        let host = cpal::default_host();
        let Some(id) = device_id else {
            return host.default_input_device().ok_or(BackendError::NoAudioDevice);
        };

        host.input_devices()
            .map_err(|e| BackendError::StartFailed(format!("Failed to list devices: {}", e)))?
            .find(|device| device.name().map(|name| name == id).unwrap_or(false))
            .ok_or_else(|| BackendError::DeviceNotFound(id.to_string()))
    }

    /// Pick an i16/f32 input config, preferring fewer channels and the
    /// configured rate
    fn input_config(
        device: &cpal::Device,
        target_rate: u32,
    ) -> Result<(StreamConfig, SampleFormat), BackendError> {
        let supported_configs = device
            .supported_input_configs()
            .map_err(|e| BackendError::StartFailed(format!("Failed to get configs: {}", e)))?;

        let includes = |config: &cpal::SupportedStreamConfigRange| {
            config.min_sample_rate().0 <= target_rate && config.max_sample_rate().0 >= target_rate
        };

        let mut best_config: Option<cpal::SupportedStreamConfigRange> = None;
        for config in supported_configs {
            if config.sample_format() != SampleFormat::I16
                && config.sample_format() != SampleFormat::F32
            {
                continue;
            }

            let is_better = match &best_config {
                None => true,
                Some(current) => {
                    let fewer_channels = config.channels() < current.channels();
                    let better_rate = includes(&config) && !includes(current);
                    better_rate || (fewer_channels && includes(&config) == includes(current))
                }
            };
            if is_better {
                best_config = Some(config);
            }
        }

        let config_range = best_config
            .ok_or_else(|| BackendError::StartFailed("No suitable config found".into()))?;

        let sample_rate = if includes(&config_range) {
            SampleRate(target_rate)
        } else {
            config_range.max_sample_rate()
        };

        let sample_format = config_range.sample_format();
        let config = StreamConfig {
            channels: config_range.channels(),
            sample_rate,
            buffer_size: cpal::BufferSize::Default,
        };

        Ok((config, sample_format))
    }

    fn open_stream(
        device_id: Option<&str>,
        target_rate: u32,
        sink: &CaptureSink,
    ) -> Result<cpal::Stream, BackendError> {
        let device = Self::find_input_device(device_id)?;
        let (config, sample_format) = Self::input_config(&device, target_rate)?;
        let channels = config.channels;
        sink.device_sample_rate
            .store(config.sample_rate.0, Ordering::SeqCst);

        tracing::debug!(
            device = %device.name().unwrap_or_default(),
            sample_rate = config.sample_rate.0,
            channels,
            ?sample_format,
            "opening input stream"
        );

        let on_error = |err: cpal::StreamError| tracing::error!(error = %err, "audio stream error");

        let stream = match sample_format {
            SampleFormat::I16 => {
                let sink = sink.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        sink.push(&downmix_to_mono(data, channels));
                    },
                    on_error,
                    None,
                )
            }
            SampleFormat::F32 => {
                let sink = sink.clone();
                device.build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        sink.push(&downmix_to_mono(&f32_to_i16(data), channels));
                    },
                    on_error,
                    None,
                )
            }
            other => {
                return Err(BackendError::StartFailed(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream.map_err(|e| BackendError::StartFailed(e.to_string()))
    }

    fn run_capture(
        device_id: Option<String>,
        target_rate: u32,
        sink: CaptureSink,
        running: Arc<AtomicBool>,
        ready: oneshot::Sender<Result<(), BackendError>>,
    ) {
        let stream = match Self::open_stream(device_id.as_deref(), target_rate, &sink) {
            Ok(stream) => stream,
            Err(e) => {
                let _ = ready.send(Err(e));
                return;
            }
        };

        if let Err(e) = stream.play() {
            let _ = ready.send(Err(BackendError::StartFailed(e.to_string())));
            return;
        }
        let _ = ready.send(Ok(()));

        while running.load(Ordering::SeqCst) {
            std::thread::sleep(CAPTURE_POLL);
        }
        drop(stream);
    }
}

impl Default for CpalBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Shape mono device-rate samples into the configured layout
fn shape_samples(
    samples: &[i16],
    device_rate: u32,
    configuration: &RecorderConfiguration,
) -> Result<Vec<i16>, BackendError> {
    let mut mono = resample(samples, device_rate, configuration.sample_rate())?;
    if configuration.suppress_noise() {
        noise_gate(&mut mono, NOISE_GATE_THRESHOLD);
    }
    if configuration.auto_gain() {
        normalize_peak(&mut mono, NORMALIZE_TARGET_PEAK);
    }
    Ok(expand_channels(&mono, configuration.channels()))
}

#[async_trait]
impl RecorderBackend for CpalBackend {
    fn attach(&self, reporter: StateReporter) {
        *lock(&self.reporter) = Some(reporter);
    }

    async fn start(&self, request: StartRequest) -> Result<(), BackendError> {
        let mut active = self.active.lock().await;
        if active.is_some() {
            return Err(BackendError::AlreadyRecording);
        }

        let configuration = &request.configuration;
        let encoder = configuration.encoder();
        if !self.supports(encoder).await {
            return Err(BackendError::UnsupportedEncoder(encoder));
        }
        check_options(configuration)?;
        if configuration.cancel_echo() {
            tracing::warn!("echo cancellation is not available on this host, ignoring");
        }

        lock(&self.sink.buffer).clear();
        self.sink.paused.store(false, Ordering::SeqCst);

        let running = Arc::new(AtomicBool::new(true));
        let (ready_tx, ready_rx) = oneshot::channel();
        let device_id = configuration.device().map(|d| d.id.clone());
        let target_rate = configuration.sample_rate();
        let sink = self.sink.clone();
        let thread_running = Arc::clone(&running);

        let handle = std::thread::Builder::new()
            .name("audio-capture".into())
            .spawn(move || Self::run_capture(device_id, target_rate, sink, thread_running, ready_tx))
            .map_err(|e| BackendError::StartFailed(e.to_string()))?;

        // Held before waiting so the thread can always be stopped
        *active = Some(ActiveCapture {
            running,
            handle,
            request,
        });

        let failure = match ready_rx.await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(_) => Some(BackendError::StartFailed(
                "Capture thread exited before starting".into(),
            )),
        };
        if let Some(error) = failure {
            if let Some(capture) = active.take() {
                // The thread has already returned; this only reaps it
                let _ = self.finish_capture(capture).await;
            }
            return Err(error);
        }
        drop(active);

        self.report(RecorderState::Recording);
        Ok(())
    }

    async fn stop(&self) -> Result<Option<RecordingArtifact>, BackendError> {
        let capture = self
            .active
            .lock()
            .await
            .take()
            .ok_or(BackendError::NotRecording)?;
        // The session is gone once taken, whatever happens below
        self.report(RecorderState::Stopped);

        let request = capture.request.clone();
        let samples = self.finish_capture(capture).await?;
        let device_rate = self.sink.device_sample_rate.load(Ordering::SeqCst);

        let configuration = request.configuration;
        tracing::debug!(
            samples = samples.len(),
            device_rate,
            encoder = %configuration.encoder(),
            "finalizing recording"
        );

        let shaping_config = configuration.clone();
        let shaped =
            tokio::task::spawn_blocking(move || shape_samples(&samples, device_rate, &shaping_config))
                .await
                .map_err(|e| BackendError::RecordingFailed(format!("Task join error: {}", e)))??;

        let encoder = configuration.encoder();
        let bytes = encode(
            encoder,
            shaped,
            configuration.sample_rate(),
            configuration.channels(),
            configuration.bit_rate(),
            &self.transcoder,
        )
        .await?;

        write_artifact(bytes, encoder, request.output_path)
            .await
            .map(Some)
    }

    async fn cancel(&self) -> Result<(), BackendError> {
        let capture = self
            .active
            .lock()
            .await
            .take()
            .ok_or(BackendError::NotRecording)?;
        self.report(RecorderState::Stopped);

        let discarded = self.finish_capture(capture).await?;
        tracing::debug!(samples = discarded.len(), "recording discarded");
        Ok(())
    }

    async fn pause(&self) -> Result<(), BackendError> {
        if self.active.lock().await.is_none() {
            return Err(BackendError::NotRecording);
        }
        self.sink.paused.store(true, Ordering::SeqCst);
        self.report(RecorderState::Paused);
        Ok(())
    }

    async fn resume(&self) -> Result<(), BackendError> {
        if self.active.lock().await.is_none() {
            return Err(BackendError::NotRecording);
        }
        self.sink.paused.store(false, Ordering::SeqCst);
        self.report(RecorderState::Recording);
        Ok(())
    }

    async fn is_recording(&self) -> Result<bool, BackendError> {
        Ok(self.active.lock().await.is_some())
    }

    async fn is_paused(&self) -> Result<bool, BackendError> {
        let active = self.active.lock().await.is_some();
        Ok(active && self.sink.paused.load(Ordering::SeqCst))
    }

    async fn is_supported_encoder(&self, encoder: AudioEncoder) -> Result<bool, BackendError> {
        Ok(self.supports(encoder).await)
    }

    async fn list_input_devices(&self) -> Result<Vec<InputDevice>, BackendError> {
        tokio::task::spawn_blocking(|| -> Result<Vec<InputDevice>, BackendError> {
            let devices = cpal::default_host()
                .input_devices()
                .map_err(|e| BackendError::RecordingFailed(format!("Failed to list devices: {}", e)))?;
            Ok(devices
                .filter_map(|device| device.name().ok())
                .map(|name| InputDevice::new(name.clone(), name))
                .collect())
        })
        .await
        .map_err(|e| BackendError::RecordingFailed(format!("Task join error: {}", e)))?
    }

    async fn has_permission(&self) -> Result<bool, BackendError> {
        tokio::task::spawn_blocking(|| cpal::default_host().input_devices().is_ok())
            .await
            .map_err(|e| BackendError::RecordingFailed(format!("Task join error: {}", e)))
    }
}
