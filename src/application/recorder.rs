//! Audio recorder service: the adapter between an application and a
//! recording backend.
//!
//! The recorder forwards commands to its [`RecorderBackend`] and relays the
//! states the backend reports. It never originates a transition itself.
//! Mutating commands are serialized and checked against the last reported
//! state, so e.g. pausing while stopped fails without reaching the backend.
//!
//! A mutating backend call runs in its own task holding the command lock.
//! A timeout only stops waiting for it: the call still finishes and reports,
//! and the next command waits until it has.

use std::future::Future;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration as StdDuration;

use thiserror::Error;
use tokio::sync::{watch, Mutex, OwnedMutexGuard};

use crate::domain::error::ConfigurationError;
use crate::domain::platform::Platform;
use crate::domain::recording::{
    AudioEncoder, InputDevice, InvalidStateTransition, RecorderConfiguration, RecorderState,
    RecordingArtifact, SessionCommand, StateChangeEvent,
};

use super::ports::{BackendError, RecorderBackend, StartRequest};
use super::services::{Service, ServiceContext};
use super::state_relay::{StateObserver, StateRelay};

/// Default deadline for a recorder operation
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Errors surfaced by the recorder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Unsupported configuration: {0}")]
    UnsupportedConfiguration(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: StdDuration,
    },

    #[error("Microphone permission denied")]
    PermissionDenied,

    #[error(transparent)]
    InvalidState(#[from] InvalidStateTransition),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigurationError),

    #[error("An output path is required on {0}")]
    MissingOutputPath(Platform),

    #[error("Recorder is not registered in a service collection")]
    NotRegistered,

    #[error(transparent)]
    Backend(BackendError),
}

/// Audio recorder service.
///
/// Must be registered in a
/// [`ServiceCollection`](super::services::ServiceCollection) before use.
pub struct AudioRecorder<B: RecorderBackend> {
    backend: Arc<B>,
    configuration: RwLock<RecorderConfiguration>,
    relay: StateRelay,
    commands: Arc<Mutex<()>>,
    context: RwLock<Option<ServiceContext>>,
}

impl<B: RecorderBackend> AudioRecorder<B> {
    /// Create a recorder over `backend` with the default configuration
    pub fn new(backend: B) -> Self {
        Self::with_configuration(backend, RecorderConfiguration::default())
    }

    /// Create a recorder with a default configuration
    pub fn with_configuration(backend: B, configuration: RecorderConfiguration) -> Self {
        let relay = StateRelay::new();
        backend.attach(relay.reporter());
        Self {
            backend: Arc::new(backend),
            configuration: RwLock::new(configuration),
            relay,
            commands: Arc::new(Mutex::new(())),
            context: RwLock::new(None),
        }
    }

    /// The backend this recorder drives
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Default configuration used when a start passes none
    pub fn configuration(&self) -> RecorderConfiguration {
        self.configuration
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Replace the default configuration.
    ///
    /// A session in progress keeps the configuration it started with.
    pub fn set_configuration(&self, configuration: RecorderConfiguration) {
        *self
            .configuration
            .write()
            .unwrap_or_else(|e| e.into_inner()) = configuration;
    }

    /// Install the state change observer, replacing any previous one
    pub fn on_state_change<F>(&self, observer: F)
    where
        F: Fn(StateChangeEvent) + Send + Sync + 'static,
    {
        let observer: StateObserver = Arc::new(observer);
        self.relay.set_observer(observer);
    }

    /// Remove the state change observer
    pub fn clear_state_change(&self) {
        self.relay.clear_observer();
    }

    /// Last-value-wins view of the reported state
    pub fn state_watch(&self) -> watch::Receiver<RecorderState> {
        self.relay.subscribe()
    }

    /// Last state reported by the backend
    pub fn state(&self) -> RecorderState {
        self.relay.state()
    }

    /// Platform of the collection this recorder is mounted in
    pub fn platform(&self) -> Option<Platform> {
        self.context().map(|c| c.platform)
    }

    fn context(&self) -> Option<ServiceContext> {
        *self.context.read().unwrap_or_else(|e| e.into_inner())
    }

    fn require_context(&self) -> Result<ServiceContext, RecorderError> {
        self.context().ok_or(RecorderError::NotRegistered)
    }

    /// Start recording.
    ///
    /// Uses `configuration`, or the default configuration when `None`.
    /// `output_path` is required on every platform but the web.
    /// Starting while a session is in progress fails with `InvalidState`
    /// and leaves that session untouched.
    pub async fn start_recording(
        &self,
        output_path: Option<PathBuf>,
        configuration: Option<RecorderConfiguration>,
        timeout: Option<StdDuration>,
    ) -> Result<(), RecorderError> {
        let context = self.require_context()?;
        let configuration = configuration.unwrap_or_else(|| self.configuration());
        configuration.validate()?;

        if output_path.is_none() && !context.platform.is_web() {
            return Err(RecorderError::MissingOutputPath(context.platform));
        }

        self.deadline("start_recording", timeout, async {
            let guard = Arc::clone(&self.commands).lock_owned().await;
            self.relay.check(SessionCommand::Start)?;

            if !self.backend.has_permission().await.map_err(Self::map_query)? {
                return Err(RecorderError::PermissionDenied);
            }

            let encoder = configuration.encoder();
            if !self
                .backend
                .is_supported_encoder(encoder)
                .await
                .map_err(Self::map_query)?
            {
                return Err(RecorderError::UnsupportedConfiguration(format!(
                    "encoder {} is not supported on {}",
                    encoder, context.platform
                )));
            }

            tracing::debug!(%encoder, path = ?output_path, "starting recording");
            let request = StartRequest {
                output_path,
                configuration,
            };
            self.detached(guard, move |backend| async move { backend.start(request).await })
                .await
                .map_err(|e| self.map_command(e, SessionCommand::Start))
        })
        .await
    }

    /// Stop recording and return a reference to the produced audio.
    pub async fn stop_recording(
        &self,
        timeout: Option<StdDuration>,
    ) -> Result<Option<RecordingArtifact>, RecorderError> {
        self.require_context()?;
        self.deadline("stop_recording", timeout, async {
            let guard = Arc::clone(&self.commands).lock_owned().await;
            self.relay.check(SessionCommand::Stop)?;
            tracing::debug!("stopping recording");
            self.detached(guard, |backend| async move { backend.stop().await })
                .await
                .map_err(|e| self.map_command(e, SessionCommand::Stop))
        })
        .await
    }

    /// Abort recording and discard the audio.
    pub async fn cancel_recording(&self, timeout: Option<StdDuration>) -> Result<(), RecorderError> {
        self.command("cancel_recording", SessionCommand::Cancel, timeout, |backend| async move {
            backend.cancel().await
        })
        .await
    }

    /// Pause an active recording.
    pub async fn pause_recording(&self, timeout: Option<StdDuration>) -> Result<(), RecorderError> {
        self.command("pause_recording", SessionCommand::Pause, timeout, |backend| async move {
            backend.pause().await
        })
        .await
    }

    /// Resume a paused recording.
    pub async fn resume_recording(&self, timeout: Option<StdDuration>) -> Result<(), RecorderError> {
        self.command("resume_recording", SessionCommand::Resume, timeout, |backend| async move {
            backend.resume().await
        })
        .await
    }

    pub async fn is_recording(&self, timeout: Option<StdDuration>) -> Result<bool, RecorderError> {
        self.query("is_recording", timeout, self.backend.is_recording())
            .await
    }

    pub async fn is_paused(&self, timeout: Option<StdDuration>) -> Result<bool, RecorderError> {
        self.query("is_paused", timeout, self.backend.is_paused())
            .await
    }

    /// Check whether `encoder` can be used on this platform.
    pub async fn is_supported_encoder(
        &self,
        encoder: AudioEncoder,
        timeout: Option<StdDuration>,
    ) -> Result<bool, RecorderError> {
        self.query(
            "is_supported_encoder",
            timeout,
            self.backend.is_supported_encoder(encoder),
        )
        .await
    }

    /// List the available input devices. Empty when there are none.
    pub async fn get_input_devices(
        &self,
        timeout: Option<StdDuration>,
    ) -> Result<Vec<InputDevice>, RecorderError> {
        self.query(
            "get_input_devices",
            timeout,
            self.backend.list_input_devices(),
        )
        .await
    }

    /// Check microphone permission. Has no effect on the session.
    pub async fn has_permission(&self, timeout: Option<StdDuration>) -> Result<bool, RecorderError> {
        self.query("has_permission", timeout, self.backend.has_permission())
            .await
    }

    async fn command<F, Fut>(
        &self,
        operation: &'static str,
        command: SessionCommand,
        timeout: Option<StdDuration>,
        call: F,
    ) -> Result<(), RecorderError>
    where
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), BackendError>> + Send + 'static,
    {
        self.require_context()?;
        self.deadline(operation, timeout, async {
            let guard = Arc::clone(&self.commands).lock_owned().await;
            self.relay.check(command)?;
            tracing::debug!(%command, "forwarding command");
            self.detached(guard, call)
                .await
                .map_err(|e| self.map_command(e, command))
        })
        .await
    }

    /// Run a backend call on its own task, holding `guard` until it returns.
    ///
    /// Dropping the returned future leaves the task running.
    async fn detached<T, F, Fut>(
        &self,
        guard: OwnedMutexGuard<()>,
        call: F,
    ) -> Result<T, BackendError>
    where
        T: Send + 'static,
        F: FnOnce(Arc<B>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, BackendError>> + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        let task = tokio::spawn(async move {
            let result = call(backend).await;
            drop(guard);
            result
        });
        task.await
            .map_err(|e| BackendError::RecordingFailed(format!("Backend task failed: {}", e)))?
    }

    async fn query<T, Fut>(
        &self,
        operation: &'static str,
        timeout: Option<StdDuration>,
        call: Fut,
    ) -> Result<T, RecorderError>
    where
        Fut: Future<Output = Result<T, BackendError>>,
    {
        self.require_context()?;
        self.deadline(operation, timeout, async { call.await.map_err(Self::map_query) })
            .await
    }

    /// Run `fut` under `timeout`. On expiry the backend operation keeps
    /// running and its outcome is unknown.
    async fn deadline<T, Fut>(
        &self,
        operation: &'static str,
        timeout: Option<StdDuration>,
        fut: Fut,
    ) -> Result<T, RecorderError>
    where
        Fut: Future<Output = Result<T, RecorderError>>,
    {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, fut).await.map_err(|_| {
                tracing::warn!(operation, ?limit, "recorder operation timed out");
                RecorderError::Timeout {
                    operation,
                    timeout: limit,
                }
            })?,
            None => fut.await,
        }
    }

    fn map_command(&self, error: BackendError, command: SessionCommand) -> RecorderError {
        match error {
            BackendError::NotRecording | BackendError::AlreadyRecording => {
                RecorderError::InvalidState(InvalidStateTransition {
                    current_state: self.relay.state(),
                    action: command,
                })
            }
            other => Self::map_query(other),
        }
    }

    fn map_query(error: BackendError) -> RecorderError {
        match error {
            BackendError::UnsupportedEncoder(encoder) => RecorderError::UnsupportedConfiguration(
                format!("encoder {} is not supported", encoder),
            ),
            BackendError::UnsupportedConfiguration(message) => {
                RecorderError::UnsupportedConfiguration(message)
            }
            BackendError::PermissionDenied => RecorderError::PermissionDenied,
            other => RecorderError::Backend(other),
        }
    }
}

impl<B: RecorderBackend> AudioRecorder<B> {
    /// Pause without waiting for the outcome. Failures are logged.
    pub fn pause(self: &Arc<Self>, timeout: Option<StdDuration>) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = recorder.pause_recording(timeout).await {
                tracing::warn!(error = %e, "pause failed");
            }
        });
    }

    /// Resume without waiting for the outcome. Failures are logged.
    pub fn resume(self: &Arc<Self>, timeout: Option<StdDuration>) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = recorder.resume_recording(timeout).await {
                tracing::warn!(error = %e, "resume failed");
            }
        });
    }

    /// Cancel without waiting for the outcome. Failures are logged.
    pub fn cancel(self: &Arc<Self>, timeout: Option<StdDuration>) {
        let recorder = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = recorder.cancel_recording(timeout).await {
                tracing::warn!(error = %e, "cancel failed");
            }
        });
    }
}

impl<B: RecorderBackend> Service for AudioRecorder<B> {
    fn name(&self) -> &str {
        "AudioRecorder"
    }

    fn did_mount(&self, context: &ServiceContext) {
        *self.context.write().unwrap_or_else(|e| e.into_inner()) = Some(*context);
    }

    fn will_unmount(&self) {
        *self.context.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}
