//! Recording session state machine

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recorder states as reported by the backend.
///
/// `Stopped` doubles as the idle state: a session that was stopped or
/// cancelled is back to `Stopped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecorderState {
    #[default]
    Stopped,
    Recording,
    Paused,
}

impl RecorderState {
    /// Get the string representation
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Recording => "recording",
            Self::Paused => "paused",
        }
    }

    /// Whether a session is in progress (recording or paused)
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Recording | Self::Paused)
    }
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reported state transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChangeEvent {
    pub state: RecorderState,
    pub previous: RecorderState,
}

/// Commands that drive the session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    Stop,
    Cancel,
}

impl SessionCommand {
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Start => "start recording",
            Self::Pause => "pause recording",
            Self::Resume => "resume recording",
            Self::Stop => "stop recording",
            Self::Cancel => "cancel recording",
        }
    }
}

impl fmt::Display for SessionCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.action())
    }
}

/// Error when an invalid state transition is attempted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid state transition: cannot {action} while {current_state}")]
pub struct InvalidStateTransition {
    pub current_state: RecorderState,
    pub action: SessionCommand,
}

/// Recording session transition guard.
///
/// State machine:
///   STOPPED -> RECORDING (start)
///   RECORDING -> PAUSED (pause)
///   PAUSED -> RECORDING (resume)
///   RECORDING | PAUSED -> STOPPED (stop, cancel)
///
/// The guard never moves on its own: the owner syncs it from the states the
/// backend reports.
#[derive(Debug, Default)]
pub struct RecordingSession {
    state: RecorderState,
}

impl RecordingSession {
    /// Create a new session guard in stopped state
    pub fn new() -> Self {
        Self {
            state: RecorderState::Stopped,
        }
    }

    /// Get the current state
    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == RecorderState::Recording
    }

    pub fn is_paused(&self) -> bool {
        self.state == RecorderState::Paused
    }

    /// Validate `command` against the current state.
    ///
    /// Returns the state the command leads to.
    pub fn check(&self, command: SessionCommand) -> Result<RecorderState, InvalidStateTransition> {
        let next = match (command, self.state) {
            (SessionCommand::Start, RecorderState::Stopped) => RecorderState::Recording,
            (SessionCommand::Pause, RecorderState::Recording) => RecorderState::Paused,
            (SessionCommand::Resume, RecorderState::Paused) => RecorderState::Recording,
            (SessionCommand::Stop | SessionCommand::Cancel, s) if s.is_active() => {
                RecorderState::Stopped
            }
            _ => {
                return Err(InvalidStateTransition {
                    current_state: self.state,
                    action: command,
                })
            }
        };
        Ok(next)
    }

    /// Sync the guard to a state reported by the backend.
    ///
    /// Returns the previous state.
    pub fn apply_reported(&mut self, state: RecorderState) -> RecorderState {
        std::mem::replace(&mut self.state, state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_in(state: RecorderState) -> RecordingSession {
        let mut session = RecordingSession::new();
        session.apply_reported(state);
        session
    }

    #[test]
    fn new_session_is_stopped() {
        let session = RecordingSession::new();
        assert_eq!(session.state(), RecorderState::Stopped);
        assert!(!session.is_recording());
        assert!(!session.is_paused());
    }

    #[test]
    fn start_from_stopped() {
        let session = RecordingSession::new();
        assert_eq!(
            session.check(SessionCommand::Start),
            Ok(RecorderState::Recording)
        );
    }

    #[test]
    fn start_while_recording_fails() {
        let session = session_in(RecorderState::Recording);
        let err = session.check(SessionCommand::Start).unwrap_err();
        assert_eq!(err.current_state, RecorderState::Recording);
        assert_eq!(err.action, SessionCommand::Start);
    }

    #[test]
    fn start_while_paused_fails() {
        let session = session_in(RecorderState::Paused);
        assert!(session.check(SessionCommand::Start).is_err());
    }

    #[test]
    fn pause_requires_recording() {
        assert!(RecordingSession::new().check(SessionCommand::Pause).is_err());
        assert!(session_in(RecorderState::Paused)
            .check(SessionCommand::Pause)
            .is_err());
        assert_eq!(
            session_in(RecorderState::Recording).check(SessionCommand::Pause),
            Ok(RecorderState::Paused)
        );
    }

    #[test]
    fn resume_requires_paused() {
        assert!(RecordingSession::new().check(SessionCommand::Resume).is_err());
        assert!(session_in(RecorderState::Recording)
            .check(SessionCommand::Resume)
            .is_err());
        assert_eq!(
            session_in(RecorderState::Paused).check(SessionCommand::Resume),
            Ok(RecorderState::Recording)
        );
    }

    #[test]
    fn stop_and_cancel_from_active_states() {
        for state in [RecorderState::Recording, RecorderState::Paused] {
            let session = session_in(state);
            assert_eq!(session.check(SessionCommand::Stop), Ok(RecorderState::Stopped));
            assert_eq!(
                session.check(SessionCommand::Cancel),
                Ok(RecorderState::Stopped)
            );
        }
    }

    #[test]
    fn stop_and_cancel_while_stopped_fail() {
        let session = RecordingSession::new();
        assert!(session.check(SessionCommand::Stop).is_err());
        assert!(session.check(SessionCommand::Cancel).is_err());
    }

    #[test]
    fn check_does_not_move_the_guard() {
        let session = RecordingSession::new();
        session.check(SessionCommand::Start).unwrap();
        assert_eq!(session.state(), RecorderState::Stopped);
    }

    #[test]
    fn apply_reported_returns_previous() {
        let mut session = RecordingSession::new();
        assert_eq!(
            session.apply_reported(RecorderState::Recording),
            RecorderState::Stopped
        );
        assert_eq!(
            session.apply_reported(RecorderState::Paused),
            RecorderState::Recording
        );
        assert!(session.is_paused());
    }

    #[test]
    fn state_display() {
        assert_eq!(RecorderState::Stopped.to_string(), "stopped");
        assert_eq!(RecorderState::Recording.to_string(), "recording");
        assert_eq!(RecorderState::Paused.to_string(), "paused");
    }

    #[test]
    fn error_display() {
        let err = InvalidStateTransition {
            current_state: RecorderState::Stopped,
            action: SessionCommand::Pause,
        };
        let msg = err.to_string();
        assert!(msg.contains("pause recording"));
        assert!(msg.contains("stopped"));
    }
}
