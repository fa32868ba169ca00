//! Relay of backend state transitions to the embedding application
//!
//! A relay has a single observer slot and a watch channel. The observer is
//! called once per reported transition, in report order. The watch channel
//! only ever holds the latest state.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::recording::{
    InvalidStateTransition, RecorderState, RecordingSession, SessionCommand, StateChangeEvent,
};

/// Observer callback for state transitions
pub type StateObserver = Arc<dyn Fn(StateChangeEvent) + Send + Sync>;

struct RelayInner {
    session: Mutex<RecordingSession>,
    observer: Mutex<Option<StateObserver>>,
    // Held while delivering so observers see transitions in report order.
    delivery: Mutex<()>,
    watch: watch::Sender<RecorderState>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl RelayInner {
    fn report(&self, state: RecorderState) -> bool {
        let _delivery = lock(&self.delivery);

        let previous = lock(&self.session).apply_reported(state);
        if previous == state {
            return false;
        }

        self.watch.send_replace(state);
        tracing::debug!(%previous, %state, "recorder state changed");

        let observer = lock(&self.observer).clone();
        if let Some(observer) = observer {
            observer(StateChangeEvent { state, previous });
        }
        true
    }
}

/// Owner side of the relay, held by the recorder adapter.
pub struct StateRelay {
    inner: Arc<RelayInner>,
}

impl StateRelay {
    pub fn new() -> Self {
        let (watch, _) = watch::channel(RecorderState::Stopped);
        Self {
            inner: Arc::new(RelayInner {
                session: Mutex::new(RecordingSession::new()),
                observer: Mutex::new(None),
                delivery: Mutex::new(()),
                watch,
            }),
        }
    }

    /// Handle for the backend to report transitions through
    pub fn reporter(&self) -> StateReporter {
        StateReporter {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Install the observer, replacing any previous one
    pub fn set_observer(&self, observer: StateObserver) {
        *lock(&self.inner.observer) = Some(observer);
    }

    pub fn clear_observer(&self) {
        *lock(&self.inner.observer) = None;
    }

    /// Last-value-wins view of the reported state
    pub fn subscribe(&self) -> watch::Receiver<RecorderState> {
        self.inner.watch.subscribe()
    }

    /// Last reported state
    pub fn state(&self) -> RecorderState {
        lock(&self.inner.session).state()
    }

    /// Validate `command` against the last reported state
    pub fn check(&self, command: SessionCommand) -> Result<RecorderState, InvalidStateTransition> {
        lock(&self.inner.session).check(command)
    }
}

impl Default for StateRelay {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend side of the relay.
#[derive(Clone)]
pub struct StateReporter {
    inner: Arc<RelayInner>,
}

impl StateReporter {
    /// Publish a backend state.
    ///
    /// Returns `false` if `state` equals the last reported state, in which
    /// case nothing is delivered.
    pub fn report(&self, state: RecorderState) -> bool {
        self.inner.report(state)
    }

    /// Last reported state
    pub fn state(&self) -> RecorderState {
        lock(&self.inner.session).state()
    }
}

impl std::fmt::Debug for StateReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateReporter")
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_observer() -> (StateObserver, Arc<Mutex<Vec<StateChangeEvent>>>) {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let observer: StateObserver = Arc::new(move |event| sink.lock().unwrap().push(event));
        (observer, events)
    }

    #[test]
    fn new_relay_is_stopped() {
        let relay = StateRelay::new();
        assert_eq!(relay.state(), RecorderState::Stopped);
        assert_eq!(*relay.subscribe().borrow(), RecorderState::Stopped);
        assert!(lock(&relay.inner.observer).is_none());
    }

    #[test]
    fn observer_sees_each_transition_in_order() {
        let relay = StateRelay::new();
        let (observer, events) = recording_observer();
        relay.set_observer(observer);

        let reporter = relay.reporter();
        reporter.report(RecorderState::Recording);
        reporter.report(RecorderState::Paused);
        reporter.report(RecorderState::Recording);
        reporter.report(RecorderState::Stopped);

        let events = events.lock().unwrap();
        let states: Vec<_> = events.iter().map(|e| e.state).collect();
        assert_eq!(
            states,
            vec![
                RecorderState::Recording,
                RecorderState::Paused,
                RecorderState::Recording,
                RecorderState::Stopped,
            ]
        );
        assert_eq!(events[1].previous, RecorderState::Recording);
    }

    #[test]
    fn repeated_state_is_not_a_transition() {
        let relay = StateRelay::new();
        let (observer, events) = recording_observer();
        relay.set_observer(observer);

        let reporter = relay.reporter();
        assert!(reporter.report(RecorderState::Recording));
        assert!(!reporter.report(RecorderState::Recording));
        assert_eq!(events.lock().unwrap().len(), 1);
    }

    #[test]
    fn watch_holds_latest_state_only() {
        let relay = StateRelay::new();
        let rx = relay.subscribe();
        let reporter = relay.reporter();
        reporter.report(RecorderState::Recording);
        reporter.report(RecorderState::Paused);
        assert_eq!(*rx.borrow(), RecorderState::Paused);
    }

    #[test]
    fn replacing_observer_drops_the_old_one() {
        let relay = StateRelay::new();
        let (first, first_events) = recording_observer();
        let (second, second_events) = recording_observer();
        relay.set_observer(first);
        relay.set_observer(second);

        relay.reporter().report(RecorderState::Recording);
        assert!(first_events.lock().unwrap().is_empty());
        assert_eq!(second_events.lock().unwrap().len(), 1);
    }

    #[test]
    fn guard_follows_reports() {
        let relay = StateRelay::new();
        assert!(relay.check(SessionCommand::Pause).is_err());
        relay.reporter().report(RecorderState::Recording);
        assert_eq!(relay.check(SessionCommand::Pause), Ok(RecorderState::Paused));
    }
}
