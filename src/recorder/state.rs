//! Recording state management
//!
//! Defines the recording state machine, the events it emits and the
//! settings a recorder is built with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Current state of a recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordingState {
    /// No session in progress
    #[default]
    Idle,
    /// Capturing
    Recording,
    /// Session open, capture suspended
    Paused,
}

/// User-triggered operations on a recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Play,
    Pause,
    Stop,
}

/// A legal step of the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Idle -> Recording, opening a new session
    Begin,
    /// Paused -> Recording
    Resume,
    /// Play while already recording; nothing changes
    AlreadyRecording,
    /// Recording -> Paused
    Suspend,
    /// Recording or Paused -> Idle, closing the session
    Finish,
}

/// An action that is not valid from the current state
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {from}")]
pub struct InvalidTransition {
    pub from: RecordingState,
    pub action: Action,
}

impl RecordingState {
    /// Resolve what `action` does from this state.
    pub fn transition(self, action: Action) -> Result<Transition, InvalidTransition> {
        use RecordingState::*;

        match (self, action) {
            (Idle, Action::Play) => Ok(Transition::Begin),
            (Paused, Action::Play) => Ok(Transition::Resume),
            (Recording, Action::Play) => Ok(Transition::AlreadyRecording),
            (Recording, Action::Pause) => Ok(Transition::Suspend),
            (Recording | Paused, Action::Stop) => Ok(Transition::Finish),
            (from, action) => Err(InvalidTransition { from, action }),
        }
    }

    /// Whether a session is open (recording or paused)
    pub fn is_active(self) -> bool {
        self != RecordingState::Idle
    }
}

impl Transition {
    /// State the recorder is in once the transition completes
    pub fn target(self) -> RecordingState {
        match self {
            Transition::Begin | Transition::Resume | Transition::AlreadyRecording => {
                RecordingState::Recording
            }
            Transition::Suspend => RecordingState::Paused,
            Transition::Finish => RecordingState::Idle,
        }
    }
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordingState::Idle => "idle",
            RecordingState::Recording => "recording",
            RecordingState::Paused => "paused",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Play => "play",
            Action::Pause => "pause",
            Action::Stop => "stop",
        };
        f.write_str(name)
    }
}

/// Events emitted by a recorder
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum RecorderEvent {
    /// Countdown began; the UI blocks interaction until it finishes
    CountdownStarted { from: u32 },
    /// One countdown step
    CountdownTick { remaining: u32 },
    /// Countdown finished; the UI unblocks
    CountdownFinished,
    /// Capture started
    #[serde(rename_all = "camelCase")]
    Started { session_id: Uuid },
    /// Capture paused
    #[serde(rename_all = "camelCase")]
    Paused { elapsed_secs: f64 },
    /// Capture resumed
    Resumed,
    /// Session closed
    #[serde(rename_all = "camelCase")]
    Stopped { saved: bool, elapsed_secs: f64 },
}

/// Timing parameters of a recorder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecorderSettings {
    /// Countdown start value; 0 skips straight to the final tick
    pub countdown_from: u32,

    /// Time between countdown ticks
    pub countdown_tick: Duration,

    /// How often the sink flushes encoded data
    pub chunk_interval: Duration,
}

impl Default for RecorderSettings {
    fn default() -> Self {
        Self {
            countdown_from: 5,
            countdown_tick: Duration::from_secs(1),
            chunk_interval: Duration::from_millis(200),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_transitions() {
        assert_eq!(RecordingState::Idle.transition(Action::Play), Ok(Transition::Begin));
        assert_eq!(RecordingState::Paused.transition(Action::Play), Ok(Transition::Resume));
        assert_eq!(
            RecordingState::Recording.transition(Action::Play),
            Ok(Transition::AlreadyRecording)
        );
        assert_eq!(RecordingState::Recording.transition(Action::Pause), Ok(Transition::Suspend));
        assert_eq!(RecordingState::Recording.transition(Action::Stop), Ok(Transition::Finish));
        assert_eq!(RecordingState::Paused.transition(Action::Stop), Ok(Transition::Finish));
    }

    #[test]
    fn test_illegal_transitions() {
        for (from, action) in [
            (RecordingState::Idle, Action::Pause),
            (RecordingState::Paused, Action::Pause),
            (RecordingState::Idle, Action::Stop),
        ] {
            assert_eq!(from.transition(action), Err(InvalidTransition { from, action }));
        }
    }

    #[test]
    fn test_targets() {
        assert_eq!(Transition::Begin.target(), RecordingState::Recording);
        assert_eq!(Transition::AlreadyRecording.target(), RecordingState::Recording);
        assert_eq!(Transition::Suspend.target(), RecordingState::Paused);
        assert_eq!(Transition::Finish.target(), RecordingState::Idle);
    }

    #[test]
    fn test_invalid_transition_message() {
        let err = RecordingState::Idle.transition(Action::Stop).unwrap_err();
        assert_eq!(err.to_string(), "cannot stop while idle");
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(RecorderEvent::Stopped {
            saved: true,
            elapsed_secs: 1.5,
        })
        .unwrap();
        assert_eq!(json["type"], "stopped");
        assert_eq!(json["saved"], true);
        assert_eq!(json["elapsedSecs"], 1.5);

        let json = serde_json::to_value(RecorderEvent::CountdownTick { remaining: 3 }).unwrap();
        assert_eq!(json["type"], "countdownTick");
        assert_eq!(json["remaining"], 3);
    }
}
