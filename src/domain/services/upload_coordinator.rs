#[cfg(test)]
#[path = "upload_coordinator_test.rs"]
mod tests;

use std::time::Duration;

use tokio::time::Instant;

/// Toggles closer together than this are treated as a double trigger.
pub const MIC_DEBOUNCE: Duration = Duration::from_millis(1000);
/// Recordings shorter than this are discarded without an upload.
pub const MIN_RECORDING: Duration = Duration::from_millis(1500);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum UploadKind {
    Text,
    File,
    Audio,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    /// Waiting on the recorder to acquire the microphone.
    Starting,
    Recording { started_at: Instant },
    /// Waiting on the recorder to hand back the captured chunks.
    Stopping { elapsed: Duration },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MicDecision {
    NoSession,
    Debounced,
    /// Another submission or a recorder transition is outstanding.
    Busy,
    Start,
    Stop { elapsed: Duration },
}

/// Serializes every visitor submission behind a single in-flight slot and
/// owns the audio capture lifecycle.
#[derive(Clone, Debug)]
pub struct UploadCoordinator {
    in_flight: Option<UploadKind>,
    /// The message whose result releases the slot.
    submission: Option<String>,
    recording: RecordingState,
    last_toggle: Option<Instant>,
}

impl Default for UploadCoordinator {
    fn default() -> UploadCoordinator {
        return UploadCoordinator {
            in_flight: None,
            submission: None,
            recording: RecordingState::Idle,
            last_toggle: None,
        };
    }
}

impl UploadCoordinator {
    pub fn in_flight(&self) -> Option<UploadKind> {
        return self.in_flight;
    }

    pub fn recording_state(&self) -> RecordingState {
        return self.recording;
    }

    /// True while a send is outstanding or the microphone is in use.
    pub fn is_busy(&self) -> bool {
        return self.in_flight.is_some() || self.recording != RecordingState::Idle;
    }

    pub fn is_recording(&self) -> bool {
        return matches!(
            self.recording,
            RecordingState::Starting | RecordingState::Recording { .. }
        );
    }

    /// Claims the in-flight slot for a message. Returns false, and changes
    /// nothing, when the slot is taken or a recording is live.
    pub fn try_begin(&mut self, kind: UploadKind, message_id: &str) -> bool {
        if self.is_busy() {
            tracing::debug!(?kind, in_flight = ?self.in_flight, "submission dropped, upload in flight");
            return false;
        }

        self.in_flight = Some(kind);
        self.submission = Some(message_id.to_string());
        return true;
    }

    /// Hands a slot claimed by a stopped recording to the message that
    /// uploads it.
    pub fn assign(&mut self, message_id: &str) {
        if self.in_flight.is_some() {
            self.submission = Some(message_id.to_string());
        }
    }

    /// Releases the slot if `message_id` holds it.
    pub fn finish(&mut self, message_id: &str) -> bool {
        if self.submission.as_deref() != Some(message_id) {
            tracing::debug!(message_id, submission = ?self.submission, "result for a message not in flight");
            return false;
        }

        self.release();
        return true;
    }

    pub fn release(&mut self) {
        self.in_flight = None;
        self.submission = None;
    }

    pub fn toggle_mic(&mut self, now: Instant, has_session: bool) -> MicDecision {
        if !has_session {
            return MicDecision::NoSession;
        }

        if let Some(last_toggle) = self.last_toggle {
            if now.saturating_duration_since(last_toggle) < MIC_DEBOUNCE {
                tracing::debug!("mic toggle debounced");
                return MicDecision::Debounced;
            }
        }
        self.last_toggle = Some(now);

        match self.recording {
            RecordingState::Idle => {
                if self.in_flight.is_some() {
                    return MicDecision::Busy;
                }

                self.recording = RecordingState::Starting;
                return MicDecision::Start;
            }
            RecordingState::Recording { started_at } => {
                let elapsed = now.saturating_duration_since(started_at);
                self.recording = RecordingState::Stopping { elapsed };
                self.in_flight = Some(UploadKind::Audio);
                return MicDecision::Stop { elapsed };
            }
            RecordingState::Starting | RecordingState::Stopping { .. } => {
                return MicDecision::Busy;
            }
        }
    }

    pub fn recording_started(&mut self, now: Instant) -> bool {
        if self.recording != RecordingState::Starting {
            return false;
        }

        self.recording = RecordingState::Recording { started_at: now };
        return true;
    }

    pub fn recording_failed(&mut self) {
        self.recording = RecordingState::Idle;
        if self.in_flight == Some(UploadKind::Audio) {
            self.release();
        }
    }

    /// Leaves the stopping state. Returns how long the capture lasted when it
    /// is long enough to upload, otherwise releases the in-flight slot.
    pub fn recording_stopped(&mut self) -> Option<Duration> {
        let elapsed = match self.recording {
            RecordingState::Stopping { elapsed } => elapsed,
            _ => return None,
        };

        self.recording = RecordingState::Idle;
        if elapsed < MIN_RECORDING {
            tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "recording too short");
            self.release();
            return None;
        }

        return Some(elapsed);
    }

    pub fn assemble(chunks: Vec<Vec<u8>>) -> Vec<u8> {
        return chunks.concat();
    }

    pub fn reset(&mut self) {
        *self = UploadCoordinator {
            last_toggle: self.last_toggle,
            ..UploadCoordinator::default()
        };
    }
}
