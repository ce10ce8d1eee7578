use serde::{Deserialize, Serialize};

/// Finalized transcripts at or under this many trimmed characters are treated
/// as too short to evaluate; the user is invited to record again.
pub const MIN_TRANSCRIPT_CHARS: usize = 5;

/// Incremental recognizer output. Interim chunks are display-only; final
/// chunks accumulate into the transcript.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SpeechChunk {
    pub is_final: bool,
    pub text: String,
}

/// Host speech-recognition capability. Recognition results and lifecycle
/// events arrive back through the session controller's event stream.
pub trait SpeechCapture {
    fn is_available(&self) -> bool;
    fn start(&mut self) -> Result<(), TranscriptError>;
    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CaptureState {
    #[default]
    Idle,
    Recording,
    Error,
}

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("speech capture is not supported by this host")]
    CapabilityUnavailable,
    #[error("speech capture is already running")]
    AlreadyRecording,
    #[error("speech capture failed: {0}")]
    Capture(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Completed(String),
    TooShort,
}

/// Start/stop lifecycle around the speech capability, accumulating only
/// finalized segments in recognizer emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptSession {
    state: CaptureState,
    final_text: String,
    interim_text: String,
}

impl TranscriptSession {
    pub fn state(&self) -> CaptureState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == CaptureState::Recording
    }

    /// Clears any prior transcript and begins capturing.
    pub fn begin(&mut self, capture: &mut dyn SpeechCapture) -> Result<(), TranscriptError> {
        if !capture.is_available() {
            return Err(TranscriptError::CapabilityUnavailable);
        }
        if self.state == CaptureState::Recording {
            return Err(TranscriptError::AlreadyRecording);
        }
        self.final_text.clear();
        self.interim_text.clear();
        capture.start()?;
        self.state = CaptureState::Recording;
        Ok(())
    }

    /// Finalized segments accumulate monotonically; interim text only
    /// replaces the live preview and is never persisted.
    pub fn push_chunk(&mut self, chunk: SpeechChunk) {
        if self.state != CaptureState::Recording {
            return;
        }
        if chunk.is_final {
            self.final_text.push_str(&chunk.text);
            self.interim_text.clear();
        } else {
            self.interim_text = chunk.text;
        }
    }

    /// Accumulated final text plus the current interim tail, for live display.
    pub fn live_preview(&self) -> String {
        format!("{}{}", self.final_text, self.interim_text)
    }

    /// Stops capture and reports the outcome. A transcript must be strictly
    /// longer than [`MIN_TRANSCRIPT_CHARS`] once trimmed to count as usable;
    /// otherwise the caller offers a retry instead of generating feedback.
    pub fn end(&mut self, capture: &mut dyn SpeechCapture) -> CaptureOutcome {
        capture.stop();
        self.state = CaptureState::Idle;
        self.interim_text.clear();
        if self.final_text.trim().chars().count() > MIN_TRANSCRIPT_CHARS {
            CaptureOutcome::Completed(self.final_text.clone())
        } else {
            CaptureOutcome::TooShort
        }
    }

    /// Records a capture failure reported by the host recognizer.
    pub fn mark_error(&mut self) {
        self.state = CaptureState::Error;
        self.interim_text.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeCapture {
        available: bool,
        started: u32,
        stopped: u32,
    }

    impl FakeCapture {
        fn available() -> Self {
            Self {
                available: true,
                ..Self::default()
            }
        }
    }

    impl SpeechCapture for FakeCapture {
        fn is_available(&self) -> bool {
            self.available
        }

        fn start(&mut self) -> Result<(), TranscriptError> {
            self.started += 1;
            Ok(())
        }

        fn stop(&mut self) {
            self.stopped += 1;
        }
    }

    fn record(session: &mut TranscriptSession, capture: &mut FakeCapture, text: &str) {
        session.begin(capture).expect("begin");
        session.push_chunk(SpeechChunk {
            is_final: true,
            text: text.to_string(),
        });
    }

    #[test]
    fn begin_fails_without_the_capability() {
        let mut capture = FakeCapture::default();
        let mut session = TranscriptSession::default();
        assert!(matches!(
            session.begin(&mut capture),
            Err(TranscriptError::CapabilityUnavailable)
        ));
        assert_eq!(capture.started, 0);
        assert_eq!(session.state(), CaptureState::Idle);
    }

    #[test]
    fn only_final_chunks_accumulate() {
        let mut capture = FakeCapture::available();
        let mut session = TranscriptSession::default();
        session.begin(&mut capture).expect("begin");
        session.push_chunk(SpeechChunk {
            is_final: false,
            text: "i think".to_string(),
        });
        assert_eq!(session.live_preview(), "i think");

        session.push_chunk(SpeechChunk {
            is_final: true,
            text: "I structured the problem ".to_string(),
        });
        session.push_chunk(SpeechChunk {
            is_final: false,
            text: "and then".to_string(),
        });
        assert_eq!(session.live_preview(), "I structured the problem and then");

        match session.end(&mut capture) {
            CaptureOutcome::Completed(text) => assert_eq!(text, "I structured the problem "),
            CaptureOutcome::TooShort => panic!("transcript long enough"),
        }
    }

    #[test]
    fn four_characters_is_too_short_six_is_enough() {
        let mut capture = FakeCapture::available();

        let mut short = TranscriptSession::default();
        record(&mut short, &mut capture, "four");
        assert_eq!(short.end(&mut capture), CaptureOutcome::TooShort);

        let mut enough = TranscriptSession::default();
        record(&mut enough, &mut capture, "enough");
        assert_eq!(
            enough.end(&mut capture),
            CaptureOutcome::Completed("enough".to_string())
        );
    }

    #[test]
    fn whitespace_does_not_count_toward_the_threshold() {
        let mut capture = FakeCapture::available();
        let mut session = TranscriptSession::default();
        record(&mut session, &mut capture, "   hey   ");
        assert_eq!(session.end(&mut capture), CaptureOutcome::TooShort);
    }

    #[test]
    fn begin_clears_the_previous_transcript() {
        let mut capture = FakeCapture::available();
        let mut session = TranscriptSession::default();
        record(&mut session, &mut capture, "first attempt text");
        let _ = session.end(&mut capture);

        session.begin(&mut capture).expect("second begin");
        assert_eq!(session.live_preview(), "");
        assert_eq!(capture.started, 2);
        assert_eq!(capture.stopped, 1);
    }

    #[test]
    fn chunks_outside_recording_are_dropped() {
        let mut session = TranscriptSession::default();
        session.push_chunk(SpeechChunk {
            is_final: true,
            text: "ignored".to_string(),
        });
        assert_eq!(session.live_preview(), "");
    }
}
