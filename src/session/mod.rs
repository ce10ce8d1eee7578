use crate::analytics::{DashboardState, DashboardView, DateRange, GroupDimension};
use crate::casebook::{CasebookViewer, RenderSurface};
use crate::catalog::{CaseCatalog, CaseDefinition, FilterDimension, LibraryFilters};
use crate::profile::{ProfileError, ProfileIdentity, ProfileStore, UserProfile};
use crate::scoring::{self, Dimension, Ratings, ScoringError};
use crate::timer::SessionTimer;
use crate::transcript::{
    CaptureOutcome, SpeechCapture, SpeechChunk, TranscriptError, TranscriptSession,
};
use chrono::{Local, NaiveDate};
use thiserror::Error;

/// Top-level screens. `InProgress` carries which interview panel is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Welcome,
    Library,
    CaseDetail,
    InProgress(InterviewPanel),
    Dashboard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewPanel {
    Active,
    Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackStatus {
    Idle,
    TooShort,
    Generating,
    Ready,
    Failed(String),
}

/// Scratch state for one interview, rebuilt on every start.
#[derive(Debug)]
pub struct Session {
    pub case: CaseDefinition,
    pub timer: SessionTimer,
    pub viewer: CasebookViewer,
    pub ratings: Ratings,
    pub transcript: TranscriptSession,
    pub feedback: Option<String>,
    pub feedback_status: FeedbackStatus,
    pub capture_error: Option<String>,
    pub render_error: Option<String>,
    /// Bumped on every generation request; results carrying an older value
    /// are stale and dropped.
    generation_attempt: u64,
}

impl Session {
    fn new(case: CaseDefinition) -> Self {
        let mut timer = SessionTimer::default();
        timer.start();
        Self {
            case,
            timer,
            viewer: CasebookViewer::default(),
            ratings: Ratings::default(),
            transcript: TranscriptSession::default(),
            feedback: None,
            feedback_status: FeedbackStatus::Idle,
            capture_error: None,
            render_error: None,
            generation_attempt: 0,
        }
    }

    pub fn generation_attempt(&self) -> u64 {
        self.generation_attempt
    }
}

/// Everything the UI can report back into the controller.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Login {
        identity: ProfileIdentity,
        mascot_id: u32,
    },
    Logout,
    ShowLibrary,
    ShowDashboard,
    BackToWelcome,
    BackToLibrary,
    ToggleLibraryFilter {
        dimension: FilterDimension,
        value: String,
    },
    OpenCase(String),
    RequestStart,
    CancelStart,
    ConfirmStart,
    Tick,
    NextPage,
    PrevPage,
    RenderComplete,
    EndInterview,
    BeginRecording,
    SpeechResult(SpeechChunk),
    CaptureFailed(String),
    StopRecording,
    FeedbackReady {
        attempt: u64,
        markup: String,
    },
    FeedbackFailed {
        attempt: u64,
        message: String,
    },
    RetryFeedback,
    Rate {
        dimension: Dimension,
        stars: u8,
    },
    CompleteSession,
    Abandon,
    ToggleGroupFilter {
        dimension: GroupDimension,
        value: String,
    },
    ClearAnalyticsFilter(GroupDimension),
    ClearAllAnalyticsFilters,
    SetDateRange(DateRange),
    CalendarPrev,
    CalendarNext,
}

/// Work the host must perform on the controller's behalf. Feedback generation
/// is a blocking HTTP call, so it stays outside the dispatch loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    GenerateFeedback { attempt: u64, transcript: String },
    PromptProfileCreation,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error(transparent)]
    Profile(#[from] ProfileError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error("unknown case id: {0}")]
    UnknownCase(String),
    #[error("no case selected")]
    NoCaseSelected,
}

/// Event-dispatch state machine for the whole app. Capabilities come in as
/// type parameters so every transition is testable with fakes. Events that
/// make no sense in the current view are ignored rather than rejected.
pub struct SessionController<S: SpeechCapture, R: RenderSurface> {
    catalog: CaseCatalog,
    store: ProfileStore,
    profile: Option<UserProfile>,
    speech: S,
    surface: R,
    view: View,
    warning_pending: bool,
    library_filters: LibraryFilters,
    selected_case: Option<String>,
    session: Option<Session>,
    dashboard: DashboardState,
}

impl<S: SpeechCapture, R: RenderSurface> SessionController<S, R> {
    pub fn new(
        catalog: CaseCatalog,
        store: ProfileStore,
        speech: S,
        surface: R,
    ) -> Result<Self, ControllerError> {
        let today = today();
        let profile = store.load(today)?;
        Ok(Self {
            catalog,
            store,
            profile,
            speech,
            surface,
            view: View::Welcome,
            warning_pending: false,
            library_filters: LibraryFilters::default(),
            selected_case: None,
            session: None,
            dashboard: DashboardState::new(today),
        })
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn warning_pending(&self) -> bool {
        self.warning_pending
    }

    pub fn library_filters(&self) -> &LibraryFilters {
        &self.library_filters
    }

    pub fn visible_cases(&self) -> Vec<&CaseDefinition> {
        self.catalog.filter(&self.library_filters)
    }

    pub fn selected_case(&self) -> Option<&CaseDefinition> {
        self.selected_case
            .as_deref()
            .and_then(|id| self.catalog.get(id))
    }

    pub fn dashboard(&self) -> &DashboardState {
        &self.dashboard
    }

    pub fn dashboard_view(&self) -> DashboardView {
        let history = self
            .profile
            .as_ref()
            .map(|profile| profile.history.as_slice())
            .unwrap_or(&[]);
        self.dashboard.view(history)
    }

    pub fn handle(&mut self, event: SessionEvent) -> Result<Vec<Effect>, ControllerError> {
        match event {
            SessionEvent::Login {
                identity,
                mascot_id,
            } => {
                let profile = self.store.create_profile(identity, mascot_id, today())?;
                self.profile = Some(profile);
                self.view = View::Library;
            }
            SessionEvent::Logout => {
                self.store.clear()?;
                self.profile = None;
                self.session = None;
                self.selected_case = None;
                self.warning_pending = false;
                self.view = View::Welcome;
            }
            SessionEvent::ShowLibrary => {
                self.view = View::Library;
            }
            SessionEvent::ShowDashboard => {
                self.view = View::Dashboard;
            }
            SessionEvent::BackToWelcome => {
                self.view = View::Welcome;
            }
            SessionEvent::BackToLibrary => {
                self.selected_case = None;
                self.warning_pending = false;
                self.view = View::Library;
            }
            SessionEvent::ToggleLibraryFilter { dimension, value } => {
                self.library_filters.toggle(dimension, &value);
            }
            SessionEvent::OpenCase(case_id) => {
                if self.catalog.get(&case_id).is_none() {
                    return Err(ControllerError::UnknownCase(case_id));
                }
                self.selected_case = Some(case_id);
                self.warning_pending = false;
                self.view = View::CaseDetail;
            }
            SessionEvent::RequestStart => {
                if self.view == View::CaseDetail {
                    self.warning_pending = true;
                }
            }
            SessionEvent::CancelStart => {
                self.warning_pending = false;
            }
            SessionEvent::ConfirmStart => {
                if self.warning_pending {
                    self.warning_pending = false;
                    self.start_session()?;
                }
            }
            SessionEvent::Tick => {
                if let Some(session) = &mut self.session {
                    session.timer.tick();
                }
            }
            SessionEvent::NextPage => {
                if let Some(session) = &mut self.session {
                    session.viewer.next_page(&mut self.surface);
                }
            }
            SessionEvent::PrevPage => {
                if let Some(session) = &mut self.session {
                    session.viewer.prev_page(&mut self.surface);
                }
            }
            SessionEvent::RenderComplete => {
                if let Some(session) = &mut self.session {
                    session.viewer.on_render_complete(&mut self.surface);
                }
            }
            SessionEvent::EndInterview => {
                if self.view == View::InProgress(InterviewPanel::Active) {
                    if let Some(session) = &mut self.session {
                        session.timer.stop();
                        self.view = View::InProgress(InterviewPanel::Feedback);
                    }
                }
            }
            SessionEvent::BeginRecording => {
                if self.view != View::InProgress(InterviewPanel::Feedback) {
                    return Ok(Vec::new());
                }
                if let Some(session) = &mut self.session {
                    match session.transcript.begin(&mut self.speech) {
                        Ok(()) => session.capture_error = None,
                        Err(TranscriptError::AlreadyRecording) => {}
                        Err(err) => session.capture_error = Some(err.to_string()),
                    }
                }
            }
            SessionEvent::SpeechResult(chunk) => {
                if let Some(session) = &mut self.session {
                    session.transcript.push_chunk(chunk);
                }
            }
            SessionEvent::CaptureFailed(message) => {
                if let Some(session) = &mut self.session {
                    session.transcript.mark_error();
                    session.capture_error = Some(message);
                }
            }
            SessionEvent::StopRecording => {
                if let Some(session) = &mut self.session {
                    match session.transcript.end(&mut self.speech) {
                        CaptureOutcome::Completed(transcript) => {
                            session.generation_attempt += 1;
                            session.feedback_status = FeedbackStatus::Generating;
                            return Ok(vec![Effect::GenerateFeedback {
                                attempt: session.generation_attempt,
                                transcript,
                            }]);
                        }
                        CaptureOutcome::TooShort => {
                            session.feedback_status = FeedbackStatus::TooShort;
                        }
                    }
                }
            }
            SessionEvent::FeedbackReady { attempt, markup } => {
                if let Some(session) = &mut self.session {
                    if attempt == session.generation_attempt
                        && session.feedback_status == FeedbackStatus::Generating
                    {
                        session.feedback = Some(markup);
                        session.feedback_status = FeedbackStatus::Ready;
                    }
                }
            }
            SessionEvent::FeedbackFailed { attempt, message } => {
                if let Some(session) = &mut self.session {
                    if attempt == session.generation_attempt
                        && session.feedback_status == FeedbackStatus::Generating
                    {
                        session.feedback_status = FeedbackStatus::Failed(message);
                    }
                }
            }
            SessionEvent::RetryFeedback => {
                if let Some(session) = &mut self.session {
                    // Invalidates any in-flight generation and clears the
                    // whole feedback panel for a fresh attempt.
                    session.generation_attempt += 1;
                    session.transcript.reset();
                    session.ratings = Ratings::default();
                    session.feedback = None;
                    session.feedback_status = FeedbackStatus::Idle;
                    session.capture_error = None;
                }
            }
            SessionEvent::Rate { dimension, stars } => {
                if self.view == View::InProgress(InterviewPanel::Feedback) {
                    if let Some(session) = &mut self.session {
                        session.ratings.set(dimension, stars);
                    }
                }
            }
            SessionEvent::CompleteSession => {
                return self.complete_session();
            }
            SessionEvent::Abandon => {
                self.session = None;
                self.view = View::Welcome;
            }
            SessionEvent::ToggleGroupFilter { dimension, value } => {
                self.dashboard.toggle_group_filter(dimension, &value);
            }
            SessionEvent::ClearAnalyticsFilter(dimension) => {
                self.dashboard.clear_filter(dimension);
            }
            SessionEvent::ClearAllAnalyticsFilters => {
                self.dashboard.clear_all_filters();
            }
            SessionEvent::SetDateRange(range) => {
                self.dashboard.set_range(range);
            }
            SessionEvent::CalendarPrev => {
                self.dashboard.month.prev();
            }
            SessionEvent::CalendarNext => {
                self.dashboard.month.next();
            }
        }
        Ok(Vec::new())
    }

    fn start_session(&mut self) -> Result<(), ControllerError> {
        let case = self
            .selected_case
            .as_deref()
            .and_then(|id| self.catalog.get(id))
            .ok_or(ControllerError::NoCaseSelected)?
            .clone();
        let document = case.casebook.clone().unwrap_or_else(|| "default".to_string());

        let mut session = Session::new(case);
        if let Err(err) = session.viewer.open(&mut self.surface, &document) {
            // The interview is still usable without the casebook pane.
            eprintln!("failed to open casebook '{document}': {err}");
            session.render_error = Some(err.to_string());
        }
        self.session = Some(session);
        self.view = View::InProgress(InterviewPanel::Active);
        Ok(())
    }

    fn complete_session(&mut self) -> Result<Vec<Effect>, ControllerError> {
        if self.view != View::InProgress(InterviewPanel::Feedback) {
            return Ok(Vec::new());
        }
        let Some(session) = &self.session else {
            return Ok(Vec::new());
        };
        if self.profile.is_none() {
            // The session stays alive so nothing is lost while the host
            // collects profile details.
            return Ok(vec![Effect::PromptProfileCreation]);
        }
        scoring::complete_session(
            &session.case,
            session.timer.elapsed_secs(),
            &session.ratings,
            session.feedback.as_deref(),
            &mut self.profile,
            &self.store,
            today(),
        )?;
        self.session = None;
        self.selected_case = None;
        self.view = View::Dashboard;
        Ok(Vec::new())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
