//! Assessment session orchestration
//!
//! `begin` walks the setup gates (question set, eligibility, camera,
//! model) and hands back a command handle plus the session itself; the
//! session's `run` loop serializes user commands against the timer and
//! presence signals and owns the single termination path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use camera_capture::Camera;
use presence::{
    AcquireError, FaceDetector, PageVisibility, PresenceMonitor, PresenceSignal,
};
use question_bank::{Assessment, Question, QuestionBank};
use record_store::{ApplicationStore, CandidateStatus};

use crate::machine::{SessionMachine, SessionPhase};
use crate::timer::CountdownTimer;
use crate::writer::{AssessmentOutcome, ResultWriter};
use crate::{SessionConfig, SessionError, TerminationReason};

/// Who is taking which assessment
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub job_id: String,
    pub candidate: String,
}

/// Commands the host screen sends while the session runs
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Choose (or change) the answer for the current question
    SelectAnswer(String),
    /// Move to the next question (no-op on the last)
    Next,
    /// Move to the previous question (no-op on the first)
    Previous,
    /// Confirm submission; also retries a failed result write
    Submit,
}

/// Live snapshot for the host UI
#[derive(Debug, Clone)]
pub struct SessionView {
    pub phase: SessionPhase,
    pub question_index: usize,
    pub question_count: usize,
    pub answered: usize,
    pub remaining: Duration,
    pub last_error: Option<String>,
}

/// Host-side handle: sends commands, observes the live view.
///
/// Sends after termination are silently dropped; the outcome arrives
/// through the `run` future.
#[derive(Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
    view: watch::Receiver<SessionView>,
    assessment: Arc<Assessment>,
}

impl SessionHandle {
    pub async fn select_answer(&self, choice: impl Into<String>) {
        let _ = self
            .commands
            .send(SessionCommand::SelectAnswer(choice.into()))
            .await;
    }

    pub async fn next(&self) {
        let _ = self.commands.send(SessionCommand::Next).await;
    }

    pub async fn previous(&self) {
        let _ = self.commands.send(SessionCommand::Previous).await;
    }

    pub async fn submit(&self) {
        let _ = self.commands.send(SessionCommand::Submit).await;
    }

    /// Current snapshot
    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Watch the snapshot for changes
    pub fn watch(&self) -> watch::Receiver<SessionView> {
        self.view.clone()
    }

    /// Question text for rendering
    pub fn question(&self, index: usize) -> Option<&Question> {
        self.assessment.question(index)
    }
}

/// One candidate's live proctored attempt
pub struct AssessmentSession {
    ctx: SessionContext,
    machine: SessionMachine,
    monitor: PresenceMonitor,
    timer: CountdownTimer,
    writer: ResultWriter,
    commands: mpsc::Receiver<SessionCommand>,
    signals: mpsc::Receiver<PresenceSignal>,
    expired: mpsc::Receiver<()>,
    view: watch::Sender<SessionView>,
    /// Cross-task termination claim; set exactly once
    claimed: AtomicBool,
    /// Outcome computed but not yet durably recorded
    pending: Option<AssessmentOutcome>,
    last_error: Option<String>,
    config: SessionConfig,
}

impl AssessmentSession {
    /// Set up a session for an eligible candidate.
    ///
    /// Walks `Loading` and `AwaitingCamera`; on success the session is
    /// `InProgress` with the countdown and both presence loops running.
    /// Eligibility is checked once here and never re-checked mid-session.
    pub async fn begin(
        ctx: SessionContext,
        bank: &dyn QuestionBank,
        store: Arc<dyn ApplicationStore>,
        camera: Box<dyn Camera>,
        visibility: watch::Receiver<PageVisibility>,
        config: SessionConfig,
    ) -> Result<(SessionHandle, AssessmentSession), SessionError> {
        let machine = Self::load(&ctx, bank, store.as_ref())?;
        let monitor = PresenceMonitor::acquire(camera, config.presence.clone())
            .map_err(map_acquire)?;
        Ok(Self::activate(ctx, machine, monitor, store, visibility, config))
    }

    /// `begin` with a caller-supplied detector backend.
    pub async fn begin_with_detector(
        ctx: SessionContext,
        bank: &dyn QuestionBank,
        store: Arc<dyn ApplicationStore>,
        camera: Box<dyn Camera>,
        detector: Box<dyn FaceDetector>,
        visibility: watch::Receiver<PageVisibility>,
        config: SessionConfig,
    ) -> Result<(SessionHandle, AssessmentSession), SessionError> {
        let machine = Self::load(&ctx, bank, store.as_ref())?;
        let monitor =
            PresenceMonitor::acquire_with_detector(camera, detector, config.presence.clone())
                .map_err(map_acquire)?;
        Ok(Self::activate(ctx, machine, monitor, store, visibility, config))
    }

    fn load(
        ctx: &SessionContext,
        bank: &dyn QuestionBank,
        store: &dyn ApplicationStore,
    ) -> Result<SessionMachine, SessionError> {
        info!(job_id = %ctx.job_id, candidate = %ctx.candidate, "loading assessment");

        let assessment = bank
            .fetch(&ctx.job_id)?
            .ok_or_else(|| SessionError::AssessmentMissing(ctx.job_id.clone()))?;

        let status = store.status_of(&ctx.job_id, &ctx.candidate)?;
        if status != Some(CandidateStatus::SelectedForAssessment) {
            warn!(job_id = %ctx.job_id, ?status, "candidate not eligible");
            return Err(SessionError::Ineligible);
        }

        let mut machine = SessionMachine::new(assessment);
        machine.begin_camera_wait();
        Ok(machine)
    }

    fn activate(
        ctx: SessionContext,
        mut machine: SessionMachine,
        mut monitor: PresenceMonitor,
        store: Arc<dyn ApplicationStore>,
        visibility: watch::Receiver<PageVisibility>,
        config: SessionConfig,
    ) -> (SessionHandle, AssessmentSession) {
        let (signal_tx, signal_rx) = mpsc::channel(8);
        let (expired_tx, expired_rx) = mpsc::channel(1);

        monitor.start(signal_tx.clone());
        monitor.observe_visibility(visibility, signal_tx);
        let timer = CountdownTimer::start(config.time_limit(), expired_tx);

        machine.begin_in_progress();
        info!(
            job_id = %ctx.job_id,
            questions = machine.assessment().len(),
            limit_secs = config.time_limit_secs,
            "assessment in progress"
        );

        let assessment = Arc::new(machine.assessment().clone());
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let (view_tx, view_rx) = watch::channel(SessionView {
            phase: machine.phase(),
            question_index: machine.current_index(),
            question_count: machine.assessment().len(),
            answered: 0,
            remaining: timer.remaining(),
            last_error: None,
        });

        let handle = SessionHandle {
            commands: cmd_tx,
            view: view_rx,
            assessment,
        };
        let session = AssessmentSession {
            ctx,
            machine,
            monitor,
            timer,
            writer: ResultWriter::new(store),
            commands: cmd_rx,
            signals: signal_rx,
            expired: expired_rx,
            view: view_tx,
            claimed: AtomicBool::new(false),
            pending: None,
            last_error: None,
            config,
        };
        (handle, session)
    }

    /// Drive the session until it terminates.
    ///
    /// Resolves with the outcome once the result is durably recorded,
    /// or with [`SessionError::Abandoned`] if the host dropped the
    /// handle before any termination.
    pub async fn run(mut self) -> Result<AssessmentOutcome, SessionError> {
        let mut remaining = self.timer.subscribe();

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => {
                        if let Some(outcome) = self.handle_command(cmd) {
                            return Ok(outcome);
                        }
                    }
                    None => {
                        warn!("handle dropped; tearing down without submission");
                        self.teardown();
                        return Err(SessionError::Abandoned);
                    }
                },
                Some(signal) = self.signals.recv() => {
                    let outcome = match signal {
                        PresenceSignal::Absent => {
                            self.terminate(TerminationReason::CandidateNotVisible)
                        }
                        PresenceSignal::Hidden => {
                            self.terminate(TerminationReason::LeftAssessmentTab)
                        }
                        PresenceSignal::Returned => {
                            debug!("candidate back in frame");
                            None
                        }
                    };
                    if let Some(outcome) = outcome {
                        return Ok(outcome);
                    }
                },
                Some(()) = self.expired.recv() => {
                    if let Some(outcome) = self.terminate(TerminationReason::TimeExpired) {
                        return Ok(outcome);
                    }
                },
                Ok(()) = remaining.changed() => self.push_view(),
            }
        }
    }

    fn handle_command(&mut self, cmd: SessionCommand) -> Option<AssessmentOutcome> {
        match cmd {
            SessionCommand::SelectAnswer(choice) => {
                match self.machine.select_answer(&choice) {
                    Ok(()) => self.last_error = None,
                    Err(e) => {
                        warn!("answer rejected: {e}");
                        self.last_error = Some(e.to_string());
                    }
                }
                self.push_view();
                None
            }
            SessionCommand::Next => {
                self.machine.next();
                self.push_view();
                None
            }
            SessionCommand::Previous => {
                self.machine.previous();
                self.push_view();
                None
            }
            SessionCommand::Submit => {
                if self.machine.phase() == SessionPhase::Submitting {
                    // Manual retry of a failed result write.
                    return self.persist();
                }
                if self.config.require_complete && !self.machine.sheet().is_complete() {
                    warn!(
                        answered = self.machine.sheet().answered(),
                        total = self.machine.assessment().len(),
                        "submission refused while questions are unanswered"
                    );
                    self.last_error = Some(SessionError::Incomplete.to_string());
                    self.push_view();
                    return None;
                }
                self.terminate(TerminationReason::UserSubmitted)
            }
        }
    }

    /// The single termination path.
    ///
    /// The claim is an atomic compare-and-set taken before any other
    /// work, so triggers racing in the same scheduler turn cannot both
    /// pass. The clock and camera are stopped before scoring; the write
    /// happens once, with failures leaving the session in `Submitting`
    /// for a manual retry.
    fn terminate(&mut self, reason: TerminationReason) -> Option<AssessmentOutcome> {
        if self
            .claimed
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!(%reason, "termination already claimed; trigger suppressed");
            return None;
        }
        if !self.machine.claim_termination(reason) {
            return None;
        }

        info!(%reason, "terminating session");
        self.timer.cancel();
        self.monitor.release();

        let score = scoring::score(
            self.machine.assessment(),
            self.machine.sheet(),
            self.config.scoring,
        );
        self.pending = Some(AssessmentOutcome { score, reason });
        self.push_view();

        self.persist()
    }

    fn persist(&mut self) -> Option<AssessmentOutcome> {
        let outcome = self.pending?;

        match self
            .writer
            .write(&self.ctx.job_id, &self.ctx.candidate, &outcome)
        {
            Ok(()) => {
                self.machine.finish();
                self.last_error = None;
                self.push_view();
                Some(outcome)
            }
            Err(e) => {
                // Answers and score stay in memory; only an explicit
                // Submit command retries.
                error!("result write failed: {e}");
                self.last_error = Some(e.to_string());
                self.push_view();
                None
            }
        }
    }

    fn teardown(&mut self) {
        self.timer.cancel();
        self.monitor.release();
    }

    fn push_view(&mut self) {
        let _ = self.view.send(SessionView {
            phase: self.machine.phase(),
            question_index: self.machine.current_index(),
            question_count: self.machine.assessment().len(),
            answered: self.machine.sheet().answered(),
            remaining: self.timer.remaining(),
            last_error: self.last_error.clone(),
        });
    }
}

fn map_acquire(e: AcquireError) -> SessionError {
    match e {
        AcquireError::PermissionDenied => SessionError::PermissionDenied,
        AcquireError::Setup(e) => SessionError::Setup(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicUsize;

    use camera_capture::{SyntheticCamera, SyntheticScene, VideoFrame};
    use presence::{FaceObservation, PresenceConfig, PresenceError};
    use question_bank::InMemoryBank;
    use record_store::{ApplicationRecord, InMemoryRecordStore, StoreError};
    use scoring::ScoringPolicy;

    const JOB: &str = "job-42";
    const CANDIDATE: &str = "ada@example.com";

    /// Detector driven by a shared presence flag.
    struct FlagDetector {
        present: Arc<AtomicBool>,
    }

    impl FaceDetector for FlagDetector {
        fn detect(
            &mut self,
            _frame: &VideoFrame,
        ) -> Result<Option<FaceObservation>, PresenceError> {
            if self.present.load(Ordering::SeqCst) {
                Ok(Some(FaceObservation {
                    x: 0.0,
                    y: 0.0,
                    width: 10.0,
                    height: 10.0,
                    confidence: 0.95,
                }))
            } else {
                Ok(None)
            }
        }
    }

    /// Store wrapper that counts writes and can fail the first N.
    struct CountingStore {
        inner: InMemoryRecordStore,
        writes: AtomicUsize,
        fail_next: AtomicUsize,
    }

    impl CountingStore {
        fn new(inner: InMemoryRecordStore) -> Self {
            Self {
                inner,
                writes: AtomicUsize::new(0),
                fail_next: AtomicUsize::new(0),
            }
        }
    }

    impl ApplicationStore for CountingStore {
        fn status_of(
            &self,
            job_id: &str,
            candidate: &str,
        ) -> Result<Option<CandidateStatus>, StoreError> {
            self.inner.status_of(job_id, candidate)
        }

        fn complete_assessment(
            &self,
            job_id: &str,
            candidate: &str,
            score: u32,
        ) -> Result<(), StoreError> {
            if self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError::Unavailable("injected outage".into()));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner.complete_assessment(job_id, candidate, score)
        }
    }

    struct Harness {
        bank: InMemoryBank,
        store: Arc<CountingStore>,
        present: Arc<AtomicBool>,
        visibility: watch::Sender<PageVisibility>,
        visibility_rx: watch::Receiver<PageVisibility>,
        camera_live: Arc<AtomicBool>,
        camera: Option<Box<SyntheticCamera>>,
        config: SessionConfig,
    }

    fn harness(questions: usize) -> Harness {
        let bank = InMemoryBank::new();
        let qs = (0..questions)
            .map(|i| {
                Question::new(
                    format!("q{i}"),
                    vec!["a".into(), "b".into(), "c".into(), "d".into()],
                    "a",
                )
                .unwrap()
            })
            .collect();
        bank.insert(Assessment::new(JOB, qs).unwrap()).unwrap();

        let store = InMemoryRecordStore::new();
        store
            .upsert(ApplicationRecord::selected(JOB, CANDIDATE))
            .unwrap();

        let camera = SyntheticCamera::new(SyntheticScene::Candidate);
        let camera_live = camera.live_handle();
        let (visibility, visibility_rx) = watch::channel(PageVisibility::Visible);

        let config = SessionConfig {
            time_limit_secs: 2700,
            scoring: ScoringPolicy::PointCount,
            require_complete: false,
            presence: PresenceConfig {
                absence_grace_ms: 3000,
                poll_interval_ms: 1000,
                ..PresenceConfig::default()
            },
        };

        Harness {
            bank,
            store: Arc::new(CountingStore::new(store)),
            present: Arc::new(AtomicBool::new(true)),
            visibility,
            visibility_rx,
            camera_live,
            camera: Some(Box::new(camera)),
            config,
        }
    }

    async fn begin(h: &mut Harness) -> (SessionHandle, AssessmentSession) {
        AssessmentSession::begin_with_detector(
            SessionContext {
                job_id: JOB.into(),
                candidate: CANDIDATE.into(),
            },
            &h.bank,
            Arc::clone(&h.store) as Arc<dyn ApplicationStore>,
            h.camera.take().unwrap(),
            Box::new(FlagDetector {
                present: Arc::clone(&h.present),
            }),
            h.visibility_rx.clone(),
            h.config.clone(),
        )
        .await
        .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_credit_user_submit() {
        let mut h = harness(50);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        for i in 0..50 {
            handle.select_answer("a").await;
            if i < 49 {
                handle.next().await;
            }
        }
        handle.submit().await;

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.score, 50);
        assert_eq!(outcome.reason, TerminationReason::UserSubmitted);
        assert_eq!(outcome.reason.as_str(), "submitted by user");

        let record = h.store.inner.get(JOB, CANDIDATE).unwrap().unwrap();
        assert_eq!(record.status, CandidateStatus::AssessmentCompleted);
        assert_eq!(record.score, Some(50));
        assert_eq!(handle.view().phase, SessionPhase::Terminated);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sustained_absence_terminates_with_partial_score() {
        let mut h = harness(50);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        for _ in 0..10 {
            handle.select_answer("a").await;
            handle.next().await;
        }
        // Wait until the answers are actually recorded before the
        // candidate walks away.
        let mut view = handle.watch();
        view.wait_for(|v| v.answered == 10).await.unwrap();

        h.present.store(false, Ordering::SeqCst);

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.reason, TerminationReason::CandidateNotVisible);
        assert_eq!(outcome.reason.as_str(), "candidate not visible");
        assert_eq!(outcome.score, 10);

        // Camera track must be stopped on this exit path.
        assert!(!h.camera_live.load(Ordering::SeqCst));
        let record = h.store.inner.get(JOB, CANDIDATE).unwrap().unwrap();
        assert_eq!(record.score, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tab_switch_terminates_immediately() {
        let mut h = harness(50);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        handle.select_answer("b").await;

        // Face stays detected the whole time; hiding the page is enough.
        h.visibility.send(PageVisibility::Hidden).unwrap();

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.reason, TerminationReason::LeftAssessmentTab);
        assert_eq!(outcome.reason.as_str(), "left the assessment tab");
        assert!(!h.camera_live.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_scores_answered_entries() {
        let mut h = harness(50);
        h.config.time_limit_secs = 60;
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        for _ in 0..30 {
            handle.select_answer("a").await;
            handle.next().await;
        }

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.reason, TerminationReason::TimeExpired);
        assert_eq!(outcome.reason.as_str(), "time expired");
        assert_eq!(outcome.score, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_triggers_write_exactly_once() {
        let mut h = harness(5);
        // Timer expiry and the absence threshold land on the same
        // instant: 3 seconds in.
        h.config.time_limit_secs = 3;
        h.present.store(false, Ordering::SeqCst);
        let (_handle, session) = begin(&mut h).await;

        let outcome = session.run().await.unwrap();
        assert!(matches!(
            outcome.reason,
            TerminationReason::TimeExpired | TerminationReason::CandidateNotVisible
        ));
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permission_denied_is_terminal_and_unscored() {
        let mut h = harness(5);
        h.camera = Some(Box::new(SyntheticCamera::denied()));

        let result = AssessmentSession::begin(
            SessionContext {
                job_id: JOB.into(),
                candidate: CANDIDATE.into(),
            },
            &h.bank,
            Arc::clone(&h.store) as Arc<dyn ApplicationStore>,
            h.camera.take().unwrap(),
            h.visibility_rx.clone(),
            h.config.clone(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::PermissionDenied)));
        // No result write, external status untouched.
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
        let record = h.store.inner.get(JOB, CANDIDATE).unwrap().unwrap();
        assert_eq!(record.status, CandidateStatus::SelectedForAssessment);
        assert_eq!(record.score, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_device_is_setup_failure() {
        let mut h = harness(5);
        h.camera = Some(Box::new(SyntheticCamera::unavailable()));

        let result = AssessmentSession::begin(
            SessionContext {
                job_id: JOB.into(),
                candidate: CANDIDATE.into(),
            },
            &h.bank,
            Arc::clone(&h.store) as Arc<dyn ApplicationStore>,
            h.camera.take().unwrap(),
            h.visibility_rx.clone(),
            h.config.clone(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::Setup(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ineligible_candidate_is_rejected() {
        let mut h = harness(5);
        h.store
            .inner
            .upsert(ApplicationRecord::new(JOB, CANDIDATE))
            .unwrap();

        let result = AssessmentSession::begin_with_detector(
            SessionContext {
                job_id: JOB.into(),
                candidate: CANDIDATE.into(),
            },
            &h.bank,
            Arc::clone(&h.store) as Arc<dyn ApplicationStore>,
            h.camera.take().unwrap(),
            Box::new(FlagDetector {
                present: Arc::clone(&h.present),
            }),
            h.visibility_rx.clone(),
            h.config.clone(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::Ineligible)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_assessment_is_rejected() {
        let mut h = harness(5);

        let result = AssessmentSession::begin_with_detector(
            SessionContext {
                job_id: "job-without-test".into(),
                candidate: CANDIDATE.into(),
            },
            &h.bank,
            Arc::clone(&h.store) as Arc<dyn ApplicationStore>,
            h.camera.take().unwrap(),
            Box::new(FlagDetector {
                present: Arc::clone(&h.present),
            }),
            h.visibility_rx.clone(),
            h.config.clone(),
        )
        .await;

        assert!(matches!(result, Err(SessionError::AssessmentMissing(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_write_preserves_answers_for_manual_retry() {
        let mut h = harness(5);
        h.store.fail_next.store(1, Ordering::SeqCst);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        for _ in 0..3 {
            handle.select_answer("a").await;
            handle.next().await;
        }
        handle.submit().await;

        // First write fails; session parks in Submitting with the error
        // surfaced and answers intact.
        let mut view = handle.watch();
        let parked = view
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(parked.phase, SessionPhase::Submitting);
        assert_eq!(parked.answered, 3);
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);

        handle.submit().await;

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.score, 3);
        assert_eq!(outcome.reason, TerminationReason::UserSubmitted);
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_incomplete_submit_refused_when_required() {
        let mut h = harness(3);
        h.config.require_complete = true;
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        handle.select_answer("a").await;
        handle.submit().await;

        let mut view = handle.watch();
        let refused = view
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(refused.phase, SessionPhase::InProgress);

        // Completing the sheet unblocks submission.
        handle.next().await;
        handle.select_answer("b").await;
        handle.next().await;
        handle.select_answer("a").await;
        handle.submit().await;

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.score, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_option_is_rejected() {
        let mut h = harness(3);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        handle.select_answer("not-an-option").await;
        let mut view = handle.watch();
        let rejected = view
            .wait_for(|v| v.last_error.is_some())
            .await
            .unwrap()
            .clone();
        assert_eq!(rejected.answered, 0);

        handle.submit().await;
        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.score, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_handle_abandons_without_write() {
        let mut h = harness(5);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        drop(handle);

        let result = run.await.unwrap();
        assert!(matches!(result, Err(SessionError::Abandoned)));
        assert_eq!(h.store.writes.load(Ordering::SeqCst), 0);
        assert!(!h.camera_live.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_return_within_grace_keeps_session_alive() {
        let mut h = harness(3);
        let (handle, session) = begin(&mut h).await;
        let run = tokio::spawn(session.run());

        // Away for under the grace window, then back.
        h.present.store(false, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2000)).await;
        h.present.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(10)).await;

        handle.select_answer("a").await;
        handle.submit().await;

        let outcome = run.await.unwrap().unwrap();
        assert_eq!(outcome.reason, TerminationReason::UserSubmitted);
        assert_eq!(outcome.score, 1);
    }
}
