//! Workspace Controller - High-Level Orchestration
//!
//! **Responsibility:**
//! Own every piece of state one mounted workspace shows and drive it in
//! response to Run, Submit, MCQ and navigation events.
//!
//! **Architecture:**
//! 1. `TestCaseSet` + codec produce the visible cases (test_cases.rs, codec.rs)
//! 2. The request builder validates and shapes the outbound call (request.rs)
//! 3. A spawned task talks to the `ExecutionService` under an explicit timeout
//! 4. The completion comes back over a channel and the reconciler turns it
//!    into records (reconciler.rs)
//!
//! **State machines (independent):**
//! - run:    `Idle → Running → (ResultsReady | RunError)`
//! - submit: `Idle → Submitting → (Complete | SubmitError)`
//!
//! Entering `Running`/`Submitting` switches to the Result tab, clears the
//! displayed results and raises `clearing` until the completion lands. When
//! a run and a submit overlap, only the one started last fills the results.
//!
//! **Request tickets:**
//! Each run/submit carries a ticket. A completion is applied only while its
//! ticket is still the in-flight one for the current problem. Navigation
//! aborts in-flight tasks and forgets their tickets, so a late response can
//! never land on another problem. A newer run supersedes an older one; a
//! second submit is refused while one is in flight.
//!
//! **Failure surfaces (exactly one per action):**
//! - validation, MCQ submit and navigation failures → `Notice`
//! - run/submit transport and backend failures → one synthetic result record
//! - post-submit status refresh failures → logged and dropped

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use codelab_common::config::DEFAULT_TIMEOUT_MS;
use codelab_common::types::{Language, ProblemSchema, RunData, SubmitData};
use futures::FutureExt;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::answers::{AnswerEntry, AnswerStore, AttemptAnswerStore, CommitOutcome, McqOutcome, NoopAnswerStore};
use crate::error::{RepositoryError, ServiceError, ValidationError};
use crate::reconciler::{self, ResultRecord, ResultView, RunSummary, SubmitSummary};
use crate::repository::{ContestRepository, ProblemRepository, ProblemStatus, ProblemStatusSource};
use crate::request;
use crate::service::ExecutionService;
use crate::test_cases::{TestCase, TestCaseSet};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceMode {
    Practice,
    Contest { contest_id: String },
}

impl WorkspaceMode {
    pub fn contest_id(&self) -> Option<&str> {
        match self {
            WorkspaceMode::Practice => None,
            WorkspaceMode::Contest { contest_id } => Some(contest_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    ResultsReady,
    RunError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Idle,
    Submitting,
    Complete,
    SubmitError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultTab {
    TestCases,
    Result,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

/// Transient toast-level message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }
}

/// MCQ answer state for the problem on screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct McqState {
    pub selected: Option<usize>,
    pub submitted: bool,
    pub result: Option<McqOutcome>,
}

impl From<AnswerEntry> for McqState {
    fn from(entry: AnswerEntry) -> Self {
        Self {
            selected: entry.selected_option_index,
            submitted: entry.submitted,
            result: entry.result,
        }
    }
}

enum Completion {
    Run {
        ticket: Uuid,
        outcome: Result<RunData, ServiceError>,
    },
    Submit {
        ticket: Uuid,
        outcome: Result<SubmitData, ServiceError>,
    },
}

struct InFlight {
    ticket: Uuid,
    problem_id: String,
    handle: JoinHandle<()>,
    sent_cases: Vec<TestCase>,
}

pub struct Workspace {
    mode: WorkspaceMode,
    service: Arc<dyn ExecutionService>,
    problems: Arc<dyn ProblemRepository>,
    answers: Arc<dyn AnswerStore>,
    status_source: Option<Arc<dyn ProblemStatusSource>>,
    timeout: Duration,

    problem_ids: Vec<String>,
    position: Option<usize>,
    problem: Option<ProblemSchema>,
    problem_status: Option<ProblemStatus>,

    language: Language,
    code: String,
    code_edited: bool,
    cases: TestCaseSet,
    mcq: McqState,

    run_state: RunState,
    submit_state: SubmitState,
    active_tab: ResultTab,
    clearing: bool,
    /// Ticket of the most recently started run/submit; only it may fill `results`
    results_owner: Option<Uuid>,
    results: Vec<ResultRecord>,
    run_summary: Option<RunSummary>,
    submit_summary: Option<SubmitSummary>,
    notice: Option<Notice>,

    in_flight_run: Option<InFlight>,
    in_flight_submit: Option<InFlight>,
    completions_tx: mpsc::UnboundedSender<Completion>,
    completions_rx: mpsc::UnboundedReceiver<Completion>,
}

impl Workspace {
    pub fn new(
        mode: WorkspaceMode,
        service: Arc<dyn ExecutionService>,
        problems: Arc<dyn ProblemRepository>,
        answers: Arc<dyn AnswerStore>,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();

        Self {
            mode,
            service,
            problems,
            answers,
            status_source: None,
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            problem_ids: Vec::new(),
            position: None,
            problem: None,
            problem_status: None,
            language: Language::Python,
            code: String::new(),
            code_edited: false,
            cases: TestCaseSet::default(),
            mcq: McqState::default(),
            run_state: RunState::Idle,
            submit_state: SubmitState::Idle,
            active_tab: ResultTab::TestCases,
            clearing: false,
            results_owner: None,
            results: Vec::new(),
            run_summary: None,
            submit_summary: None,
            notice: None,
            in_flight_run: None,
            in_flight_submit: None,
            completions_tx,
            completions_rx,
        }
    }

    /// Practice workspace: MCQ answers are forgotten on every problem change
    pub fn practice(
        service: Arc<dyn ExecutionService>,
        problems: Arc<dyn ProblemRepository>,
        problem_ids: Vec<String>,
    ) -> Self {
        Self::new(WorkspaceMode::Practice, service, problems, Arc::new(NoopAnswerStore))
            .with_problem_list(problem_ids)
    }

    /// Contest workspace for one attempt.
    ///
    /// Refuses unregistered learners. `answers` is the attempt's store; the
    /// caller keeps its own clone to outlive this workspace.
    pub async fn contest(
        contests: &dyn ContestRepository,
        contest_id: &str,
        service: Arc<dyn ExecutionService>,
        problems: Arc<dyn ProblemRepository>,
        answers: AttemptAnswerStore,
    ) -> Result<Self, RepositoryError> {
        let contest = contests.get_contest(contest_id).await?;
        if !contest.is_registered {
            warn!(contest_id, "Learner is not registered for contest");
            return Err(RepositoryError::NotRegistered(contest_id.to_string()));
        }

        let problem_ids = contest.problems.into_iter().map(|p| p.id).collect();
        let mode = WorkspaceMode::Contest {
            contest_id: contest_id.to_string(),
        };

        info!(contest_id, "Contest workspace ready");
        Ok(Self::new(mode, service, problems, Arc::new(answers)).with_problem_list(problem_ids))
    }

    pub fn with_problem_list(mut self, problem_ids: Vec<String>) -> Self {
        self.problem_ids = problem_ids;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_status_source(mut self, source: Arc<dyn ProblemStatusSource>) -> Self {
        self.status_source = Some(source);
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn mode(&self) -> &WorkspaceMode {
        &self.mode
    }

    pub fn problem(&self) -> Option<&ProblemSchema> {
        self.problem.as_ref()
    }

    pub fn problem_ids(&self) -> &[String] {
        &self.problem_ids
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn problem_status(&self) -> Option<ProblemStatus> {
        self.problem_status
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn cases(&self) -> &TestCaseSet {
        &self.cases
    }

    pub fn mcq(&self) -> &McqState {
        &self.mcq
    }

    pub fn run_state(&self) -> RunState {
        self.run_state
    }

    pub fn submit_state(&self) -> SubmitState {
        self.submit_state
    }

    pub fn is_running(&self) -> bool {
        self.run_state == RunState::Running
    }

    pub fn is_submitting(&self) -> bool {
        self.submit_state == SubmitState::Submitting
    }

    pub fn active_tab(&self) -> ResultTab {
        self.active_tab
    }

    pub fn set_active_tab(&mut self, tab: ResultTab) {
        self.active_tab = tab;
    }

    pub fn is_clearing(&self) -> bool {
        self.clearing
    }

    /// Raw records. Renderers must go through `result_views`.
    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    pub fn result_views(&self) -> Vec<ResultView<'_>> {
        self.results.iter().map(ResultRecord::view).collect()
    }

    pub fn run_summary(&self) -> Option<RunSummary> {
        self.run_summary
    }

    pub fn submit_summary(&self) -> Option<&SubmitSummary> {
        self.submit_summary.as_ref()
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    fn problem_id(&self) -> Result<&str, ValidationError> {
        self.problem
            .as_ref()
            .map(|p| p.id.as_str())
            .ok_or(ValidationError::NoProblemLoaded)
    }

    fn reject(&mut self, err: ValidationError) -> ValidationError {
        debug!(error = %err, "Action rejected");
        self.notice = Some(Notice::error(err.to_string()));
        err
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Load `problem_id` and reset the workspace around it.
    ///
    /// On failure the current problem stays on screen and a notice is raised.
    pub async fn open(&mut self, problem_id: &str) -> Result<(), RepositoryError> {
        let schema = match self.problems.get_problem(problem_id).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!(problem_id, error = %e, "Failed to load problem");
                self.notice = Some(Notice::error(format!("Could not load problem: {}", e)));
                return Err(e);
            }
        };

        self.cancel_in_flight();
        self.enter(schema);
        Ok(())
    }

    /// Returns `false` when already on the last problem
    pub async fn next(&mut self) -> Result<bool, RepositoryError> {
        let target = match self.position {
            Some(pos) if pos + 1 < self.problem_ids.len() => pos + 1,
            None if !self.problem_ids.is_empty() => 0,
            _ => return Ok(false),
        };
        self.open_at(target).await
    }

    /// Returns `false` when already on the first problem
    pub async fn previous(&mut self) -> Result<bool, RepositoryError> {
        let target = match self.position {
            Some(pos) if pos > 0 => pos - 1,
            _ => return Ok(false),
        };
        self.open_at(target).await
    }

    /// Jump to a uniformly random other problem of the list
    pub async fn shuffle(&mut self) -> Result<bool, RepositoryError> {
        let len = self.problem_ids.len();
        let target = match self.position {
            _ if len == 0 => return Ok(false),
            Some(_) if len == 1 => return Ok(false),
            Some(pos) => {
                let offset = rand::thread_rng().gen_range(1..len);
                (pos + offset) % len
            }
            None => rand::thread_rng().gen_range(0..len),
        };
        self.open_at(target).await
    }

    async fn open_at(&mut self, index: usize) -> Result<bool, RepositoryError> {
        let id = self.problem_ids[index].clone();
        self.open(&id).await?;
        Ok(true)
    }

    fn enter(&mut self, schema: ProblemSchema) {
        info!(
            problem_id = %schema.id,
            question_type = ?schema.question_type,
            visible_cases = schema.test_cases.iter().filter(|tc| !tc.is_hidden).count(),
            "Entering problem"
        );

        self.position = self.problem_ids.iter().position(|id| *id == schema.id);
        self.cases = TestCaseSet::from_problem(&schema);
        self.code = schema.starter_code(self.language);
        self.code_edited = false;

        self.mcq = self.answers.get(&schema.id).map(McqState::from).unwrap_or_default();

        self.run_state = RunState::Idle;
        self.submit_state = SubmitState::Idle;
        self.active_tab = ResultTab::TestCases;
        self.clearing = false;
        self.results_owner = None;
        self.results.clear();
        self.run_summary = None;
        self.submit_summary = None;
        self.problem_status = None;
        self.notice = None;
        self.problem = Some(schema);
    }

    /// Abort in-flight run/submit tasks and forget their tickets
    fn cancel_in_flight(&mut self) {
        for flight in [self.in_flight_run.take(), self.in_flight_submit.take()]
            .into_iter()
            .flatten()
        {
            debug!(ticket = %flight.ticket, problem_id = %flight.problem_id, "Cancelling in-flight request");
            flight.handle.abort();
        }
    }

    // -----------------------------------------------------------------------
    // Editor and test cases
    // -----------------------------------------------------------------------

    pub fn set_code(&mut self, code: impl Into<String>) {
        self.code = code.into();
        self.code_edited = true;
    }

    /// Switch language. An untouched editor follows the starter code.
    pub fn set_language(&mut self, language: Language) {
        self.language = language;
        if !self.code_edited {
            if let Some(problem) = &self.problem {
                self.code = problem.starter_code(language);
            }
        }
    }

    pub fn add_case(&mut self) -> usize {
        self.active_tab = ResultTab::TestCases;
        self.cases.add_case()
    }

    /// Silently ignored for teacher-provided cases
    pub fn update_case_field(&mut self, case_index: usize, field_index: usize, value: impl Into<String>) {
        if let Err(e) = self.cases.update_field(case_index, field_index, value) {
            debug!(case_index, field_index, error = %e, "Case edit dropped");
        }
    }

    /// Silently ignored for teacher-provided cases
    pub fn delete_case(&mut self, case_index: usize) {
        if let Err(e) = self.cases.delete_case(case_index) {
            debug!(case_index, error = %e, "Case delete dropped");
        }
    }

    pub fn select_case(&mut self, case_index: usize) {
        if self.cases.set_active(case_index).is_ok() {
            self.active_tab = ResultTab::TestCases;
        }
    }

    // -----------------------------------------------------------------------
    // Run / Submit
    // -----------------------------------------------------------------------

    /// Validate, enter `Running` and dispatch the run in the background.
    ///
    /// Rejections leave the displayed results untouched.
    pub fn start_run(&mut self) -> Result<Uuid, ValidationError> {
        let problem_id = self.problem_id()?.to_string();
        if self.problem.as_ref().is_some_and(ProblemSchema::is_mcq) {
            return Err(self.reject(ValidationError::NotCodingProblem));
        }

        let sent_cases = self.cases.cases().to_vec();
        let run_request = match request::build_run_request(&problem_id, &self.code, self.language, &sent_cases) {
            Ok(req) => req,
            Err(e) => return Err(self.reject(e)),
        };

        if let Some(previous) = self.in_flight_run.take() {
            debug!(ticket = %previous.ticket, "Superseding in-flight run");
            previous.handle.abort();
        }

        let ticket = Uuid::new_v4();
        self.run_state = RunState::Running;
        self.begin_request(ticket);

        let service = Arc::clone(&self.service);
        let tx = self.completions_tx.clone();
        let timeout = self.timeout;

        info!(
            ticket = %ticket,
            problem_id = %problem_id,
            language = %self.language,
            test_cases = sent_cases.len(),
            source_size = self.code.len(),
            "Run dispatched"
        );

        let handle = tokio::spawn(async move {
            let outcome = guarded_call(timeout, service.run(&run_request)).await;
            let _ = tx.send(Completion::Run { ticket, outcome });
        });

        self.in_flight_run = Some(InFlight {
            ticket,
            problem_id,
            handle,
            sent_cases,
        });
        Ok(ticket)
    }

    /// Validate, enter `Submitting` and dispatch the submission in the background
    pub fn start_submit(&mut self) -> Result<Uuid, ValidationError> {
        let problem_id = self.problem_id()?.to_string();
        if self.problem.as_ref().is_some_and(ProblemSchema::is_mcq) {
            return Err(self.reject(ValidationError::NotCodingProblem));
        }
        if self.in_flight_submit.is_some() {
            return Err(self.reject(ValidationError::SubmitInProgress));
        }

        let submit_request = match request::build_submit_request(
            &problem_id,
            self.mode.contest_id(),
            &self.code,
            self.language,
        ) {
            Ok(req) => req,
            Err(e) => return Err(self.reject(e)),
        };

        let ticket = Uuid::new_v4();
        self.submit_state = SubmitState::Submitting;
        self.begin_request(ticket);

        let service = Arc::clone(&self.service);
        let tx = self.completions_tx.clone();
        let timeout = self.timeout;

        info!(
            ticket = %ticket,
            problem_id = %problem_id,
            contest_id = ?self.mode.contest_id(),
            language = %self.language,
            source_size = self.code.len(),
            "Submission dispatched"
        );

        let handle = tokio::spawn(async move {
            let outcome = guarded_call(timeout, service.submit(&submit_request)).await;
            let _ = tx.send(Completion::Submit { ticket, outcome });
        });

        self.in_flight_submit = Some(InFlight {
            ticket,
            problem_id,
            handle,
            sent_cases: Vec::new(),
        });
        Ok(ticket)
    }

    fn begin_request(&mut self, ticket: Uuid) {
        self.active_tab = ResultTab::Result;
        self.clearing = true;
        self.results_owner = Some(ticket);
        self.results.clear();
        self.run_summary = None;
        self.submit_summary = None;
        self.notice = None;
    }

    /// Run and wait for this run's own completion
    pub async fn run(&mut self) -> Result<(), ValidationError> {
        let ticket = self.start_run()?;
        while self.in_flight_run.as_ref().is_some_and(|f| f.ticket == ticket) {
            if !self.wait_for_completion().await {
                break;
            }
        }
        Ok(())
    }

    /// Submit and wait for this submission's own completion
    pub async fn submit(&mut self) -> Result<(), ValidationError> {
        let ticket = self.start_submit()?;
        while self.in_flight_submit.as_ref().is_some_and(|f| f.ticket == ticket) {
            if !self.wait_for_completion().await {
                break;
            }
        }
        Ok(())
    }

    /// Wait for the next completion that still applies.
    ///
    /// Returns `false` immediately when nothing is in flight.
    pub async fn wait_for_completion(&mut self) -> bool {
        loop {
            if self.in_flight_run.is_none() && self.in_flight_submit.is_none() {
                return false;
            }
            match self.completions_rx.recv().await {
                Some(completion) => {
                    if self.apply(completion).await {
                        return true;
                    }
                }
                None => return false,
            }
        }
    }

    /// Apply whatever completions have already arrived, without waiting
    pub async fn poll_completions(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(completion) = self.completions_rx.try_recv() {
            if self.apply(completion).await {
                applied += 1;
            }
        }
        applied
    }

    fn take_matching(slot: &mut Option<InFlight>, ticket: Uuid) -> Option<InFlight> {
        match slot {
            Some(flight) if flight.ticket == ticket => slot.take(),
            _ => None,
        }
    }

    async fn apply(&mut self, completion: Completion) -> bool {
        let current = self.problem.as_ref().map(|p| p.id.clone());

        match completion {
            Completion::Run { ticket, outcome } => {
                let Some(flight) = Self::take_matching(&mut self.in_flight_run, ticket) else {
                    debug!(ticket = %ticket, "Discarding stale run completion");
                    return false;
                };
                if current.as_deref() != Some(flight.problem_id.as_str()) {
                    debug!(ticket = %ticket, problem_id = %flight.problem_id, "Discarding run for another problem");
                    return false;
                }
                self.finish_run(&flight, outcome);
                true
            }
            Completion::Submit { ticket, outcome } => {
                let Some(flight) = Self::take_matching(&mut self.in_flight_submit, ticket) else {
                    debug!(ticket = %ticket, "Discarding stale submit completion");
                    return false;
                };
                if current.as_deref() != Some(flight.problem_id.as_str()) {
                    debug!(ticket = %ticket, problem_id = %flight.problem_id, "Discarding submission for another problem");
                    return false;
                }
                let completed = self.finish_submit(&flight, outcome);
                if completed {
                    self.refresh_problem_status(&flight.problem_id).await;
                }
                true
            }
        }
    }

    /// Hand `records` to the results panel unless a later request owns it
    fn publish_results(&mut self, ticket: Uuid, records: Vec<ResultRecord>) {
        if self.results_owner != Some(ticket) {
            debug!(ticket = %ticket, "Results panel owned by a later request, keeping its contents");
            return;
        }
        self.clearing = false;
        self.results = records;
    }

    fn finish_run(&mut self, flight: &InFlight, outcome: Result<RunData, ServiceError>) {
        match outcome {
            Ok(data) => {
                let empty = data.results.is_empty();
                let records = reconciler::reconcile_run_results(&data.results, &flight.sent_cases);
                let summary = RunSummary::from_records(&records);
                self.publish_results(flight.ticket, records);
                if empty {
                    self.run_summary = None;
                    self.run_state = RunState::RunError;
                } else {
                    self.run_summary = Some(summary);
                    self.run_state = RunState::ResultsReady;
                }

                info!(
                    ticket = %flight.ticket,
                    problem_id = %flight.problem_id,
                    passed = summary.passed,
                    total = summary.total,
                    "Run completed"
                );
            }
            Err(e) => {
                warn!(ticket = %flight.ticket, problem_id = %flight.problem_id, error = %e, "Run failed");
                self.publish_results(flight.ticket, vec![ResultRecord::from_service_error(&e)]);
                self.run_summary = None;
                self.run_state = RunState::RunError;
            }
        }
    }

    fn finish_submit(&mut self, flight: &InFlight, outcome: Result<SubmitData, ServiceError>) -> bool {
        match outcome {
            Ok(data) => {
                let (summary, records) = reconciler::reconcile_submit_results(&data);
                info!(
                    ticket = %flight.ticket,
                    problem_id = %flight.problem_id,
                    verdict = ?summary.verdict,
                    passed = summary.passed_tests,
                    total = summary.total_tests,
                    "Submission graded"
                );
                self.publish_results(flight.ticket, records);
                self.submit_summary = Some(summary);
                self.submit_state = SubmitState::Complete;
                true
            }
            Err(e) => {
                warn!(ticket = %flight.ticket, problem_id = %flight.problem_id, error = %e, "Submission failed");
                self.publish_results(flight.ticket, vec![ResultRecord::from_service_error(&e)]);
                self.submit_summary = None;
                self.submit_state = SubmitState::SubmitError;
                false
            }
        }
    }

    /// Best effort: failures are logged and never touch the submit outcome
    async fn refresh_problem_status(&mut self, problem_id: &str) {
        let Some(source) = self.status_source.clone() else {
            return;
        };

        match tokio::time::timeout(self.timeout, source.refresh_status(problem_id)).await {
            Ok(Ok(status)) => {
                debug!(problem_id, status = ?status, "Problem status refreshed");
                self.problem_status = Some(status);
            }
            Ok(Err(e)) => {
                warn!(problem_id, error = %e, "Problem status refresh failed");
            }
            Err(_) => {
                warn!(problem_id, timeout_ms = self.timeout.as_millis() as u64, "Problem status refresh timed out");
            }
        }
    }

    // -----------------------------------------------------------------------
    // MCQ
    // -----------------------------------------------------------------------

    fn current_mcq(&self) -> Result<&ProblemSchema, ValidationError> {
        match &self.problem {
            None => Err(ValidationError::NoProblemLoaded),
            Some(problem) if !problem.is_mcq() => Err(ValidationError::NotMcqProblem),
            Some(problem) => Ok(problem),
        }
    }

    /// Pull a committed answer for `problem_id` from the shared store onto the
    /// screen. Returns `true` when one exists.
    fn restore_committed_answer(&mut self, problem_id: &str) -> bool {
        match self.answers.get(problem_id) {
            Some(entry) if entry.submitted => {
                debug!(problem_id, "Restored answer committed elsewhere in this attempt");
                self.mcq = McqState::from(entry);
                true
            }
            _ => false,
        }
    }

    /// Change the selection. Locked once the answer is submitted.
    pub fn select_option(&mut self, option_index: usize) -> Result<(), ValidationError> {
        let (problem_id, option_count) = match self.current_mcq() {
            Ok(problem) => (problem.id.clone(), problem.mcq_options.len()),
            Err(e) => return Err(self.reject(e)),
        };

        if self.mcq.submitted || self.restore_committed_answer(&problem_id) {
            return Err(ValidationError::AlreadySubmitted);
        }
        if option_index >= option_count {
            return Err(self.reject(ValidationError::OptionOutOfRange(option_index)));
        }

        self.mcq.selected = Some(option_index);
        self.answers.set_selection(&problem_id, option_index);
        Ok(())
    }

    /// Submit the selected option. One submission per problem per attempt.
    ///
    /// `Ok(None)` means the backend call failed; the notice carries why.
    pub async fn submit_mcq(&mut self) -> Result<Option<McqOutcome>, ValidationError> {
        let (problem_id, options) = match self.current_mcq() {
            Ok(problem) => (problem.id.clone(), problem.mcq_options.clone()),
            Err(e) => return Err(self.reject(e)),
        };

        if self.mcq.submitted || self.restore_committed_answer(&problem_id) {
            return Err(self.reject(ValidationError::AlreadySubmitted));
        }
        let Some(selected) = self.mcq.selected else {
            return Err(self.reject(ValidationError::NoOptionSelected));
        };
        let Some(option) = options.get(selected) else {
            return Err(self.reject(ValidationError::OptionOutOfRange(selected)));
        };

        let mcq_request = request::build_mcq_request(&problem_id, self.mode.contest_id(), selected, option.is_correct);

        self.submit_state = SubmitState::Submitting;
        self.notice = None;

        let outcome = guarded_call(self.timeout, self.service.submit_mcq(&mcq_request)).await;

        if let Err(e) = outcome {
            warn!(problem_id = %problem_id, error = %e, "MCQ submission failed");
            self.submit_state = SubmitState::SubmitError;
            self.notice = Some(Notice::error(format!("Failed to submit answer: {}", e)));
            // Nothing was committed, so the learner may retry
            return Ok(None);
        }

        let result = McqOutcome {
            is_correct: option.is_correct,
            selected_option: option.text.clone(),
        };

        if self.answers.commit(&problem_id, selected, result.clone()) == CommitOutcome::AlreadySubmitted {
            warn!(problem_id = %problem_id, "Answer store already held a submission, keeping the stored one");
            self.restore_committed_answer(&problem_id);
            self.submit_state = SubmitState::Complete;
            return Err(self.reject(ValidationError::AlreadySubmitted));
        }

        self.mcq = McqState {
            selected: Some(selected),
            submitted: true,
            result: Some(result.clone()),
        };
        self.submit_state = SubmitState::Complete;
        self.notice = Some(Notice::info(if result.is_correct { "Correct answer" } else { "Incorrect answer" }));

        info!(problem_id = %problem_id, is_correct = result.is_correct, "MCQ answer submitted");
        Ok(Some(result))
    }
}

/// Bound `call` by `timeout`; a panicking service comes back as a transport error
async fn guarded_call<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, ServiceError> {
    match tokio::time::timeout(timeout, AssertUnwindSafe(call).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(ServiceError::Transport("Execution service panicked".to_string())),
        Err(_) => Err(ServiceError::Timeout(timeout)),
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.cancel_in_flight();
    }
}
