//! Trail-generation session state machine
//!
//! A session progresses through four sequential steps:
//! SEARCHING → FILTERING → ORGANIZING → FINALIZING → COMPLETED.
//!
//! Transitions are forward-only. A failed step substitutes degraded data
//! (approve-all, single-section passthrough, zero results) and the machine
//! still advances; only a persistence failure ends in FAILED. The machine
//! starts in IDLE and `begin` is a guard-clause no-op unless the state is
//! IDLE, which makes the whole sequence single-flight under duplicate
//! trigger calls.

use blimari_common::events::TrailStep;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ContentSource;

/// Trail-generation session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionState {
    /// Created but not started; the only state `begin` accepts
    Idle,
    /// Fanning out to content sources
    Searching,
    /// AI relevance filter
    Filtering,
    /// AI grouping and ordering
    Organizing,
    /// Persisting the learning path
    Finalizing,
    /// Pipeline finished (possibly with degraded steps)
    Completed,
    /// Persistence failed
    Failed,
}

/// Sub-state of one pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Processing,
    Completed,
}

/// Progress record for one pipeline step
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepProgress {
    pub step: TrailStep,
    pub status: StepStatus,
}

/// One run of the content pipeline for one user
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrailSession {
    pub session_id: Uuid,
    pub user_id: String,
    pub topic: String,
    pub sources: Vec<ContentSource>,
    pub answers: Vec<String>,
    pub language: String,
    pub state: SessionState,
    pub steps: Vec<StepProgress>,
    /// Percentage complete (0.0 - 100.0), from completed step count
    pub percentage: f64,
    pub current_operation: String,
    /// Set when finalize persisted a path
    #[serde(skip_serializing_if = "Option::is_none")]
    pub learning_path_id: Option<Uuid>,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl TrailSession {
    /// Create a new session in the idle state
    pub fn new(
        user_id: String,
        topic: String,
        sources: Vec<ContentSource>,
        answers: Vec<String>,
        language: String,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            topic,
            sources,
            answers,
            language,
            state: SessionState::Idle,
            steps: TrailStep::ALL
                .iter()
                .map(|&step| StepProgress {
                    step,
                    status: StepStatus::Pending,
                })
                .collect(),
            percentage: 0.0,
            current_operation: String::from("Waiting to start"),
            learning_path_id: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// One-shot start guard
    ///
    /// Returns true and transitions to SEARCHING only from IDLE; any other
    /// state is a no-op returning false. Re-entrant trigger calls therefore
    /// run the pipeline at most once.
    pub fn begin(&mut self) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.state = SessionState::Searching;
        self.started_at = Utc::now();
        true
    }

    /// Transition to a new state, stamping `ended_at` on terminal states
    pub fn transition_to(&mut self, new_state: SessionState) {
        self.state = new_state;
        if self.is_terminal() {
            self.ended_at = Some(Utc::now());
        }
    }

    /// Mark a step as processing and describe the current operation
    pub fn start_step(&mut self, step: TrailStep, operation: impl Into<String>) {
        self.set_step_status(step, StepStatus::Processing);
        self.current_operation = operation.into();
    }

    /// Mark a step completed and advance the percentage
    ///
    /// Degraded completions (fallback data) use this too: the machine always
    /// advances.
    pub fn complete_step(&mut self, step: TrailStep) {
        self.set_step_status(step, StepStatus::Completed);
        let completed = self
            .steps
            .iter()
            .filter(|s| s.status == StepStatus::Completed)
            .count();
        self.percentage = (completed as f64 / self.steps.len() as f64) * 100.0;
    }

    /// Whether every step reached the completed sub-state
    pub fn all_steps_completed(&self) -> bool {
        self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }

    /// Whether the session reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.state, SessionState::Completed | SessionState::Failed)
    }

    fn set_step_status(&mut self, step: TrailStep, status: StepStatus) {
        if let Some(entry) = self.steps.iter_mut().find(|s| s.step == step) {
            entry.status = status;
        }
    }
}
