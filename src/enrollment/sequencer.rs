//! Sequencer — owns the answers, the cursor and the submission transition.
//!
//! The cursor is stored as the id of the active step. Its index is looked up
//! in the visible list on demand, so edits that add or remove steps keep the
//! student on the same question whenever it is still shown.

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{ExportError, StepError, SubmissionError};

use super::assistant::SubmissionBackend;
use super::contract::ContractDocument;
use super::handoff;
use super::model::{AnswerSet, FieldEdit};
use super::state::WizardPhase;
use super::steps::{self, STEPS, Step, StepId};

/// Outcome of a successful `advance`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// The cursor moved to this step.
    Moved(StepId),
    /// The last visible step passed; the next move is a submission.
    ReadyToSubmit,
}

/// Outcome of a successful `next`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Moved(StepId),
    Submitted,
}

/// What the backend produced for a finished enrollment.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionResult {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub greeting: String,
    pub export_record: String,
}

/// Drives one enrollment from the first question to submission.
#[derive(Debug, Clone, Default)]
pub struct Sequencer {
    answers: AnswerSet,
    active: StepId,
    error: Option<StepError>,
    phase: WizardPhase,
    terms_read: bool,
    result: Option<SubmissionResult>,
    today: Option<NaiveDate>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin the reference date used for ages and birth-date checks.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    /// The error shown under the active step, if any.
    pub fn error(&self) -> Option<&StepError> {
        self.error.as_ref()
    }

    pub fn result(&self) -> Option<&SubmissionResult> {
        self.result.as_ref()
    }

    pub fn terms_read(&self) -> bool {
        self.terms_read
    }

    pub fn visible_steps(&self) -> Vec<&'static Step> {
        steps::visible_steps(&self.answers)
    }

    pub fn current_step(&self) -> &'static Step {
        Step::get(self.active)
    }

    /// Prompt for the active step, accounting for minor-specific wording.
    pub fn current_prompt(&self) -> &'static str {
        self.current_step().prompt_for(&self.answers)
    }

    /// Index of the active step in the visible list.
    pub fn cursor(&self) -> usize {
        self.visible_steps()
            .iter()
            .position(|s| s.id == self.active)
            .unwrap_or(0)
    }

    pub fn is_last_step(&self) -> bool {
        self.cursor() + 1 == self.visible_steps().len()
    }

    // ── Mutations ───────────────────────────────────────────────────

    /// Apply a field edit and recompute everything derived from it.
    pub fn edit(&mut self, edit: FieldEdit) -> Result<(), StepError> {
        if !self.phase.accepts_input() {
            return Err(StepError::Locked);
        }
        if edit == FieldEdit::TermsAccepted(true) && !self.terms_read {
            warn!("Terms accepted before being read");
            self.error = Some(StepError::TermsNotRead);
            return Err(StepError::TermsNotRead);
        }

        self.error = None;
        let was_minor = self.answers.is_minor;
        let step = edit.step_id();
        let today = self.today();
        self.answers.apply(edit, today);
        if self.answers.is_minor != was_minor {
            info!(is_minor = self.answers.is_minor, "Minor status changed");
        }
        debug!(step = %step, "Field edited");
        self.reanchor();
        Ok(())
    }

    /// Record that the terms text was scrolled to the end. One-way.
    pub fn mark_terms_read(&mut self) {
        if !self.terms_read {
            debug!("Terms read");
        }
        self.terms_read = true;
    }

    /// Keep the active step if still visible, otherwise fall back to the
    /// closest visible step declared before it.
    fn reanchor(&mut self) {
        if Step::get(self.active).is_visible(&self.answers) {
            return;
        }
        let from = self.active;
        self.active = STEPS[..Step::position(from)]
            .iter()
            .rev()
            .find(|s| s.is_visible(&self.answers))
            .map_or(StepId::Name, |s| s.id);
        info!(from = %from, to = %self.active, "Active step hidden, cursor re-anchored");
    }

    /// Validate the active step and move forward.
    pub fn advance(&mut self) -> Result<Advance, StepError> {
        if !self.phase.accepts_input() {
            return Err(StepError::Locked);
        }
        let step = self.current_step();
        if let Err(e) = step.validate(&self.answers, self.today()) {
            debug!(step = %step.id, error = %e, "Step rejected");
            self.error = Some(e.clone());
            return Err(e);
        }
        self.error = None;

        let visible = self.visible_steps();
        match visible.get(self.cursor() + 1) {
            Some(next) => {
                self.active = next.id;
                debug!(step = %next.id, "Advanced");
                Ok(Advance::Moved(next.id))
            }
            None => Ok(Advance::ReadyToSubmit),
        }
    }

    /// Step back one question. No-op on the first one.
    pub fn retreat(&mut self) -> StepId {
        if !self.phase.accepts_input() {
            return self.active;
        }
        self.error = None;
        let cursor = self.cursor();
        if cursor > 0 {
            self.active = self.visible_steps()[cursor - 1].id;
        }
        self.active
    }

    /// `advance`, then submit if the last step just passed.
    pub async fn next(
        &mut self,
        backend: &dyn SubmissionBackend,
    ) -> Result<Progress, SubmissionError> {
        let step = self.active;
        match self.advance() {
            Ok(Advance::Moved(id)) => Ok(Progress::Moved(id)),
            Ok(Advance::ReadyToSubmit) => {
                self.submit(backend).await?;
                Ok(Progress::Submitted)
            }
            Err(reason) => Err(SubmissionError::Invalid { step, reason }),
        }
    }

    /// Run the submission transition from the last visible step.
    ///
    /// Every visible step is validated again first; the cursor moves to the
    /// first one that no longer passes.
    pub async fn submit(
        &mut self,
        backend: &dyn SubmissionBackend,
    ) -> Result<&SubmissionResult, SubmissionError> {
        match self.phase {
            WizardPhase::Submitting => return Err(SubmissionError::InProgress),
            WizardPhase::Submitted => return Err(SubmissionError::AlreadySubmitted),
            WizardPhase::Active => {}
        }
        if !self.is_last_step() {
            return Err(SubmissionError::NotAtLastStep { step: self.active });
        }

        let today = self.today();
        for step in self.visible_steps() {
            if let Err(reason) = step.validate(&self.answers, today) {
                warn!(step = %step.id, error = %reason, "Stale step blocks submission");
                self.active = step.id;
                self.error = Some(reason.clone());
                return Err(SubmissionError::StaleStep {
                    step: step.id,
                    reason,
                });
            }
        }

        self.error = None;
        self.transition_to(WizardPhase::Submitting)?;
        info!(course = %self.answers.course, is_minor = self.answers.is_minor, "Submitting enrollment");

        let (greeting, record) = tokio::join!(
            backend.greet(&self.answers.name, self.answers.course),
            backend.export_record(&self.answers),
        );

        match (greeting, record) {
            (Ok(greeting), Ok(export_record)) => {
                let result = SubmissionResult {
                    id: Uuid::new_v4(),
                    submitted_at: Utc::now(),
                    greeting,
                    export_record,
                };
                self.transition_to(WizardPhase::Submitted)?;
                info!(id = %result.id, "Enrollment submitted");
                Ok(&*self.result.insert(result))
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Submission failed");
                self.transition_to(WizardPhase::Active)?;
                self.error = Some(StepError::SubmissionFailed);
                Err(e)
            }
        }
    }

    fn transition_to(&mut self, target: WizardPhase) -> Result<(), SubmissionError> {
        if !self.phase.can_transition_to(target) {
            return Err(SubmissionError::InvalidTransition {
                from: self.phase,
                to: target,
            });
        }
        debug!(from = %self.phase, to = %target, "Phase transition");
        self.phase = target;
        Ok(())
    }

    /// Back to an empty form on the first step.
    pub fn reset(&mut self) {
        *self = Self {
            today: self.today,
            ..Self::default()
        };
        info!("Enrollment reset");
    }

    // ── Post-submission artifacts ───────────────────────────────────

    /// Contract for the submitted enrollment, dated today.
    pub fn contract(&self) -> Result<ContractDocument, ExportError> {
        if !self.phase.is_terminal() {
            return Err(ExportError::NotSubmitted);
        }
        Ok(ContractDocument::render(&self.answers, self.today()))
    }

    /// Pre-filled WhatsApp link for the submitted enrollment.
    pub fn whatsapp_link(&self, number: &str) -> Result<String, ExportError> {
        if !self.phase.is_terminal() {
            return Err(ExportError::NotSubmitted);
        }
        Ok(handoff::whatsapp_link(number, &self.answers))
    }
}
