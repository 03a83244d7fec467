//! Enrollment wizard: field validation, step sequencing and submission.
//!
//! The flow:
//! 1. The caller feeds `FieldEdit`s to a [`Sequencer`]; values are masked on
//!    the way in and the visible step list is recomputed.
//! 2. `advance` gates each step with its validation rule.
//! 3. Past the last visible step, `submit` asks a [`SubmissionBackend`] for a
//!    greeting and an export record, concurrently.
//! 4. A submitted enrollment yields a [`ContractDocument`] and a WhatsApp
//!    hand-off link.

pub mod assistant;
pub mod contract;
pub mod export;
pub mod handoff;
pub mod model;
pub mod sequencer;
pub mod state;
pub mod steps;
pub mod validate;
pub mod verification;

pub use assistant::{EnrollmentAssistant, SubmissionBackend};
pub use contract::ContractDocument;
pub use model::{AnswerSet, CardPaymentPlan, CourseOption, FieldEdit, HowFound, PaymentMethod};
pub use sequencer::{Advance, Progress, Sequencer, SubmissionResult};
pub use state::WizardPhase;
pub use steps::{CONFIRMATION_PHRASE, STEPS, Step, StepId};
pub use verification::{EmailVerification, VerificationStatus};
