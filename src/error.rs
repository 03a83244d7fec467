//! Error types for the enrollment wizard.

use crate::enrollment::state::WizardPhase;
use crate::enrollment::steps::StepId;

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field-level validation failure for the active step.
///
/// `Display` yields the user-facing message shown under the step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Este campo é obrigatório.")]
    Required,

    #[error("CPF inválido. Verifique os dígitos.")]
    InvalidCpf,

    #[error("Telefone inválido. Deve ter 10 ou 11 dígitos.")]
    InvalidPhone,

    #[error("RG inválido. Deve ter pelo menos 7 caracteres.")]
    InvalidRg,

    #[error("Data inválida. Use DD/MM/AAAA e não pode ser uma data futura.")]
    InvalidDate,

    #[error("Por favor, insira um formato de e-mail válido (ex: email@dominio.com).")]
    InvalidEmail,

    #[error("A frase de confirmação não corresponde.")]
    SignatureMismatch,

    #[error("Você deve aceitar os termos para continuar.")]
    TermsNotAccepted,

    #[error("Por favor, leia os termos até o final para poder marcar a caixa.")]
    TermsNotRead,

    #[error("Houve um erro ao processar sua inscrição. Tente novamente.")]
    SubmissionFailed,

    #[error("A inscrição não aceita alterações no momento.")]
    Locked,
}

/// Submission transition errors.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("Submission already in progress")]
    InProgress,

    #[error("Enrollment already submitted")]
    AlreadySubmitted,

    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: WizardPhase, to: WizardPhase },

    #[error("Cannot submit from step {step}: not the last visible step")]
    NotAtLastStep { step: StepId },

    #[error("Step {step} is invalid: {reason}")]
    Invalid { step: StepId, reason: StepError },

    #[error("Step {step} is no longer valid: {reason}")]
    StaleStep { step: StepId, reason: StepError },

    #[error("Backend failed: {0}")]
    Backend(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// E-mail verification failures. `Display` is user-facing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationError {
    #[error("Por favor, insira um formato de e-mail válido.")]
    InvalidEmail,

    #[error("Solicite um código de verificação primeiro.")]
    NoCodeRequested,

    #[error("Código de verificação incorreto.")]
    IncorrectCode,
}

/// Contract/hand-off rendering errors. Never affect wizard state.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Enrollment not submitted yet")]
    NotSubmitted,

    #[error("Failed to build export record: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to build PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("Export record is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
