//! Optional e-mail ownership check.
//!
//! The code is generated by the assistant and handed back to the caller to
//! deliver; nothing here sends mail.

use tracing::info;

use crate::error::VerificationError;

use super::assistant::EnrollmentAssistant;
use super::validate;

/// Length of a verification code.
pub const CODE_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VerificationStatus {
    #[default]
    Unverified,
    CodeSent,
    Verified,
}

/// Verification state for a single e-mail address.
#[derive(Debug, Clone, Default)]
pub struct EmailVerification {
    email: String,
    expected: Option<String>,
    entered: String,
    status: VerificationStatus,
}

impl EmailVerification {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> VerificationStatus {
        self.status
    }

    /// Digits typed so far.
    pub fn entered(&self) -> &str {
        &self.entered
    }

    /// Whether `email` is the address that was verified.
    pub fn is_verified_for(&self, email: &str) -> bool {
        self.status == VerificationStatus::Verified && self.email == email.trim()
    }

    /// Forget everything when the address differs from the one in progress.
    pub fn sync_email(&mut self, email: &str) {
        if self.email != email.trim() {
            *self = Self::default();
        }
    }

    /// Generate and remember a code for `email`, returning it for delivery.
    pub async fn request_code(
        &mut self,
        email: &str,
        assistant: &EnrollmentAssistant,
    ) -> Result<String, VerificationError> {
        if !validate::is_strict_email(email) {
            return Err(VerificationError::InvalidEmail);
        }
        let code = assistant.verification_code().await;
        self.email = email.trim().to_string();
        self.expected = Some(code.clone());
        self.entered.clear();
        self.status = VerificationStatus::CodeSent;
        info!(email = %self.email, "Verification code issued");
        Ok(code)
    }

    /// Record typed input. Non-digits are dropped and the input is cut to
    /// `CODE_LEN`; a full-length entry is checked against the issued code.
    pub fn enter_code(&mut self, raw: &str) -> Result<VerificationStatus, VerificationError> {
        let Some(expected) = &self.expected else {
            return Err(VerificationError::NoCodeRequested);
        };
        self.entered = validate::digits(raw).chars().take(CODE_LEN).collect();
        if self.entered.len() < CODE_LEN {
            self.status = VerificationStatus::CodeSent;
            return Ok(self.status);
        }
        if &self.entered == expected {
            self.status = VerificationStatus::Verified;
            info!(email = %self.email, "E-mail verified");
            Ok(self.status)
        } else {
            self.status = VerificationStatus::CodeSent;
            Err(VerificationError::IncorrectCode)
        }
    }
}
