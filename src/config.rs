//! Configuration types.

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::llm::{LlmBackend, LlmConfig};

/// WhatsApp number that receives enrollment summaries.
pub const DEFAULT_WHATSAPP_NUMBER: &str = "5542999722042";

/// Tuning for the generative-text assistant.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Sampling temperature for the greeting.
    pub greeting_temperature: f32,
    /// Max tokens for the greeting.
    pub greeting_max_tokens: u32,
    /// Max tokens for the CSV export record.
    pub export_max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            greeting_temperature: 0.7,
            greeting_max_tokens: 300,
            export_max_tokens: 800,
        }
    }
}

/// Top-level configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct EnrollConfig {
    /// `None` runs the assistant offline (local fallbacks only).
    pub llm: Option<LlmConfig>,
    pub assistant: AssistantConfig,
    /// Destination for the hand-off link, digits only with country code.
    pub whatsapp_number: String,
}

impl Default for EnrollConfig {
    fn default() -> Self {
        Self {
            llm: None,
            assistant: AssistantConfig::default(),
            whatsapp_number: DEFAULT_WHATSAPP_NUMBER.to_string(),
        }
    }
}

impl EnrollConfig {
    /// Load from the environment.
    ///
    /// - `ENROLL_API_KEY`: credential for the text service; absent means offline
    /// - `ENROLL_LLM_BACKEND`: `anthropic` (default) or `openai`
    /// - `ENROLL_MODEL`: model name, defaults per backend
    /// - `ENROLL_WHATSAPP_NUMBER`: hand-off destination
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let backend = match lookup("ENROLL_LLM_BACKEND") {
            Some(raw) => raw
                .parse::<LlmBackend>()
                .map_err(|message| ConfigError::InvalidValue {
                    key: "ENROLL_LLM_BACKEND".to_string(),
                    message,
                })?,
            None => LlmBackend::Anthropic,
        };

        let llm = match lookup("ENROLL_API_KEY") {
            Some(key) if !key.trim().is_empty() => Some(LlmConfig {
                backend,
                api_key: SecretString::from(key),
                model: lookup("ENROLL_MODEL")
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| backend.default_model().to_string()),
            }),
            Some(_) => {
                return Err(ConfigError::InvalidValue {
                    key: "ENROLL_API_KEY".to_string(),
                    message: "must not be blank".to_string(),
                });
            }
            None => None,
        };

        let whatsapp_number = match lookup("ENROLL_WHATSAPP_NUMBER") {
            Some(raw) => {
                let digits = crate::enrollment::validate::digits(&raw);
                if digits.len() < 10 {
                    return Err(ConfigError::InvalidValue {
                        key: "ENROLL_WHATSAPP_NUMBER".to_string(),
                        message: format!("'{raw}' is not a phone number"),
                    });
                }
                digits
            }
            None => DEFAULT_WHATSAPP_NUMBER.to_string(),
        };

        Ok(Self {
            llm,
            assistant: AssistantConfig::default(),
            whatsapp_number,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_is_offline_with_defaults() {
        let config = EnrollConfig::from_lookup(lookup(&[])).unwrap();
        assert!(config.llm.is_none());
        assert_eq!(config.whatsapp_number, DEFAULT_WHATSAPP_NUMBER);
    }

    #[test]
    fn api_key_enables_llm_with_default_model() {
        let config = EnrollConfig::from_lookup(lookup(&[("ENROLL_API_KEY", "sk-test")])).unwrap();
        let llm = config.llm.as_ref().unwrap();
        assert_eq!(llm.backend, LlmBackend::Anthropic);
        assert_eq!(llm.model, LlmBackend::Anthropic.default_model());
        assert_eq!(llm.api_key.expose_secret(), "sk-test");
    }

    #[test]
    fn backend_and_model_overrides() {
        let config = EnrollConfig::from_lookup(lookup(&[
            ("ENROLL_API_KEY", "sk-test"),
            ("ENROLL_LLM_BACKEND", "openai"),
            ("ENROLL_MODEL", "gpt-4o"),
        ]))
        .unwrap();
        let llm = config.llm.unwrap();
        assert_eq!(llm.backend, LlmBackend::OpenAi);
        assert_eq!(llm.model, "gpt-4o");
    }

    #[test]
    fn blank_key_is_an_error() {
        let err = EnrollConfig::from_lookup(lookup(&[("ENROLL_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "ENROLL_API_KEY"));
    }

    #[test]
    fn unknown_backend_is_an_error() {
        let err =
            EnrollConfig::from_lookup(lookup(&[("ENROLL_LLM_BACKEND", "gemini")])).unwrap_err();
        assert!(err.to_string().contains("ENROLL_LLM_BACKEND"));
    }

    #[test]
    fn whatsapp_number_is_normalized_to_digits() {
        let config =
            EnrollConfig::from_lookup(lookup(&[("ENROLL_WHATSAPP_NUMBER", "+55 (11) 91234-5678")]))
                .unwrap();
        assert_eq!(config.whatsapp_number, "5511912345678");
        assert!(
            EnrollConfig::from_lookup(lookup(&[("ENROLL_WHATSAPP_NUMBER", "123")])).is_err()
        );
    }
}
