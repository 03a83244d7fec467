//! Generative-text collaborator used at submission time.
//!
//! Every call degrades to a local result when the provider fails or returns
//! something unusable, so a submission only fails when a custom
//! `SubmissionBackend` reports an error.

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{AssistantConfig, EnrollConfig};
use crate::error::{LlmError, Result as CrateResult, SubmissionError};
use crate::llm::{ChatMessage, CompletionRequest, LlmProvider, create_provider};

use super::export;
use super::model::{AnswerSet, CourseOption};

/// What the sequencer needs from the outside world to finish an enrollment.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    /// Personalized welcome message.
    async fn greet(&self, name: &str, course: CourseOption) -> Result<String, SubmissionError>;

    /// CSV header line plus one data line for the enrollment.
    async fn export_record(&self, answers: &AnswerSet) -> Result<String, SubmissionError>;
}

/// Local greeting used when the provider is unavailable.
pub fn fallback_greeting(name: &str, course: CourseOption) -> String {
    format!(
        "Olá {name}, seja muito bem-vinda(o) à LuxAcademy! Estamos incrivelmente felizes por \
         você ter se juntado ao nosso curso de {course}. Prepare-se para uma jornada de \
         transformação e sucesso. Estamos ansiosos para começar!",
        course = course.name()
    )
}

/// Random six-digit code in `100000..=999999`.
pub fn fallback_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

const GREETING_SYSTEM: &str = "Você é a assistente da LuxAcademy by Joyci Almeida, uma academia \
de extensão de cílios. Escreva em português do Brasil, com tom caloroso e profissional. \
Responda apenas com um objeto JSON no formato {\"message\": \"...\"}.";

const EXPORT_SYSTEM: &str = "Você converte dados de inscrição em CSV. Responda apenas com o CSV: \
uma linha de cabeçalho e uma linha de dados, todos os campos entre aspas duplas, sem comentários.";

const CODE_SYSTEM: &str = "Responda apenas com um objeto JSON no formato {\"code\": \"123456\"}, \
contendo um código numérico aleatório de exatamente 6 dígitos.";

#[derive(Debug, Deserialize)]
struct GreetingReply {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CodeReply {
    code: String,
}

/// Pull a JSON object out of model output that may be wrapped in prose or
/// a code fence.
fn extract_json_object(text: &str) -> &str {
    let body = export::strip_code_fence(text);
    match (body.find('{'), body.rfind('}')) {
        (Some(start), Some(end)) if end > start => &body[start..=end],
        _ => body,
    }
}

fn parse_greeting(raw: &str) -> Result<String, LlmError> {
    let reply: GreetingReply = serde_json::from_str(extract_json_object(raw))?;
    let message = reply.message.trim();
    if message.is_empty() {
        return Err(LlmError::InvalidResponse {
            provider: "assistant".to_string(),
            reason: "empty greeting".to_string(),
        });
    }
    Ok(message.to_string())
}

fn parse_code(raw: &str) -> Result<String, LlmError> {
    let reply: CodeReply = serde_json::from_str(extract_json_object(raw))?;
    let code = reply.code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return Err(LlmError::InvalidResponse {
            provider: "assistant".to_string(),
            reason: format!("'{code}' is not a six-digit code"),
        });
    }
    Ok(code.to_string())
}

/// `SubmissionBackend` backed by an optional LLM provider.
pub struct EnrollmentAssistant {
    llm: Option<Arc<dyn LlmProvider>>,
    config: AssistantConfig,
}

impl std::fmt::Debug for EnrollmentAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentAssistant")
            .field("llm", &self.llm.as_ref().map(|l| l.model_name().to_string()))
            .field("config", &self.config)
            .finish()
    }
}

impl EnrollmentAssistant {
    pub fn new(llm: Arc<dyn LlmProvider>, config: AssistantConfig) -> Self {
        Self {
            llm: Some(llm),
            config,
        }
    }

    /// An assistant that always uses the local fallbacks.
    pub fn offline() -> Self {
        Self {
            llm: None,
            config: AssistantConfig::default(),
        }
    }

    /// Build the provider named by `config`, or run offline when no
    /// credential is configured.
    pub fn from_config(config: &EnrollConfig) -> CrateResult<Self> {
        match &config.llm {
            Some(llm) => Ok(Self::new(create_provider(llm)?, config.assistant.clone())),
            None => {
                warn!("ENROLL_API_KEY not set, running with local fallbacks only");
                Ok(Self {
                    llm: None,
                    config: config.assistant.clone(),
                })
            }
        }
    }

    pub fn is_offline(&self) -> bool {
        self.llm.is_none()
    }

    async fn ask(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let Some(llm) = &self.llm else {
            return Err(LlmError::RequestFailed {
                provider: "assistant".to_string(),
                reason: "no provider configured".to_string(),
            });
        };
        let response = llm.complete(request).await?;
        debug!(
            model = llm.model_name(),
            output_tokens = response.output_tokens,
            "Assistant completion received"
        );
        Ok(response.content)
    }

    /// Six-digit e-mail verification code.
    pub async fn verification_code(&self) -> String {
        if self.is_offline() {
            return fallback_code();
        }
        let request = CompletionRequest::new(vec![
            ChatMessage::system(CODE_SYSTEM),
            ChatMessage::user("Gere um código de verificação."),
        ])
        .with_max_tokens(50)
        .with_temperature(1.0);

        match self.ask(request).await.and_then(|raw| parse_code(&raw)) {
            Ok(code) => code,
            Err(e) => {
                warn!(error = %e, "Verification code generation failed, using local code");
                fallback_code()
            }
        }
    }
}

#[async_trait]
impl SubmissionBackend for EnrollmentAssistant {
    async fn greet(&self, name: &str, course: CourseOption) -> Result<String, SubmissionError> {
        if self.is_offline() {
            return Ok(fallback_greeting(name, course));
        }
        let prompt = format!(
            "Escreva uma mensagem de boas-vindas curta (até 3 frases) para {name}, que acabou de \
             se inscrever no curso \"{course}\". Destaque que o curso é {benefit}.",
            course = course.name(),
            benefit = course.benefit()
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(GREETING_SYSTEM),
            ChatMessage::user(prompt),
        ])
        .with_max_tokens(self.config.greeting_max_tokens)
        .with_temperature(self.config.greeting_temperature);

        match self.ask(request).await.and_then(|raw| parse_greeting(&raw)) {
            Ok(message) => Ok(message),
            Err(e) => {
                warn!(error = %e, course = %course, "Greeting generation failed, using template");
                Ok(fallback_greeting(name, course))
            }
        }
    }

    async fn export_record(&self, answers: &AnswerSet) -> Result<String, SubmissionError> {
        let local = || {
            export::export_record(answers).map_err(|e| SubmissionError::Backend(e.to_string()))
        };
        if self.is_offline() {
            return local();
        }
        let data = serde_json::to_string_pretty(answers).map_err(LlmError::from)?;
        let prompt = format!(
            "Converta os dados abaixo em CSV com exatamente estas colunas, nesta ordem: {}.\n\
             Deixe os campos do responsável vazios se a aluna não for menor de idade. \
             Use \"Sim\" ou \"Não\" para campos booleanos.\n\nDados:\n{data}",
            export::EXPORT_COLUMNS.join(", ")
        );
        let request = CompletionRequest::new(vec![
            ChatMessage::system(EXPORT_SYSTEM),
            ChatMessage::user(prompt),
        ])
        .with_max_tokens(self.config.export_max_tokens)
        .with_temperature(0.0);

        match self.ask(request).await {
            Ok(raw) => {
                let csv = export::strip_code_fence(&raw);
                if export::is_well_formed(csv) {
                    Ok(format!("{}\n", csv.trim_end()))
                } else {
                    warn!(response = %raw, "Export record malformed, building locally");
                    local()
                }
            }
            Err(e) => {
                warn!(error = %e, "Export record generation failed, building locally");
                local()
            }
        }
    }
}
