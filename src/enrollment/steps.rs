//! Static step definitions and per-step validation.
//!
//! Steps are plain data: an id, prompt text, a visibility predicate over the
//! [`AnswerSet`] and a validation rule. The visible list is recomputed from
//! this table after every edit; nothing here holds state.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::StepError;

use super::model::{AnswerSet, FieldValue, HowFound, PaymentMethod};
use super::validate;

/// Phrase the signer must type to confirm the contract.
pub const CONFIRMATION_PHRASE: &str = "Eu sou responsável e estou ciente";

/// Identifier of a wizard step. Each step owns exactly one field.
///
/// Variant order matches [`STEPS`], so the discriminant is the step's index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    #[default]
    Name,
    Email,
    Phone,
    Cpf,
    Rg,
    BirthDate,
    ParentName,
    ParentCpf,
    ParentRg,
    Address,
    Course,
    HowFound,
    HowFoundOther,
    Instagram,
    PaymentMethod,
    CardPaymentPlan,
    SignatureConfirmation,
    TermsAccepted,
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Cpf => "cpf",
            Self::Rg => "rg",
            Self::BirthDate => "birth_date",
            Self::ParentName => "parent_name",
            Self::ParentCpf => "parent_cpf",
            Self::ParentRg => "parent_rg",
            Self::Address => "address",
            Self::Course => "course",
            Self::HowFound => "how_found",
            Self::HowFoundOther => "how_found_other",
            Self::Instagram => "instagram",
            Self::PaymentMethod => "payment_method",
            Self::CardPaymentPlan => "card_payment_plan",
            Self::SignatureConfirmation => "signature_confirmation",
            Self::TermsAccepted => "terms_accepted",
        };
        write!(f, "{s}")
    }
}

/// Field-kind check run after the required check passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    None,
    Email,
    Phone,
    Cpf,
    Rg,
    BirthDate,
    Signature,
    Accepted,
}

/// A single wizard step.
#[derive(Debug, Clone, Copy)]
pub struct Step {
    pub id: StepId,
    pub prompt: &'static str,
    /// Prompt used instead of `prompt` when the subject is a minor.
    pub minor_prompt: Option<&'static str>,
    pub placeholder: &'static str,
    pub required: bool,
    pub rule: Rule,
    pub visible: fn(&AnswerSet) -> bool,
}

fn always(_: &AnswerSet) -> bool {
    true
}

fn minor_only(answers: &AnswerSet) -> bool {
    answers.is_minor
}

fn found_elsewhere(answers: &AnswerSet) -> bool {
    answers.how_found == HowFound::Other
}

fn paying_by_card(answers: &AnswerSet) -> bool {
    answers.payment_method == PaymentMethod::Card
}

const fn step(id: StepId, prompt: &'static str, placeholder: &'static str, rule: Rule) -> Step {
    Step {
        id,
        prompt,
        minor_prompt: None,
        placeholder,
        required: true,
        rule,
        visible: always,
    }
}

/// Every step in presentation order.
pub static STEPS: [Step; 18] = [
    step(
        StepId::Name,
        "Primeiramente, qual seu nome completo?",
        "Seu nome completo",
        Rule::None,
    ),
    step(
        StepId::Email,
        "Ótimo! Agora, qual o seu melhor e-mail?",
        "seu.email@exemplo.com",
        Rule::Email,
    ),
    step(
        StepId::Phone,
        "Qual seu número de Telefone/WhatsApp?",
        "(00) 00000-0000",
        Rule::Phone,
    ),
    step(
        StepId::Cpf,
        "Para o contrato, precisamos do seu CPF.",
        "000.000.000-00",
        Rule::Cpf,
    ),
    step(StepId::Rg, "E também do seu RG.", "00.000.000-0", Rule::Rg),
    step(
        StepId::BirthDate,
        "Qual sua data de nascimento?",
        "DD/MM/AAAA",
        Rule::BirthDate,
    ),
    Step {
        visible: minor_only,
        ..step(
            StepId::ParentName,
            "Como você é menor de idade, qual o nome do seu responsável?",
            "Nome completo do responsável",
            Rule::None,
        )
    },
    Step {
        visible: minor_only,
        ..step(
            StepId::ParentCpf,
            "Qual o CPF do responsável?",
            "000.000.000-00",
            Rule::Cpf,
        )
    },
    Step {
        visible: minor_only,
        ..step(
            StepId::ParentRg,
            "E o RG do responsável?",
            "00.000.000-0",
            Rule::Rg,
        )
    },
    step(
        StepId::Address,
        "Qual o seu endereço completo?",
        "Rua, Nº, Bairro, Cidade/Estado, CEP",
        Rule::None,
    ),
    step(
        StepId::Course,
        "Qual curso da LuxAcademy você deseja fazer?",
        "",
        Rule::None,
    ),
    step(StepId::HowFound, "Como você nos encontrou?", "", Rule::None),
    Step {
        visible: found_elsewhere,
        ..step(
            StepId::HowFoundOther,
            "Poderia nos dizer como nos encontrou?",
            "Ex: Anúncio no Facebook, TikTok, etc.",
            Rule::None,
        )
    },
    Step {
        required: false,
        ..step(
            StepId::Instagram,
            "Qual o seu Instagram? (Opcional)",
            "@seu_perfil",
            Rule::None,
        )
    },
    Step {
        required: false,
        ..step(
            StepId::PaymentMethod,
            "Escolha a forma de pagamento.",
            "",
            Rule::None,
        )
    },
    Step {
        visible: paying_by_card,
        ..step(
            StepId::CardPaymentPlan,
            "Qual o plano de pagamento no cartão?",
            "",
            Rule::None,
        )
    },
    Step {
        minor_prompt: Some("Confirmação por Escrito do Responsável"),
        ..step(
            StepId::SignatureConfirmation,
            "Sua Confirmação por Escrito",
            CONFIRMATION_PHRASE,
            Rule::Signature,
        )
    },
    Step {
        required: false,
        ..step(
            StepId::TermsAccepted,
            "Termos e Condições",
            "",
            Rule::Accepted,
        )
    },
];

impl Step {
    /// Look up a step definition by id.
    pub fn get(id: StepId) -> &'static Step {
        &STEPS[Self::position(id)]
    }

    /// Position in the static declaration.
    pub fn position(id: StepId) -> usize {
        id as usize
    }

    pub fn is_visible(&self, answers: &AnswerSet) -> bool {
        (self.visible)(answers)
    }

    /// Prompt text for the current answers.
    pub fn prompt_for(&self, answers: &AnswerSet) -> &'static str {
        match self.minor_prompt {
            Some(p) if answers.is_minor => p,
            _ => self.prompt,
        }
    }

    /// Check this step's value: required-ness first, then the field rule.
    ///
    /// `today` bounds birth dates.
    pub fn validate(&self, answers: &AnswerSet, today: NaiveDate) -> Result<(), StepError> {
        let value = answers.value(self.id);
        if self.required && !value.is_present() {
            return Err(StepError::Required);
        }
        let text = match value {
            FieldValue::Text(s) => s,
            _ => "",
        };
        // Optional text fields left blank skip their format rule.
        if !self.required && text.trim().is_empty() && self.rule != Rule::Accepted {
            return Ok(());
        }
        match self.rule {
            Rule::None => Ok(()),
            Rule::Email if !validate::is_valid_email(text) => Err(StepError::InvalidEmail),
            Rule::Phone if !validate::is_valid_phone(text) => Err(StepError::InvalidPhone),
            Rule::Cpf if !validate::is_valid_cpf(text) => Err(StepError::InvalidCpf),
            Rule::Rg if !validate::is_valid_rg(text) => Err(StepError::InvalidRg),
            Rule::BirthDate if !validate::is_valid_birth_date_on(text, today) => {
                Err(StepError::InvalidDate)
            }
            Rule::Signature if text.trim() != CONFIRMATION_PHRASE => {
                Err(StepError::SignatureMismatch)
            }
            Rule::Accepted if !answers.terms_accepted => Err(StepError::TermsNotAccepted),
            _ => Ok(()),
        }
    }
}

/// Steps that apply to `answers`, in declaration order.
pub fn visible_steps(answers: &AnswerSet) -> Vec<&'static Step> {
    STEPS.iter().filter(|s| s.is_visible(answers)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::model::{CardPaymentPlan, FieldEdit};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn ids(answers: &AnswerSet) -> Vec<StepId> {
        visible_steps(answers).iter().map(|s| s.id).collect()
    }

    #[test]
    fn table_order_matches_discriminants() {
        for (i, s) in STEPS.iter().enumerate() {
            assert_eq!(s.id as usize, i, "{} is out of place", s.id);
            assert_eq!(Step::get(s.id).id, s.id);
        }
    }

    #[test]
    fn default_answers_hide_conditional_steps() {
        let visible = ids(&AnswerSet::default());
        assert_eq!(visible.len(), 13);
        assert!(!visible.contains(&StepId::ParentName));
        assert!(!visible.contains(&StepId::HowFoundOther));
        assert!(!visible.contains(&StepId::CardPaymentPlan));
        assert_eq!(visible.first(), Some(&StepId::Name));
        assert_eq!(visible.last(), Some(&StepId::TermsAccepted));
    }

    #[test]
    fn minor_inserts_guardian_steps_after_birth_date() {
        let mut answers = AnswerSet::default();
        answers.apply(FieldEdit::BirthDate("15/03/1990".into()), today());
        let adult = ids(&answers);

        answers.apply(FieldEdit::BirthDate("15/03/2014".into()), today());
        let minor = ids(&answers);

        assert_eq!(minor.len(), adult.len() + 3);
        let at = minor.iter().position(|s| *s == StepId::BirthDate).unwrap();
        assert_eq!(
            &minor[at + 1..at + 4],
            &[StepId::ParentName, StepId::ParentCpf, StepId::ParentRg]
        );
        let rest: Vec<StepId> = minor
            .iter()
            .copied()
            .filter(|s| !matches!(s, StepId::ParentName | StepId::ParentCpf | StepId::ParentRg))
            .collect();
        assert_eq!(rest, adult);
    }

    #[test]
    fn card_and_other_reveal_their_steps() {
        let mut answers = AnswerSet::default();
        answers.apply(FieldEdit::PaymentMethod(PaymentMethod::Card), today());
        answers.apply(FieldEdit::HowFound(HowFound::Other), today());
        let visible = ids(&answers);
        let pay = visible.iter().position(|s| *s == StepId::PaymentMethod).unwrap();
        assert_eq!(visible[pay + 1], StepId::CardPaymentPlan);
        let found = visible.iter().position(|s| *s == StepId::HowFound).unwrap();
        assert_eq!(visible[found + 1], StepId::HowFoundOther);
    }

    #[test]
    fn required_is_checked_before_format() {
        let answers = AnswerSet::default();
        assert_eq!(Step::get(StepId::Cpf).validate(&answers, today()), Err(StepError::Required));
        assert_eq!(Step::get(StepId::Email).validate(&answers, today()), Err(StepError::Required));
        assert_eq!(
            Step::get(StepId::CardPaymentPlan).validate(&answers, today()),
            Err(StepError::Required)
        );
    }

    #[test]
    fn format_rules_apply_to_filled_values() {
        let mut answers = AnswerSet::default();
        answers.apply(FieldEdit::Cpf("52998224726".into()), today());
        answers.apply(FieldEdit::Email("nope".into()), today());
        answers.apply(FieldEdit::Phone("4299".into()), today());
        answers.apply(FieldEdit::Rg("123".into()), today());
        answers.apply(FieldEdit::BirthDate("31022000".into()), today());
        assert_eq!(Step::get(StepId::Cpf).validate(&answers, today()), Err(StepError::InvalidCpf));
        assert_eq!(Step::get(StepId::Email).validate(&answers, today()), Err(StepError::InvalidEmail));
        assert_eq!(Step::get(StepId::Phone).validate(&answers, today()), Err(StepError::InvalidPhone));
        assert_eq!(Step::get(StepId::Rg).validate(&answers, today()), Err(StepError::InvalidRg));
        assert_eq!(
            Step::get(StepId::BirthDate).validate(&answers, today()),
            Err(StepError::InvalidDate)
        );
    }

    #[test]
    fn optional_instagram_passes_blank() {
        assert!(Step::get(StepId::Instagram).validate(&AnswerSet::default(), today()).is_ok());
    }

    #[test]
    fn signature_must_match_phrase_after_trim() {
        let step = Step::get(StepId::SignatureConfirmation);
        let mut answers = AnswerSet::default();
        answers.apply(FieldEdit::SignatureConfirmation("eu sou responsável".into()), today());
        assert_eq!(step.validate(&answers, today()), Err(StepError::SignatureMismatch));
        answers.apply(
            FieldEdit::SignatureConfirmation(format!("  {CONFIRMATION_PHRASE} ")),
            today(),
        );
        assert!(step.validate(&answers, today()).is_ok());
    }

    #[test]
    fn terms_must_be_accepted() {
        let step = Step::get(StepId::TermsAccepted);
        let mut answers = AnswerSet::default();
        assert_eq!(step.validate(&answers, today()), Err(StepError::TermsNotAccepted));
        answers.apply(FieldEdit::TermsAccepted(true), today());
        assert!(step.validate(&answers, today()).is_ok());
    }

    #[test]
    fn chosen_plan_passes() {
        let mut answers = AnswerSet::default();
        answers.apply(FieldEdit::PaymentMethod(PaymentMethod::Card), today());
        answers.apply(FieldEdit::CardPaymentPlan(CardPaymentPlan::Full), today());
        assert!(Step::get(StepId::CardPaymentPlan).validate(&answers, today()).is_ok());
    }

    #[test]
    fn signature_prompt_switches_for_minors() {
        let step = Step::get(StepId::SignatureConfirmation);
        let mut answers = AnswerSet::default();
        assert_eq!(step.prompt_for(&answers), "Sua Confirmação por Escrito");
        answers.is_minor = true;
        assert_eq!(
            step.prompt_for(&answers),
            "Confirmação por Escrito do Responsável"
        );
    }

    #[test]
    fn step_id_display_matches_serde() {
        for s in &STEPS {
            let json = serde_json::to_string(&s.id).unwrap();
            assert_eq!(format!("\"{}\"", s.id), json);
        }
    }
}
