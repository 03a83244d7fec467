//! Answer set and choice enumerations.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::steps::StepId;
use super::validate;

/// Course offered by the academy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum CourseOption {
    #[default]
    Profissional,
    Empreendedora,
    EmpresariaVip,
}

impl CourseOption {
    pub const ALL: [CourseOption; 3] = [
        Self::Profissional,
        Self::Empreendedora,
        Self::EmpresariaVip,
    ];

    /// Course name as shown to the student.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Profissional => "Lash Profissional",
            Self::Empreendedora => "Lash Empreendedora",
            Self::EmpresariaVip => "Lash Empresária VIP",
        }
    }

    /// Name with price, used in option lists and the contract.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Profissional => "Lash Profissional - R$ 899",
            Self::Empreendedora => "Lash Empreendedora - R$ 1099",
            Self::EmpresariaVip => "Lash Empresária VIP - R$ 1499",
        }
    }

    /// One-line pitch fed to the greeting prompt.
    pub fn benefit(&self) -> &'static str {
        match self {
            Self::Profissional => "focado em construir uma base técnica sólida e impecável",
            Self::Empreendedora => {
                "desenhado para aprimorar suas habilidades e iniciar seu próprio negócio com confiança"
            }
            Self::EmpresariaVip => {
                "uma masterclass exclusiva para você se tornar uma referência no mercado de beleza"
            }
        }
    }
}

impl std::fmt::Display for CourseOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the student will pay.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Pix,
    Cash,
    Card,
    Crypto,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 4] = [Self::Pix, Self::Cash, Self::Card, Self::Crypto];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Pix => "PIX",
            Self::Cash => "Dinheiro",
            Self::Card => "Cartões",
            Self::Crypto => "Criptomoedas",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Pix => "Rápido e fácil",
            Self::Cash => "Controle total",
            Self::Card => "Conveniente e seguro",
            Self::Crypto => "Inovador e global",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Installment plan, only asked for card payments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CardPaymentPlan {
    Full,
    OneInstallment,
    TwoInstallments,
}

impl CardPaymentPlan {
    pub const ALL: [CardPaymentPlan; 3] = [Self::Full, Self::OneInstallment, Self::TwoInstallments];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Pagamento à vista",
            Self::OneInstallment => "Entrada + 1x no cartão",
            Self::TwoInstallments => "Entrada + 2x no cartão",
        }
    }
}

impl std::fmt::Display for CardPaymentPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where the student heard about the academy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum HowFound {
    #[default]
    Instagram,
    Friends,
    Google,
    Other,
}

impl HowFound {
    pub const ALL: [HowFound; 4] = [Self::Instagram, Self::Friends, Self::Google, Self::Other];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Instagram => "Instagram",
            Self::Friends => "Indicação de amigos",
            Self::Google => "Pesquisa no Google",
            Self::Other => "Outro",
        }
    }
}

impl std::fmt::Display for HowFound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Everything the student has typed or picked so far.
///
/// Text fields hold the masked display value. `is_minor` is derived from
/// `birth_date` and cannot be edited directly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AnswerSet {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub cpf: String,
    pub rg: String,
    pub birth_date: String,
    pub address: String,
    pub instagram: String,
    pub course: CourseOption,
    pub payment_method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_payment_plan: Option<CardPaymentPlan>,
    pub how_found: HowFound,
    pub how_found_other: String,
    pub terms_accepted: bool,
    pub is_minor: bool,
    pub parent_name: String,
    pub parent_cpf: String,
    pub parent_rg: String,
    pub signature_confirmation: String,
}

/// A single edit to one field, carrying that field's value type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEdit {
    Name(String),
    Email(String),
    Phone(String),
    Cpf(String),
    Rg(String),
    BirthDate(String),
    ParentName(String),
    ParentCpf(String),
    ParentRg(String),
    Address(String),
    Course(CourseOption),
    HowFound(HowFound),
    HowFoundOther(String),
    Instagram(String),
    PaymentMethod(PaymentMethod),
    CardPaymentPlan(CardPaymentPlan),
    SignatureConfirmation(String),
    TermsAccepted(bool),
}

impl FieldEdit {
    /// The step that owns this field.
    pub fn step_id(&self) -> StepId {
        match self {
            Self::Name(_) => StepId::Name,
            Self::Email(_) => StepId::Email,
            Self::Phone(_) => StepId::Phone,
            Self::Cpf(_) => StepId::Cpf,
            Self::Rg(_) => StepId::Rg,
            Self::BirthDate(_) => StepId::BirthDate,
            Self::ParentName(_) => StepId::ParentName,
            Self::ParentCpf(_) => StepId::ParentCpf,
            Self::ParentRg(_) => StepId::ParentRg,
            Self::Address(_) => StepId::Address,
            Self::Course(_) => StepId::Course,
            Self::HowFound(_) => StepId::HowFound,
            Self::HowFoundOther(_) => StepId::HowFoundOther,
            Self::Instagram(_) => StepId::Instagram,
            Self::PaymentMethod(_) => StepId::PaymentMethod,
            Self::CardPaymentPlan(_) => StepId::CardPaymentPlan,
            Self::SignatureConfirmation(_) => StepId::SignatureConfirmation,
            Self::TermsAccepted(_) => StepId::TermsAccepted,
        }
    }

    /// Build an edit for a text step from raw input.
    ///
    /// Returns `None` for steps whose value is a choice or a flag.
    pub fn text(step: StepId, raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let edit = match step {
            StepId::Name => Self::Name(raw),
            StepId::Email => Self::Email(raw),
            StepId::Phone => Self::Phone(raw),
            StepId::Cpf => Self::Cpf(raw),
            StepId::Rg => Self::Rg(raw),
            StepId::BirthDate => Self::BirthDate(raw),
            StepId::ParentName => Self::ParentName(raw),
            StepId::ParentCpf => Self::ParentCpf(raw),
            StepId::ParentRg => Self::ParentRg(raw),
            StepId::Address => Self::Address(raw),
            StepId::HowFoundOther => Self::HowFoundOther(raw),
            StepId::Instagram => Self::Instagram(raw),
            StepId::SignatureConfirmation => Self::SignatureConfirmation(raw),
            StepId::Course
            | StepId::HowFound
            | StepId::PaymentMethod
            | StepId::CardPaymentPlan
            | StepId::TermsAccepted => return None,
        };
        Some(edit)
    }
}

/// Borrowed view of a single field's value, used by step validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Flag(bool),
    Choice(Option<&'static str>),
}

impl FieldValue<'_> {
    /// Whether the value counts as "filled in" for required steps.
    pub fn is_present(&self) -> bool {
        match self {
            Self::Text(s) => !s.trim().is_empty(),
            Self::Flag(b) => *b,
            Self::Choice(c) => c.is_some(),
        }
    }
}

impl AnswerSet {
    /// Apply an edit, masking text where the field has a mask.
    ///
    /// `today` anchors the age computation for `is_minor`.
    pub fn apply(&mut self, edit: FieldEdit, today: NaiveDate) {
        match edit {
            FieldEdit::Name(v) => self.name = v,
            FieldEdit::Email(v) => self.email = v,
            FieldEdit::Phone(v) => self.phone = validate::mask_phone(&v),
            FieldEdit::Cpf(v) => self.cpf = validate::mask_cpf(&v),
            FieldEdit::Rg(v) => self.rg = v,
            FieldEdit::BirthDate(v) => {
                self.birth_date = validate::mask_date(&v);
                let age = validate::age_on(&self.birth_date, today);
                self.is_minor = age > 0 && age < 18;
            }
            FieldEdit::ParentName(v) => self.parent_name = v,
            FieldEdit::ParentCpf(v) => self.parent_cpf = validate::mask_cpf(&v),
            FieldEdit::ParentRg(v) => self.parent_rg = v,
            FieldEdit::Address(v) => self.address = v,
            FieldEdit::Course(c) => self.course = c,
            FieldEdit::HowFound(h) => {
                self.how_found = h;
                if h != HowFound::Other {
                    self.how_found_other.clear();
                }
            }
            FieldEdit::HowFoundOther(v) => self.how_found_other = v,
            FieldEdit::Instagram(v) => self.instagram = v,
            FieldEdit::PaymentMethod(m) => {
                self.payment_method = m;
                if m != PaymentMethod::Card {
                    self.card_payment_plan = None;
                }
            }
            FieldEdit::CardPaymentPlan(p) => self.card_payment_plan = Some(p),
            FieldEdit::SignatureConfirmation(v) => self.signature_confirmation = v,
            FieldEdit::TermsAccepted(b) => self.terms_accepted = b,
        }
    }

    /// The stored value behind a step.
    pub fn value(&self, step: StepId) -> FieldValue<'_> {
        match step {
            StepId::Name => FieldValue::Text(&self.name),
            StepId::Email => FieldValue::Text(&self.email),
            StepId::Phone => FieldValue::Text(&self.phone),
            StepId::Cpf => FieldValue::Text(&self.cpf),
            StepId::Rg => FieldValue::Text(&self.rg),
            StepId::BirthDate => FieldValue::Text(&self.birth_date),
            StepId::ParentName => FieldValue::Text(&self.parent_name),
            StepId::ParentCpf => FieldValue::Text(&self.parent_cpf),
            StepId::ParentRg => FieldValue::Text(&self.parent_rg),
            StepId::Address => FieldValue::Text(&self.address),
            StepId::Course => FieldValue::Choice(Some(self.course.name())),
            StepId::HowFound => FieldValue::Choice(Some(self.how_found.label())),
            StepId::HowFoundOther => FieldValue::Text(&self.how_found_other),
            StepId::Instagram => FieldValue::Text(&self.instagram),
            StepId::PaymentMethod => FieldValue::Choice(Some(self.payment_method.label())),
            StepId::CardPaymentPlan => {
                FieldValue::Choice(self.card_payment_plan.map(|p| p.label()))
            }
            StepId::SignatureConfirmation => FieldValue::Text(&self.signature_confirmation),
            StepId::TermsAccepted => FieldValue::Flag(self.terms_accepted),
        }
    }

    /// Payment label, with the card plan appended when there is one.
    pub fn payment_summary(&self) -> String {
        match (self.payment_method, self.card_payment_plan) {
            (PaymentMethod::Card, Some(plan)) => {
                format!("{} ({})", self.payment_method.label(), plan.label())
            }
            (method, _) => method.label().to_string(),
        }
    }

    /// Discovery channel, with the free-text detail for "Outro".
    pub fn how_found_summary(&self) -> String {
        if self.how_found == HowFound::Other && !self.how_found_other.trim().is_empty() {
            format!("{}: {}", self.how_found.label(), self.how_found_other.trim())
        } else {
            self.how_found.label().to_string()
        }
    }
}
