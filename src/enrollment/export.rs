//! Flat CSV export of a finished enrollment.

use csv::{QuoteStyle, ReaderBuilder, WriterBuilder};

use crate::error::ExportError;

use super::model::{AnswerSet, HowFound};

/// Column order of the export record.
pub const EXPORT_COLUMNS: [&str; 18] = [
    "Nome",
    "Email",
    "Telefone",
    "CPF",
    "RG",
    "Data de Nascimento",
    "Endereço",
    "Instagram",
    "Curso",
    "Forma de Pagamento",
    "Plano do Cartão",
    "Como nos encontrou",
    "Detalhe",
    "Menor de Idade",
    "Responsável",
    "CPF do Responsável",
    "RG do Responsável",
    "Termos Aceitos",
];

fn yes_no(flag: bool) -> String {
    let answer = if flag { "Sim" } else { "Não" };
    answer.to_string()
}

/// One value per column, in `EXPORT_COLUMNS` order.
pub fn export_row(answers: &AnswerSet) -> [String; 18] {
    let guardian = |v: &str| {
        if answers.is_minor {
            v.to_string()
        } else {
            String::new()
        }
    };
    [
        answers.name.clone(),
        answers.email.clone(),
        answers.phone.clone(),
        answers.cpf.clone(),
        answers.rg.clone(),
        answers.birth_date.clone(),
        answers.address.clone(),
        answers.instagram.clone(),
        answers.course.name().to_string(),
        answers.payment_method.label().to_string(),
        answers
            .card_payment_plan
            .map(|p| p.label().to_string())
            .unwrap_or_default(),
        answers.how_found.label().to_string(),
        if answers.how_found == HowFound::Other {
            answers.how_found_other.clone()
        } else {
            String::new()
        },
        yes_no(answers.is_minor),
        guardian(&answers.parent_name),
        guardian(&answers.parent_cpf),
        guardian(&answers.parent_rg),
        yes_no(answers.terms_accepted),
    ]
}

/// Header line plus one data line, every field quoted.
pub fn export_record(answers: &AnswerSet) -> Result<String, ExportError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());
    writer.write_record(EXPORT_COLUMNS)?;
    writer.write_record(export_row(answers))?;
    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Io(e.into_error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Whether `text` is a CSV with our exact header and at least one full row.
pub fn is_well_formed(text: &str) -> bool {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());
    let header_ok = match reader.headers() {
        Ok(headers) => headers.iter().map(str::trim).eq(EXPORT_COLUMNS.iter().copied()),
        Err(_) => return false,
    };
    if !header_ok {
        return false;
    }
    let mut rows = 0;
    for record in reader.records() {
        match record {
            Ok(r) if r.len() == EXPORT_COLUMNS.len() => rows += 1,
            _ => return false,
        }
    }
    rows > 0
}

/// Pull the body out of a fenced code block, if the model wrapped one.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    // Skip an info string such as ```csv
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}
