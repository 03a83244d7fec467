//! Pre-filled WhatsApp hand-off link.

use super::model::AnswerSet;

/// Plain-text enrollment summary, formatted with WhatsApp `*bold*` markers.
pub fn summary(answers: &AnswerSet) -> String {
    let instagram = if answers.instagram.trim().is_empty() {
        "N/A"
    } else {
        answers.instagram.trim()
    };

    let mut lines = vec![
        "*INFORMAÇÕES DO ALUNO*".to_string(),
        format!("*Nome:* {}", answers.name),
        format!("*Email:* {}", answers.email),
        format!("*Telefone:* {}", answers.phone),
        format!("*CPF:* {}", answers.cpf),
        format!("*RG:* {}", answers.rg),
        format!("*Data de Nascimento:* {}", answers.birth_date),
        format!("*Endereço:* {}", answers.address),
        format!("*Instagram:* {instagram}"),
        String::new(),
        "*INFORMAÇÕES DO CURSO*".to_string(),
        format!("*Curso Escolhido:* {}", answers.course.label()),
        format!("*Forma de Pagamento:* {}", answers.payment_summary()),
        format!("*Como nos encontrou:* {}", answers.how_found_summary()),
    ];

    if answers.is_minor {
        lines.extend([
            String::new(),
            "*DADOS DO RESPONSÁVEL*".to_string(),
            format!("*Nome:* {}", answers.parent_name),
            format!("*CPF:* {}", answers.parent_cpf),
            format!("*RG:* {}", answers.parent_rg),
        ]);
    }

    lines.extend([
        String::new(),
        "*CONFIRMAÇÕES*".to_string(),
        "*Termos Aceitos:* Sim".to_string(),
        "*Assinatura Digital:* Confirmado".to_string(),
    ]);

    format!(
        "Olá, Luxury Studio!\n\nSegue uma nova inscrição para o curso da LuxAcademy:\n\n{}",
        lines.join("\n")
    )
}

/// `https://wa.me/<number>?text=<summary>` with the summary URL-encoded.
pub fn whatsapp_link(number: &str, answers: &AnswerSet) -> String {
    format!(
        "https://wa.me/{}?text={}",
        number,
        urlencoding::encode(&summary(answers))
    )
}
