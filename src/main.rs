use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use lux_enroll::config::EnrollConfig;
use lux_enroll::enrollment::contract::TERMS;
use lux_enroll::enrollment::{
    CardPaymentPlan, CourseOption, EmailVerification, EnrollmentAssistant, FieldEdit, HowFound,
    PaymentMethod, Progress, Sequencer, StepId, VerificationStatus, WizardPhase,
};
use lux_enroll::error::SubmissionError;

type Input = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = EnrollConfig::from_env()?;
    let assistant = EnrollmentAssistant::from_config(&config)?;

    eprintln!("LuxAcademy by Joyci Almeida · Inscrição v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Comandos: /voltar, /verificar, /reiniciar, /sair\n");

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut seq = Sequencer::new();
    let mut verification = EmailVerification::new();

    loop {
        if seq.phase() == WizardPhase::Submitted {
            eprintln!("Digite /reiniciar para uma nova inscrição ou /sair.");
            match read_line(&mut input).await?.as_deref() {
                None | Some("/sair") => break,
                Some("/reiniciar") => {
                    seq.reset();
                    verification = EmailVerification::new();
                }
                Some(_) => {}
            }
            continue;
        }

        show_step(&mut seq);
        let Some(line) = read_line(&mut input).await? else {
            break;
        };

        match line.as_str() {
            "/sair" => break,
            "/voltar" => {
                seq.retreat();
                continue;
            }
            "/reiniciar" => {
                seq.reset();
                verification = EmailVerification::new();
                continue;
            }
            "/verificar" => {
                verify_email(&seq, &mut verification, &assistant, &mut input).await?;
                continue;
            }
            _ => {}
        }

        let step = seq.current_step().id;
        if !line.is_empty() {
            match parse_answer(step, &line) {
                Some(edit) => {
                    if let Err(e) = seq.edit(edit) {
                        eprintln!("⚠ {e}");
                        continue;
                    }
                    if step == StepId::Email {
                        verification.sync_email(&seq.answers().email);
                    }
                }
                None => {
                    eprintln!("⚠ Opção inválida.");
                    continue;
                }
            }
        }

        match seq.next(&assistant).await {
            Ok(Progress::Moved(_)) => {}
            Ok(Progress::Submitted) => finish(&seq, &config.whatsapp_number),
            Err(SubmissionError::Invalid { reason, .. }) => eprintln!("⚠ {reason}"),
            Err(e) => {
                tracing::warn!(error = %e, "Submission did not complete");
                if let Some(reason) = seq.error() {
                    eprintln!("⚠ {reason}");
                }
            }
        }
    }

    Ok(())
}

async fn read_line(input: &mut Input) -> anyhow::Result<Option<String>> {
    eprint!("> ");
    std::io::stderr().flush()?;
    Ok(input.next_line().await?.map(|l| l.trim().to_string()))
}

fn options(step: StepId) -> Vec<&'static str> {
    match step {
        StepId::Course => CourseOption::ALL.iter().map(|c| c.label()).collect(),
        StepId::HowFound => HowFound::ALL.iter().map(|h| h.label()).collect(),
        StepId::PaymentMethod => PaymentMethod::ALL.iter().map(|p| p.label()).collect(),
        StepId::CardPaymentPlan => CardPaymentPlan::ALL.iter().map(|p| p.label()).collect(),
        _ => Vec::new(),
    }
}

fn show_step(seq: &mut Sequencer) {
    let step = seq.current_step();
    let total = seq.visible_steps().len();
    eprintln!("\n[{}/{}] {}", seq.cursor() + 1, total, seq.current_prompt());

    match step.id {
        StepId::TermsAccepted => {
            for (heading, clauses) in TERMS {
                eprintln!("\n{heading}");
                for clause in *clauses {
                    eprintln!("  - {clause}");
                }
            }
            seq.mark_terms_read();
            eprintln!("\nVocê aceita os termos? (s/n)");
        }
        id => {
            for (i, label) in options(id).iter().enumerate() {
                eprintln!("  {}. {label}", i + 1);
            }
            if !step.placeholder.is_empty() {
                eprintln!("  ({})", step.placeholder);
            }
        }
    }
}

fn pick<T: Copy>(all: &[T], line: &str) -> Option<T> {
    let n: usize = line.parse().ok()?;
    all.get(n.checked_sub(1)?).copied()
}

fn parse_answer(step: StepId, line: &str) -> Option<FieldEdit> {
    match step {
        StepId::Course => pick(&CourseOption::ALL, line).map(FieldEdit::Course),
        StepId::HowFound => pick(&HowFound::ALL, line).map(FieldEdit::HowFound),
        StepId::PaymentMethod => pick(&PaymentMethod::ALL, line).map(FieldEdit::PaymentMethod),
        StepId::CardPaymentPlan => pick(&CardPaymentPlan::ALL, line).map(FieldEdit::CardPaymentPlan),
        StepId::TermsAccepted => match line.to_lowercase().as_str() {
            "s" | "sim" => Some(FieldEdit::TermsAccepted(true)),
            "n" | "não" | "nao" => Some(FieldEdit::TermsAccepted(false)),
            _ => None,
        },
        other => FieldEdit::text(other, line),
    }
}

async fn verify_email(
    seq: &Sequencer,
    verification: &mut EmailVerification,
    assistant: &EnrollmentAssistant,
    input: &mut Input,
) -> anyhow::Result<()> {
    let email = seq.answers().email.clone();
    verification.sync_email(&email);
    if verification.is_verified_for(&email) {
        eprintln!("E-mail já verificado.");
        return Ok(());
    }
    let code = match verification.request_code(&email, assistant).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("⚠ {e}");
            return Ok(());
        }
    };
    eprintln!("Para simular a verificação, seu código é: {code}");
    eprintln!("Digite o código de 6 dígitos:");
    while let Some(line) = read_line(input).await? {
        match verification.enter_code(&line) {
            Ok(VerificationStatus::Verified) => {
                eprintln!("✓ E-mail verificado.");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                eprintln!("⚠ {e}");
                break;
            }
        }
    }
    Ok(())
}

fn finish(seq: &Sequencer, whatsapp_number: &str) {
    let Some(result) = seq.result() else {
        return;
    };
    println!("\n{}\n", result.greeting);

    match seq.whatsapp_link(whatsapp_number) {
        Ok(link) => println!("Envie sua inscrição pelo WhatsApp:\n{link}\n"),
        Err(e) => tracing::warn!(error = %e, "Could not build WhatsApp link"),
    }

    let written = seq.contract().and_then(|doc| {
        let dir = std::env::current_dir()?;
        doc.write_pdf(&dir)
    });
    match written {
        Ok(path) => println!("Contrato salvo em {}", path.display()),
        Err(e) => tracing::warn!(error = %e, "Could not write contract"),
    }

    tracing::debug!(record = %result.export_record, id = %result.id, "Export record");
}
