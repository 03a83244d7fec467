//! Fixed-layout enrollment contract.
//!
//! The contract is laid out as wrapped, paginated lines in a monospaced
//! grid, then written as a PDF with one page per chunk of lines.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream, StringFormat};

use crate::error::ExportError;

use super::model::AnswerSet;

/// Characters per line.
pub const LINE_WIDTH: usize = 80;

/// Lines per page.
pub const LINES_PER_PAGE: usize = 56;

// US Letter, Courier 9pt on a 12pt leading.
const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN_LEFT: i64 = 72;
const FIRST_BASELINE: i64 = 740;
const FOOTER_BASELINE: i64 = 40;
const FONT_SIZE: i64 = 9;
const LEADING: i64 = 12;

const CONTRACTOR: &str = "Luxury Studio de Beleza Joyci Almeida, pessoa jurídica de direito \
privado, com sede na Rua Teixeira Mendes, 700, Uvaranas, Ponta Grossa - PR, doravante \
denominada simplesmente CONTRATADA.";

/// Terms and conditions, one section per entry: heading then clauses.
pub const TERMS: &[(&str, &[&str])] = &[
    (
        "1. Inscrição e Pagamento",
        &[
            "A sua vaga no curso selecionado é confirmada apenas após a compensação do pagamento (seja integral ou da entrada, conforme a modalidade escolhida).",
            "As opções de parcelamento no cartão de crédito estão sujeitas à aprovação da operadora e podem incluir a cobrança de juros, que são de responsabilidade da mesma.",
        ],
    ),
    (
        "2. Política de Privacidade e Proteção de Dados (LGPD)",
        &[
            "Coleta de Dados: Coletamos seus dados pessoais (nome, CPF, e-mail, telefone, data de nascimento) com a finalidade exclusiva de realizar sua matrícula, emitir seu certificado, e nos comunicarmos sobre o curso.",
            "Consentimento: Ao aceitar estes termos, você consente com a coleta e o uso dos seus dados para os fins descritos acima.",
            "Segurança e Confidencialidade: Comprometemo-nos a proteger seus dados. Eles não serão vendidos, alugados ou compartilhados com terceiros para fins de marketing.",
            "Direitos do Titular: Você tem o direito de solicitar acesso, correção ou exclusão de seus dados a qualquer momento, entrando em contato conosco pelo e-mail luxury.joycialmeida@gmail.com.",
        ],
    ),
    (
        "3. Consentimento para Menores de Idade",
        &[
            "Alunas menores de 18 anos só podem se inscrever com a autorização explícita de um dos pais ou responsável legal.",
            "Ao preencher os dados do responsável e fornecer a assinatura digital, o responsável declara estar ciente e de acordo com a participação da menor no curso, assumindo a responsabilidade por todos os atos e obrigações decorrentes deste contrato.",
        ],
    ),
    (
        "4. Cancelamento e Reembolso",
        &[
            "Conforme o Código de Defesa do Consumidor, você tem o direito de desistir do curso em até 7 (sete) dias corridos após a data da inscrição, com direito ao reembolso integral do valor pago.",
            "Após este período, a desistência implicará no reembolso de 50% do valor pago. A retenção do valor restante destina-se a cobrir custos administrativos e de reserva de vaga. Se os materiais personalizados e exclusivos do curso já tiverem sido adquiridos no momento do cancelamento, o custo destes será descontado do valor a ser reembolsado.",
            "Após o início do curso, não haverá reembolso dos valores pagos.",
            "Todas as solicitações de cancelamento devem ser feitas por escrito para o e-mail luxury.joycialmeida@gmail.com.",
        ],
    ),
    (
        "5. Propriedade Intelectual",
        &[
            "Todo o material didático fornecido (apostilas, vídeos, etc.) é de propriedade exclusiva da LuxAcademy by Joyci Almeida e protegido por leis de direitos autorais.",
            "É estritamente proibida a reprodução, cópia, distribuição ou venda do material a terceiros sem autorização prévia e por escrito.",
        ],
    ),
];

const MONTHS: [&str; 12] = [
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "maio",
    "junho",
    "julho",
    "agosto",
    "setembro",
    "outubro",
    "novembro",
    "dezembro",
];

/// `15 de junho de 2024`.
pub fn long_date(date: NaiveDate) -> String {
    format!(
        "{:02} de {} de {}",
        date.day(),
        MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Greedy word wrap at `width` characters. Words longer than a line are
/// split.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        let needed = if current.is_empty() {
            word.chars().count()
        } else {
            current.chars().count() + 1 + word.chars().count()
        };
        if needed > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn centered(text: &str) -> String {
    let len = text.chars().count();
    if len >= LINE_WIDTH {
        return text.to_string();
    }
    format!("{}{}", " ".repeat((LINE_WIDTH - len) / 2), text)
}

/// A rendered contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractDocument {
    student_name: String,
    lines: Vec<String>,
}

impl ContractDocument {
    /// Lay out the contract for `answers`, dated `date`.
    pub fn render(answers: &AnswerSet, date: NaiveDate) -> Self {
        let mut lines = Vec::new();
        let paragraph = |lines: &mut Vec<String>, text: &str| {
            lines.extend(wrap(text, LINE_WIDTH));
            lines.push(String::new());
        };

        lines.push(centered("CONTRATO DE PRESTAÇÃO DE SERVIÇOS EDUCACIONAIS"));
        lines.push(centered("LuxAcademy by Joyci Almeida"));
        lines.push(String::new());

        lines.push("PARTES CONTRATANTES".to_string());
        paragraph(&mut lines, &format!("CONTRATADA: {CONTRACTOR}"));
        paragraph(
            &mut lines,
            &format!(
                "CONTRATANTE: {}, portador(a) do CPF nº {} e do RG nº {}, residente e \
                 domiciliado(a) no endereço: {}.",
                answers.name, answers.cpf, answers.rg, answers.address
            ),
        );
        if answers.is_minor {
            paragraph(
                &mut lines,
                &format!(
                    "REPRESENTADO(A) POR SEU RESPONSÁVEL LEGAL: {}, portador(a) do CPF nº {} \
                     e do RG nº {}, que assina o presente instrumento.",
                    answers.parent_name, answers.parent_cpf, answers.parent_rg
                ),
            );
        }

        lines.push("CLÁUSULA PRIMEIRA - DO OBJETO".to_string());
        paragraph(
            &mut lines,
            &format!(
                "O presente contrato tem por objeto a prestação de serviços educacionais pela \
                 CONTRATADA à CONTRATANTE, referente ao curso \"{}\", compreendendo o material \
                 didático e as aulas teóricas e práticas conforme o cronograma do curso.",
                answers.course.label()
            ),
        );

        lines.push("CLÁUSULA SEGUNDA - DOS TERMOS E CONDIÇÕES".to_string());
        paragraph(
            &mut lines,
            "A CONTRATANTE declara ter lido, compreendido e concordado com todos os Termos e \
             Condições apresentados durante o processo de inscrição, os quais passam a fazer \
             parte integrante deste contrato para todos os fins de direito. As cláusulas abaixo \
             reproduzem os referidos termos:",
        );
        for (heading, clauses) in TERMS {
            lines.push((*heading).to_string());
            for clause in *clauses {
                for (i, line) in wrap(clause, LINE_WIDTH - 2).into_iter().enumerate() {
                    let bullet = if i == 0 { "- " } else { "  " };
                    lines.push(format!("{bullet}{line}"));
                }
            }
            lines.push(String::new());
        }

        paragraph(
            &mut lines,
            "E, por estarem assim justas e contratadas, as partes assinam o presente instrumento.",
        );
        lines.push(format!("Ponta Grossa, {}.", long_date(date)));
        lines.push(String::new());

        let (signer, role, signer_cpf) = if answers.is_minor {
            (
                answers.parent_name.as_str(),
                "Assinatura do Responsável Legal",
                answers.parent_cpf.as_str(),
            )
        } else {
            (
                answers.name.as_str(),
                "Assinatura do(a) Aluno(a)",
                answers.cpf.as_str(),
            )
        };
        lines.push(centered(&"_".repeat(40)));
        lines.push(centered(signer));
        lines.push(centered(&format!("({role})")));
        lines.push(centered(&format!("CPF: {signer_cpf}")));
        lines.push(String::new());
        lines.push(centered("Assinatura digital confirmada pela digitação da frase:"));
        lines.push(centered(&format!("\"{}\"", answers.signature_confirmation.trim())));

        Self {
            student_name: answers.name.clone(),
            lines,
        }
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// The layout split into pages of `LINES_PER_PAGE` lines.
    pub fn pages(&self) -> Vec<&[String]> {
        self.lines.chunks(LINES_PER_PAGE).collect()
    }

    /// All pages, each followed by a page footer.
    pub fn to_text(&self) -> String {
        let pages = self.pages();
        let total = pages.len();
        let mut out = String::new();
        for (i, page) in pages.into_iter().enumerate() {
            for line in page {
                out.push_str(line);
                out.push('\n');
            }
            out.push_str(&centered(&format!("Página {} de {}", i + 1, total)));
            out.push('\n');
            if i + 1 < total {
                out.push('\u{c}');
            }
        }
        out
    }

    /// `Contrato-LuxAcademy-<name>` with non-alphanumerics replaced by `_`.
    pub fn file_stem(&self) -> String {
        let safe: String = self
            .student_name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("Contrato-LuxAcademy-{safe}")
    }

    /// Download name of the PDF.
    pub fn pdf_file_name(&self) -> String {
        format!("{}.pdf", self.file_stem())
    }

    /// Build the PDF: one page per `pages()` chunk, one `Tj` per line and a
    /// page footer.
    pub fn to_pdf(&self) -> Result<Vec<u8>, ExportError> {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();

        let font_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Font".to_vec())),
            ("Subtype", Object::Name(b"Type1".to_vec())),
            ("BaseFont", Object::Name(b"Courier".to_vec())),
            ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
        ]));
        let resources_id = doc.add_object(Dictionary::from_iter(vec![(
            "Font",
            Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
        )]));

        let pages = self.pages();
        let total = pages.len();
        let mut page_ids = Vec::with_capacity(total);

        for (i, lines) in pages.into_iter().enumerate() {
            let mut operations = vec![
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
                ),
                Operation::new("TL", vec![Object::Integer(LEADING)]),
                Operation::new(
                    "Td",
                    vec![Object::Integer(MARGIN_LEFT), Object::Integer(FIRST_BASELINE)],
                ),
            ];
            for line in lines {
                operations.push(Operation::new("Tj", vec![pdf_string(line)]));
                operations.push(Operation::new("T*", vec![]));
            }
            operations.push(Operation::new("ET", vec![]));

            let footer = centered(&format!("Página {} de {}", i + 1, total));
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(b"F1".to_vec()), Object::Integer(FONT_SIZE)],
                ),
                Operation::new(
                    "Td",
                    vec![Object::Integer(MARGIN_LEFT), Object::Integer(FOOTER_BASELINE)],
                ),
                Operation::new("Tj", vec![pdf_string(&footer)]),
                Operation::new("ET", vec![]),
            ]);

            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode()?));

            let page = Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Page".to_vec())),
                ("Parent", Object::Reference(pages_id)),
                (
                    "MediaBox",
                    Object::Array(vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(PAGE_WIDTH),
                        Object::Integer(PAGE_HEIGHT),
                    ]),
                ),
                ("Resources", Object::Reference(resources_id)),
                ("Contents", Object::Reference(content_id)),
            ]);
            page_ids.push(doc.add_object(page));
        }

        let pages_dict = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Count", Object::Integer(total as i64)),
            (
                "Kids",
                Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
            ),
        ]);
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

        let catalog_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer)?;
        Ok(buffer)
    }

    /// Write the PDF into `dir` under `pdf_file_name`, returning its path.
    pub fn write_pdf(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let bytes = self.to_pdf()?;
        let path = dir.join(self.pdf_file_name());
        std::fs::write(&path, bytes)?;
        tracing::info!(path = %path.display(), pages = self.pages().len(), "Contract written");
        Ok(path)
    }
}

/// Literal PDF string in WinAnsi. Characters outside Latin-1 become `?`.
fn pdf_string(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrollment::model::FieldEdit;
    use crate::enrollment::steps::CONFIRMATION_PHRASE;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 5).unwrap()
    }

    fn adult() -> AnswerSet {
        let mut a = AnswerSet::default();
        a.apply(FieldEdit::Name("Ana Souza".into()), date());
        a.apply(FieldEdit::Cpf("52998224725".into()), date());
        a.apply(FieldEdit::Rg("12.345.678-9".into()), date());
        a.apply(FieldEdit::BirthDate("01/01/1990".into()), date());
        a.apply(FieldEdit::Address("Rua A, 10".into()), date());
        a.apply(FieldEdit::SignatureConfirmation(CONFIRMATION_PHRASE.into()), date());
        a
    }

    #[test]
    fn long_date_in_portuguese() {
        assert_eq!(long_date(date()), "05 de junho de 2024");
        assert_eq!(
            long_date(NaiveDate::from_ymd_opt(2025, 3, 31).unwrap()),
            "31 de março de 2025"
        );
    }

    #[test]
    fn wrap_respects_width() {
        let text = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do eiusmod";
        let lines = wrap(text, 20);
        assert!(lines.iter().all(|l| l.chars().count() <= 20));
        assert_eq!(lines.join(" "), text);
    }

    #[test]
    fn wrap_splits_overlong_words() {
        let lines = wrap("ab abcdefghij", 4);
        assert_eq!(lines, vec!["ab", "abcd", "efgh", "ij"]);
    }

    #[test]
    fn adult_contract_is_signed_by_student() {
        let doc = ContractDocument::render(&adult(), date());
        let text = doc.to_text();
        assert!(text.contains("CONTRATANTE: Ana Souza, portador(a) do CPF nº 529.982.247-25"));
        assert!(text.contains("(Assinatura do(a) Aluno(a))"));
        assert!(!text.contains("RESPONSÁVEL LEGAL:"));
        assert!(text.contains("Ponta Grossa, 05 de junho de 2024."));
        assert!(text.contains(CONFIRMATION_PHRASE));
        assert!(doc.lines().iter().all(|l| l.chars().count() <= LINE_WIDTH));
    }

    #[test]
    fn minor_contract_is_signed_by_guardian() {
        let mut a = adult();
        a.apply(FieldEdit::BirthDate("01/01/2012".into()), date());
        a.apply(FieldEdit::ParentName("Maria Souza".into()), date());
        a.apply(FieldEdit::ParentCpf("11144477735".into()), date());
        let text = ContractDocument::render(&a, date()).to_text();
        assert!(text.contains("RESPONSÁVEL LEGAL: Maria Souza"));
        assert!(text.contains("(Assinatura do Responsável Legal)"));
        assert!(text.contains("CPF: 111.444.777-35"));
    }

    #[test]
    fn pages_carry_footers() {
        let doc = ContractDocument::render(&adult(), date());
        let pages = doc.pages();
        assert!(pages.len() >= 2, "terms alone exceed one page");
        assert!(pages.iter().all(|p| p.len() <= LINES_PER_PAGE));
        let text = doc.to_text();
        assert!(text.contains(&format!("Página 1 de {}", pages.len())));
        assert_eq!(text.matches('\u{c}').count(), pages.len() - 1);
    }

    #[test]
    fn file_names_are_sanitized() {
        let mut a = adult();
        a.apply(FieldEdit::Name("Ana Cília".into()), date());
        let doc = ContractDocument::render(&a, date());
        assert_eq!(doc.pdf_file_name(), "Contrato-LuxAcademy-Ana_C_lia.pdf");
    }

    #[test]
    fn latin1_text_maps_to_single_bytes() {
        let Object::String(bytes, _) = pdf_string("Página ç €") else {
            panic!("expected a string object");
        };
        assert_eq!(bytes, b"P\xe1gina \xe7 ?".to_vec());
    }

    #[test]
    fn write_pdf_has_one_page_per_chunk() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ContractDocument::render(&adult(), date());
        let path = doc.write_pdf(dir.path()).unwrap();
        assert!(path.ends_with("Contrato-LuxAcademy-Ana_Souza.pdf"));

        let pdf = Document::load(&path).unwrap();
        let pages = pdf.get_pages();
        assert_eq!(pages.len(), doc.pages().len());

        let first = pages.get(&1).copied().unwrap();
        let content = Content::decode(&pdf.get_page_content(first).unwrap()).unwrap();
        let shown: Vec<Vec<u8>> = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(bytes.clone()),
                _ => None,
            })
            .collect();
        // Every layout line of the page plus its footer.
        assert_eq!(shown.len(), doc.pages()[0].len() + 1);
        assert!(shown.iter().any(|l| l.windows(9).any(|w| w == b"Ana Souza")));
    }
}
