//! Field masks and validity checks.
//!
//! Every function here is total: malformed input produces `false` (or `0`
//! for [`age_on`]) instead of an error. Masks are applied on every keystroke,
//! validators only when the user tries to leave a step.

use std::sync::LazyLock;

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

/// Maximum length of a masked CPF (`000.000.000-00`).
const CPF_MASKED_LEN: usize = 14;

/// Maximum length of a masked date (`DD/MM/YYYY`).
const DATE_MASKED_LEN: usize = 10;

/// Minimum number of alphanumerics in an RG.
const RG_MIN_LEN: usize = 7;

/// Dates before this year never produce an age.
const MIN_BIRTH_YEAR: i32 = 1900;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("valid date regex"));

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static EMAIL_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[^\s@<>()\[\]\\.,;:"]+(\.[^\s@<>()\[\]\\.,;:"]+)*@(\[\d{1,3}(\.\d{1,3}){3}\]|([A-Za-z0-9-]+\.)+[A-Za-z]{2,})$"#,
    )
    .expect("valid strict email regex")
});

/// Keep only ASCII digits.
pub fn digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Format a CPF as `ddd.ddd.ddd-dd`, truncating extra input.
pub fn mask_cpf(raw: &str) -> String {
    let digits = digits(raw);
    let mut masked = String::with_capacity(CPF_MASKED_LEN);
    for (i, c) in digits.chars().enumerate() {
        match i {
            3 | 6 => masked.push('.'),
            9 => masked.push('-'),
            _ => {}
        }
        masked.push(c);
    }
    masked.chars().take(CPF_MASKED_LEN).collect()
}

/// Verify a CPF's length and both mod-11 check digits.
pub fn is_valid_cpf(cpf: &str) -> bool {
    let digits: Vec<u32> = cpf.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() != 11 || digits.iter().all(|d| *d == digits[0]) {
        return false;
    }
    cpf_check_digit(&digits[..9]) == digits[9] && cpf_check_digit(&digits[..10]) == digits[10]
}

/// Weighted sum with weights descending to 2, then `(sum * 10) % 11`,
/// with 10 folded to 0.
fn cpf_check_digit(prefix: &[u32]) -> u32 {
    let top = prefix.len() as u32 + 1;
    let sum: u32 = prefix
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    match (sum * 10) % 11 {
        10 => 0,
        r => r,
    }
}

/// Format a phone number as `(DD) DDDD-DDDD` or `(DD) DDDDD-DDDD`.
///
/// Digits past the eleventh are dropped.
pub fn mask_phone(raw: &str) -> String {
    let digits = digits(raw);
    if digits.len() <= 2 {
        return digits;
    }
    let (area, subscriber) = digits.split_at(2);
    match subscriber.len() {
        0..=4 => format!("({area}) {subscriber}"),
        5..=8 => format!("({area}) {}-{}", &subscriber[..4], &subscriber[4..]),
        _ => format!("({area}) {}-{}", &subscriber[..5], &subscriber[5..9]),
    }
}

/// A phone is valid with 10 (landline) or 11 (mobile) digits.
pub fn is_valid_phone(phone: &str) -> bool {
    matches!(digits(phone).len(), 10 | 11)
}

/// RG formats vary per issuing state, so only the length is checked.
pub fn is_valid_rg(rg: &str) -> bool {
    rg.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .count()
        >= RG_MIN_LEN
}

/// Format a date as `DD/MM/YYYY` while the user types.
pub fn mask_date(raw: &str) -> String {
    let digits = digits(raw);
    let mut masked = String::with_capacity(DATE_MASKED_LEN);
    for (i, c) in digits.chars().take(8).enumerate() {
        if i == 2 || i == 4 {
            masked.push('/');
        }
        masked.push(c);
    }
    masked
}

/// Parse an exact `DD/MM/YYYY` string into a real calendar date.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    if !DATE_SHAPE.is_match(date) {
        return None;
    }
    let mut parts = date.split('/').map(str::parse::<u32>);
    let day = parts.next()?.ok()?;
    let month = parts.next()?.ok()?;
    let year = parts.next()?.ok()?;
    NaiveDate::from_ymd_opt(i32::try_from(year).ok()?, month, day)
}

/// Birth date validity relative to `today`.
pub fn is_valid_birth_date_on(date: &str, today: NaiveDate) -> bool {
    parse_date(date).is_some_and(|d| d <= today)
}

/// Birth date validity relative to the local calendar day.
pub fn is_valid_birth_date(date: &str) -> bool {
    is_valid_birth_date_on(date, Local::now().date_naive())
}

/// Basic `local@domain.tld` shape check.
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_SHAPE.is_match(email)
}

/// Address check used before issuing a verification code: dot-separated
/// local part, and a domain ending in a TLD of two or more letters or a
/// bracketed IPv4 address.
pub fn is_strict_email(email: &str) -> bool {
    EMAIL_STRICT.is_match(email)
}

/// Age in whole years on `today`, or 0 for anything that isn't a real date
/// between 1900 and the current year.
pub fn age_on(birth_date: &str, today: NaiveDate) -> u32 {
    let Some(born) = parse_date(birth_date) else {
        return 0;
    };
    if born.year() < MIN_BIRTH_YEAR || born.year() > today.year() {
        return 0;
    }
    let mut age = today.year() - born.year();
    if (today.month(), today.day()) < (born.month(), born.day()) {
        age -= 1;
    }
    u32::try_from(age).unwrap_or(0)
}

/// Age in whole years as of the local calendar day.
pub fn age(birth_date: &str) -> u32 {
    age_on(birth_date, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn cpf_mask_formats_progressively() {
        assert_eq!(mask_cpf(""), "");
        assert_eq!(mask_cpf("123"), "123");
        assert_eq!(mask_cpf("1234"), "123.4");
        assert_eq!(mask_cpf("1234567"), "123.456.7");
        assert_eq!(mask_cpf("5298227404"), "529.822.740-4");
        assert_eq!(mask_cpf("52998224725"), "529.982.247-25");
        assert_eq!(mask_cpf("529.982.247-25999"), "529.982.247-25");
        assert_eq!(mask_cpf("abc529x982"), "529.982");
    }

    #[test]
    fn known_cpf_validates() {
        assert!(is_valid_cpf("529.982.247-25"));
        assert!(is_valid_cpf("52998224725"));
        assert!(is_valid_cpf("111.444.777-35"));
    }

    #[test]
    fn cpf_with_bumped_last_digit_fails() {
        assert!(!is_valid_cpf("529.982.247-26"));
        assert!(!is_valid_cpf("111.444.777-36"));
    }

    #[test]
    fn cpf_rejects_wrong_length_and_repeated_digits() {
        assert!(!is_valid_cpf(""));
        assert!(!is_valid_cpf("5299822472"));
        assert!(!is_valid_cpf("529982247251"));
        for d in 0..=9 {
            let repeated = d.to_string().repeat(11);
            assert!(!is_valid_cpf(&repeated), "{repeated} should be rejected");
        }
    }

    #[test]
    fn cpf_check_digit_folds_ten_to_zero() {
        // prefix 000000001 -> sum = 2, (20 % 11) = 9
        assert_eq!(cpf_check_digit(&[0, 0, 0, 0, 0, 0, 0, 0, 1]), 9);
        // prefix 000000010 -> sum = 3, (30 % 11) = 8
        assert_eq!(cpf_check_digit(&[0, 0, 0, 0, 0, 0, 0, 1, 0]), 8);
        // prefix 000000006 -> sum = 12, (120 % 11) = 10 -> 0
        assert_eq!(cpf_check_digit(&[0, 0, 0, 0, 0, 0, 0, 0, 6]), 0);
    }

    #[test]
    fn phone_mask_formats() {
        assert_eq!(mask_phone(""), "");
        assert_eq!(mask_phone("4"), "4");
        assert_eq!(mask_phone("42"), "42");
        assert_eq!(mask_phone("429"), "(42) 9");
        assert_eq!(mask_phone("429997"), "(42) 9997");
        assert_eq!(mask_phone("4299972"), "(42) 9997-2");
        assert_eq!(mask_phone("4232221234"), "(42) 3222-1234");
        assert_eq!(mask_phone("42999722042"), "(42) 99972-2042");
        assert_eq!(mask_phone("4299972204299"), "(42) 99972-2042");
    }

    #[test]
    fn phone_mask_is_idempotent() {
        for raw in [
            "",
            "4",
            "42",
            "429",
            "4232221",
            "4232221234",
            "42999722042",
            "(42) 99972-2042",
            "+55 42 99972 2042 77",
            "phone: 4 2 9",
        ] {
            let once = mask_phone(raw);
            assert_eq!(mask_phone(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn phone_validity_counts_digits() {
        assert!(is_valid_phone("(42) 3222-1234"));
        assert!(is_valid_phone("(42) 99972-2042"));
        assert!(!is_valid_phone("(42) 9997"));
        assert!(!is_valid_phone("429997220421"));
    }

    #[test]
    fn rg_requires_seven_alphanumerics() {
        assert!(is_valid_rg("12.345.678-9"));
        assert!(is_valid_rg("MG1234567"));
        assert!(!is_valid_rg("12.345"));
        assert!(!is_valid_rg("1.2.3.4.5.6"));
        assert!(!is_valid_rg("ÇÃÕÉÍÓÚ"));
        assert!(is_valid_rg("MG_12345"));
    }

    #[test]
    fn date_mask_inserts_slashes() {
        assert_eq!(mask_date("1"), "1");
        assert_eq!(mask_date("15"), "15");
        assert_eq!(mask_date("150"), "15/0");
        assert_eq!(mask_date("1503"), "15/03");
        assert_eq!(mask_date("15031"), "15/03/1");
        assert_eq!(mask_date("15031990"), "15/03/1990");
        assert_eq!(mask_date("1503199012"), "15/03/1990");
        assert_eq!(mask_date("15/03/1990"), "15/03/1990");
    }

    #[test]
    fn leap_day_handling() {
        let today = ymd(2024, 6, 1);
        assert!(!is_valid_birth_date_on("29/02/2021", today));
        assert!(is_valid_birth_date_on("29/02/2020", today));
        assert!(!is_valid_birth_date_on("30/02/2020", today));
        assert!(!is_valid_birth_date_on("31/04/2020", today));
    }

    #[test]
    fn birth_date_rejects_future_and_bad_shape() {
        let today = ymd(2024, 6, 1);
        assert!(is_valid_birth_date_on("01/06/2024", today));
        assert!(!is_valid_birth_date_on("02/06/2024", today));
        assert!(!is_valid_birth_date_on("01/01/2030", today));
        assert!(!is_valid_birth_date_on("1/6/2000", today));
        assert!(!is_valid_birth_date_on("01-06-2000", today));
        assert!(!is_valid_birth_date_on("00/06/2000", today));
        assert!(!is_valid_birth_date_on("01/13/2000", today));
        assert!(!is_valid_birth_date("31/12/9999"));
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("maria@exemplo.com"));
        assert!(is_valid_email("a.b+c@mail.co.uk"));
        assert!(!is_valid_email("maria@exemplo"));
        assert!(!is_valid_email("maria exemplo@mail.com"));
        assert!(!is_valid_email("maria@@mail.com"));
        assert!(!is_valid_email("@mail.com"));
        assert!(!is_valid_email(""));
    }

    #[test]
    fn strict_email_needs_real_domain() {
        assert!(is_strict_email("maria@exemplo.com"));
        assert!(is_strict_email("a.b+c@mail.co.uk"));
        assert!(is_strict_email("ana@[192.168.0.1]"));
        assert!(!is_strict_email("ana@x.c"));
        assert!(!is_strict_email("ana@exemplo.c0m"));
        assert!(!is_strict_email("ana..souza@exemplo.com"));
        assert!(!is_strict_email(".ana@exemplo.com"));
        assert!(!is_strict_email("ana@exemplo"));
        assert!(!is_strict_email("ana(x)@exemplo.com"));
    }

    #[test]
    fn age_counts_whole_years() {
        let today = ymd(2024, 6, 15);
        assert_eq!(age_on("15/06/2000", today), 24);
        assert_eq!(age_on("16/06/2000", today), 23);
        assert_eq!(age_on("14/06/2000", today), 24);
        assert_eq!(age_on("15/07/2000", today), 23);
        assert_eq!(age_on("15/06/2024", today), 0);
    }

    #[test]
    fn age_is_zero_for_invalid_input() {
        let today = ymd(2024, 6, 15);
        assert_eq!(age_on("", today), 0);
        assert_eq!(age_on("15/06", today), 0);
        assert_eq!(age_on("31/02/2000", today), 0);
        assert_eq!(age_on("01/01/1899", today), 0);
        assert_eq!(age_on("01/01/2025", today), 0);
    }

    #[test]
    fn age_increments_once_across_birthday() {
        let birth = "10/03/2010";
        let before = age_on(birth, ymd(2020, 3, 9));
        let on = age_on(birth, ymd(2020, 3, 10));
        assert_eq!(before, 9);
        assert_eq!(on, before + 1);
    }

    #[test]
    fn age_never_increases_going_back_in_time() {
        let birth = "29/02/2000";
        let mut day = ymd(2030, 1, 1);
        let mut previous = age_on(birth, day);
        while day > ymd(2000, 1, 1) {
            day = day.pred_opt().unwrap();
            let current = age_on(birth, day);
            assert!(current <= previous, "age grew going back to {day}");
            previous = current;
        }
    }
}
