// Receipt field extraction from plain document text
//
// Each field has an ordered list of (pattern, extractor) rules. The first
// rule whose pattern matches decides the field, even when its extractor
// then rejects the captured text.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::{Captures, Regex};
use serde::Serialize;

/// Fields read from one receipt text. Every field is always present;
/// `None` means the text did not yield it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedFields {
    pub amount: Option<f64>,
    /// `DD/MM/YYYY`.
    pub date: Option<String>,
    pub series: Option<String>,
    pub receipt: Option<String>,
}

impl ExtractedFields {
    /// Amount with two decimals, or empty.
    pub fn amount_text(&self) -> String {
        self.amount.map(|a| format!("{a:.2}")).unwrap_or_default()
    }
}

type Rule<T> = (Regex, fn(&Captures<'_>) -> Option<T>);

struct Rules {
    amount: Vec<Rule<f64>>,
    date: Vec<Rule<String>>,
    document: Vec<Rule<(String, String)>>,
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| Rules {
        amount: vec![
            rule(r"(?i)Total Neto Recibido\s*S/\.?\s*([\d.,]+)", amount_capture),
            rule(r"(?i)Total Neto Recibido:\s*(?:S/\.?\s*)?([\d.,]+)", amount_capture),
        ],
        date: vec![
            rule(r"(?i)Fecha de Emisión\s*Tipo de Moneda\s*(\d{2}/\d{2}/\d{4})", verbatim_date),
            rule(r"(?i)Fecha de emisión\s*(\d{1,2}\s+de\s+\w+\s+del?\s+\d{4})", spelled_date),
        ],
        document: vec![
            rule(r"N°\s*(E\d+)-(\d+)", series_capture),
            rule(r"Nro:\s*(E\d+)\s*-\s*(\d+)", series_capture),
        ],
    })
}

fn rule<T>(pattern: &str, extract: fn(&Captures<'_>) -> Option<T>) -> Rule<T> {
    (re(pattern), extract)
}

// Patterns are literals; a failure here is a programming error.
fn re(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid field pattern {pattern}: {e}"))
}

fn amount_capture(c: &Captures<'_>) -> Option<f64> {
    let raw = &c[1];
    match raw.replace(',', "").parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("cannot parse amount '{raw}'");
            None
        }
    }
}

fn verbatim_date(c: &Captures<'_>) -> Option<String> {
    Some(c[1].to_string())
}

fn spelled_date(c: &Captures<'_>) -> Option<String> {
    parse_spanish_date(&c[1]).map(|d| d.format("%d/%m/%Y").to_string())
}

fn series_capture(c: &Captures<'_>) -> Option<(String, String)> {
    Some((c[1].to_string(), c[2].to_string()))
}

fn first_match<T>(rules: &[Rule<T>], text: &str) -> Option<T> {
    rules.iter().find_map(|(pattern, extract)| pattern.captures(text).map(|c| extract(&c)))?
}

/// Pull amount, emission date, series and receipt number out of a receipt.
pub fn extract_fields(text: &str) -> ExtractedFields {
    let rules = rules();
    let (series, receipt) = first_match(&rules.document, text).unzip();
    ExtractedFields {
        amount: first_match(&rules.amount, text),
        date: first_match(&rules.date, text),
        series,
        receipt,
    }
}

// ── Spanish dates ───────────────────────────────────────────────────

const MONTHS: [(&str, u32); 13] = [
    ("enero", 1),
    ("febrero", 2),
    ("marzo", 3),
    ("abril", 4),
    ("mayo", 5),
    ("junio", 6),
    ("julio", 7),
    ("agosto", 8),
    ("septiembre", 9),
    ("setiembre", 9),
    ("octubre", 10),
    ("noviembre", 11),
    ("diciembre", 12),
];

/// Parse `"5 de marzo del 2024"` (or `"... de 2024"`). Month names are
/// matched case-insensitively; impossible dates yield `None`.
pub fn parse_spanish_date(phrase: &str) -> Option<NaiveDate> {
    static PHRASE: OnceLock<Regex> = OnceLock::new();
    let pattern = PHRASE.get_or_init(|| re(r"(?i)^\s*(\d{1,2})\s+de\s+(\w+)\s+del?\s+(\d{4})\s*$"));

    let c = pattern.captures(phrase)?;
    let day: u32 = c[1].parse().ok()?;
    let month_name = c[2].to_lowercase();
    let month = MONTHS.iter().find(|(name, _)| *name == month_name).map(|(_, m)| *m)?;
    let year: i32 = c[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_with_currency_marker() {
        let fields = extract_fields("Total Neto Recibido: S/1,234.50");
        assert_eq!(fields.amount, Some(1234.50));
        assert_eq!(fields.amount_text(), "1234.50");
    }

    #[test]
    fn amount_variants() {
        assert_eq!(extract_fields("TOTAL NETO RECIBIDO S/ 800.00").amount, Some(800.0));
        assert_eq!(extract_fields("Total Neto Recibido:   950").amount, Some(950.0));
    }

    #[test]
    fn no_amount_phrase() {
        let fields = extract_fields("Recibo por honorarios\nImporte 100");
        assert_eq!(fields.amount, None);
        assert_eq!(fields.amount_text(), "");
    }

    #[test]
    fn unparsable_amount_is_absent() {
        assert_eq!(extract_fields("Total Neto Recibido: 1.2.3").amount, None);
    }

    #[test]
    fn first_date_pattern_wins() {
        let text = "Fecha de Emisión Tipo de Moneda 05/03/2024\n\
                    Fecha de emisión 7 de abril del 2024";
        assert_eq!(extract_fields(text).date.as_deref(), Some("05/03/2024"));
    }

    #[test]
    fn long_form_date_is_reformatted() {
        let fields = extract_fields("Fecha de emisión 7 de Setiembre del 2023");
        assert_eq!(fields.date.as_deref(), Some("07/09/2023"));
    }

    #[test]
    fn series_and_receipt() {
        let fields = extract_fields("RECIBO POR HONORARIOS N° E001-125");
        assert_eq!(fields.series.as_deref(), Some("E001"));
        assert_eq!(fields.receipt.as_deref(), Some("125"));

        let fields = extract_fields("Nro: E002 - 7");
        assert_eq!(fields.series.as_deref(), Some("E002"));
        assert_eq!(fields.receipt.as_deref(), Some("7"));
    }

    #[test]
    fn empty_text_yields_all_absent() {
        assert_eq!(extract_fields(""), ExtractedFields::default());
    }

    #[test]
    fn spanish_dates() {
        assert_eq!(parse_spanish_date("5 de marzo del 2024"), NaiveDate::from_ymd_opt(2024, 3, 5));
        assert_eq!(parse_spanish_date("12 de DICIEMBRE de 2022"), NaiveDate::from_ymd_opt(2022, 12, 12));
        assert_eq!(parse_spanish_date("31 de febrero del 2024"), None);
        assert_eq!(parse_spanish_date("5 de march del 2024"), None);
    }
}
