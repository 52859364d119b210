// 📤 CSV Export - bank and rate listings
//
// Every field is quoted (embedded quotes doubled), comma-delimited,
// one record per line.

use crate::entities::{Bank, Rate};
use crate::money;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, Terminator, WriterBuilder};
use std::path::{Path, PathBuf};

pub const BANK_HEADERS: [&str; 4] = ["Código", "Nome", "Nome Completo", "ISPB"];
pub const RATE_HEADERS: [&str; 4] = ["Nome", "Valor", "Tipo", "Data de Atualização"];

const MISSING: &str = "N/A";

fn or_missing(value: &str) -> &str {
    if value.is_empty() {
        MISSING
    } else {
        value
    }
}

fn write_rows<I>(headers: &[&str], rows: I) -> Result<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(headers).context("Failed to write CSV header")?;
    for row in rows {
        writer.write_record(&row).context("Failed to write CSV row")?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not UTF-8")
}

/// Bank listing as CSV. An empty listing is refused.
pub fn banks_to_csv(banks: &[Bank]) -> Result<String> {
    if banks.is_empty() {
        bail!("Nenhum banco para exportar");
    }

    write_rows(
        &BANK_HEADERS,
        banks.iter().map(|bank| {
            vec![
                bank.code.map_or_else(|| MISSING.to_string(), |c| c.to_string()),
                or_missing(&bank.name).to_string(),
                or_missing(&bank.full_name).to_string(),
                or_missing(&bank.ispb).to_string(),
            ]
        }),
    )
}

/// Rate listing as CSV; every row carries the same update stamp
pub fn rates_to_csv(rates: &[Rate], last_updated: Option<DateTime<Utc>>) -> Result<String> {
    if rates.is_empty() {
        bail!("Nenhuma taxa para exportar");
    }

    let stamp = last_updated.map(money::format_timestamp).unwrap_or_default();

    write_rows(
        &RATE_HEADERS,
        rates.iter().map(|rate| {
            vec![
                rate.name.clone(),
                rate.value.to_string(),
                rate.kind().as_str().to_string(),
                stamp.clone(),
            ]
        }),
    )
}

pub fn banks_file_name(date: NaiveDate) -> String {
    format!("bancos-brasileiros-{}.csv", date.format("%Y-%m-%d"))
}

pub fn rates_file_name(date: NaiveDate) -> String {
    format!("taxas-brasil-{}.csv", date.format("%Y-%m-%d"))
}

/// Write `content` into `dir/file_name`, returning the full path
pub fn write_export(dir: &Path, file_name: &str, content: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;

    let path = dir.join(file_name);
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    tracing::info!(path = %path.display(), bytes = content.len(), "export written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_banks_csv() {
        let banks = vec![
            Bank::new("00000000", "BCO DO BRASIL S.A.", Some(1), "Banco do Brasil S.A."),
            Bank::new("", "SEM \"CODIGO\"", None, ""),
        ];

        let csv = banks_to_csv(&banks).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], r#""Código","Nome","Nome Completo","ISPB""#);
        assert_eq!(
            lines[1],
            r#""1","BCO DO BRASIL S.A.","Banco do Brasil S.A.","00000000""#
        );
        assert_eq!(lines[2], r#""N/A","SEM ""CODIGO""","N/A","N/A""#);
    }

    #[test]
    fn test_rates_csv() {
        let at = Utc.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap();
        let rates = vec![Rate::new("Selic", 11.75), Rate::new("Dolar", 5.0)];

        let csv = rates_to_csv(&rates, Some(at)).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], r#""Nome","Valor","Tipo","Data de Atualização""#);
        assert_eq!(lines[1], r#""Selic","11.75","percentage","19/10/2026, 14:05:09""#);
        assert_eq!(lines[2], r#""Dolar","5","currency","19/10/2026, 14:05:09""#);

        let undated = rates_to_csv(&rates, None).unwrap();
        assert!(undated.lines().nth(1).unwrap().ends_with(r#","""#));
    }

    #[test]
    fn test_empty_exports_are_refused() {
        let err = banks_to_csv(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Nenhum banco para exportar");
        assert!(rates_to_csv(&[], None).is_err());
    }

    #[test]
    fn test_file_names() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(banks_file_name(date), "bancos-brasileiros-2026-03-07.csv");
        assert_eq!(rates_file_name(date), "taxas-brasil-2026-03-07.csv");
    }

    #[test]
    fn test_write_export() {
        let dir = tempfile::tempdir().unwrap();
        let csv = banks_to_csv(&[Bank::new("1", "A", Some(1), "A S.A.")]).unwrap();

        let path = write_export(dir.path(), "bancos.csv", &csv).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), csv);
    }
}
