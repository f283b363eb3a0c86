use std::fs;
use std::path::Path;

use anyhow::{bail, Context};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use tracing::debug;

use crate::accounts::{AccountGroup, AccountTable};
use crate::models::ProductionRecord;

/// One row as it appears in the export. The upstream spreadsheet-to-JSON
/// conversion writes empty cells as the number 0, text columns included,
/// so every text field goes through `text_cell`.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Employee", default, deserialize_with = "text_cell")]
    employee: String,
    #[serde(rename = "FirstName", default, deserialize_with = "text_cell")]
    first_name: String,
    #[serde(rename = "LastName", default, deserialize_with = "text_cell")]
    last_name: String,
    #[serde(rename = "AccountName", default, deserialize_with = "text_cell")]
    account_name: String,
    #[serde(rename = "StoreName", default, deserialize_with = "text_cell")]
    store_name: String,
    #[serde(rename = "DateOfInv")]
    date_of_inv: String,
    #[serde(rename = "PiecesPerHr", default)]
    pieces_per_hr: Option<f64>,
    #[serde(rename = "DollarPerHr", default)]
    dollars_per_hr: Option<f64>,
    #[serde(rename = "SkusPerHr", default)]
    skus_per_hr: Option<f64>,
    #[serde(rename = "AVG_DELTA", default)]
    avg_delta: Option<f64>,
    #[serde(rename = "GAP5_COUNT", default)]
    gap5: Option<f64>,
    #[serde(rename = "GAP10_COUNT", default)]
    gap10: Option<f64>,
    #[serde(rename = "GAP15_COUNT", default)]
    gap15: Option<f64>,
    #[serde(rename = "Total_Ext_Qty", default)]
    total_ext_qty: Option<f64>,
}

fn text_cell<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct TextVisitor;

    impl serde::de::Visitor<'_> for TextVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a string or numeric cell")
        }

        fn visit_str<E: serde::de::Error>(self, value: &str) -> Result<String, E> {
            Ok(value.trim().to_string())
        }

        fn visit_u64<E: serde::de::Error>(self, value: u64) -> Result<String, E> {
            Ok(if value == 0 {
                String::new()
            } else {
                value.to_string()
            })
        }

        fn visit_i64<E: serde::de::Error>(self, value: i64) -> Result<String, E> {
            Ok(if value == 0 {
                String::new()
            } else {
                value.to_string()
            })
        }

        fn visit_f64<E: serde::de::Error>(self, value: f64) -> Result<String, E> {
            if value == 0.0 {
                Ok(String::new())
            } else if value.fract() == 0.0 {
                Ok(format!("{}", value as i64))
            } else {
                Ok(value.to_string())
            }
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<String, E> {
            Ok(String::new())
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

fn parse_invoice_date(value: &str) -> anyhow::Result<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(parsed);
    }
    if let Ok(parsed) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(parsed.and_time(NaiveTime::MIN));
    }
    bail!("unrecognized invoice date \"{value}\"");
}

fn into_record(row: RawRow) -> anyhow::Result<ProductionRecord> {
    let invoiced_on = parse_invoice_date(&row.date_of_inv)?;
    Ok(ProductionRecord {
        employee_id: row.employee,
        first_name: row.first_name,
        last_name: row.last_name,
        account_name: row.account_name,
        store_name: row.store_name,
        invoiced_on,
        pieces_per_hr: row.pieces_per_hr.unwrap_or(0.0),
        dollars_per_hr: row.dollars_per_hr.unwrap_or(0.0),
        skus_per_hr: row.skus_per_hr.unwrap_or(0.0),
        avg_delta: row.avg_delta.unwrap_or(0.0),
        gap5: row.gap5.unwrap_or(0.0),
        gap10: row.gap10.unwrap_or(0.0),
        gap15: row.gap15.unwrap_or(0.0),
        total_ext_qty: row.total_ext_qty.unwrap_or(0.0),
    })
}

/// Decodes the spreadsheet export: a JSON object keyed by sheet name, each
/// sheet an array of rows.
fn parse_export(raw: &str, sheet: Option<&str>) -> anyhow::Result<Vec<ProductionRecord>> {
    let mut sheets: serde_json::Map<String, serde_json::Value> =
        serde_json::from_str(raw).context("export is not a JSON object keyed by sheet name")?;
    let sheet_names: Vec<String> = sheets.keys().cloned().collect();

    let rows = match sheet {
        Some(name) => sheets.remove(name).with_context(|| {
            format!(
                "sheet \"{}\" not found; export has: {}",
                name,
                sheet_names.join(", ")
            )
        })?,
        None => {
            let mut iter = sheets.into_iter();
            match (iter.next(), iter.next()) {
                (Some((_, rows)), None) => rows,
                _ => bail!(
                    "export has {} sheets ({}); pass --sheet to pick one",
                    sheet_names.len(),
                    sheet_names.join(", ")
                ),
            }
        }
    };

    let rows: Vec<RawRow> = serde_json::from_value(rows).context("sheet rows are malformed")?;
    rows.into_iter().map(into_record).collect()
}

fn parse_csv<R: std::io::Read>(reader: R) -> anyhow::Result<Vec<ProductionRecord>> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut records = Vec::new();
    for result in reader.deserialize::<RawRow>() {
        records.push(into_record(result?)?);
    }
    Ok(records)
}

pub fn load_records(path: &Path, sheet: Option<&str>) -> anyhow::Result<Vec<ProductionRecord>> {
    let is_csv = path
        .extension()
        .and_then(|extension| extension.to_str())
        .is_some_and(|extension| extension.eq_ignore_ascii_case("csv"));

    let records = if is_csv {
        let file = fs::File::open(path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        parse_csv(file)?
    } else {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        parse_export(&raw, sheet)?
    };

    debug!(count = records.len(), path = %path.display(), "loaded production records");
    Ok(records)
}

/// The built-in alias table, or one read from an `--account-groups` JSON
/// file of `{canonical, aliases}` entries.
pub fn load_account_table(path: Option<&Path>) -> anyhow::Result<AccountTable> {
    match path {
        None => Ok(AccountTable::builtin()),
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let groups: Vec<AccountGroup> =
                serde_json::from_str(&raw).context("account groups file is malformed")?;
            let table = AccountTable::from_entries(groups)
                .with_context(|| format!("invalid account groups in {}", path.display()))?;
            debug!(groups = table.groups().len(), "loaded account groups");
            Ok(table)
        }
    }
}
