use std::collections::HashMap;

use crate::models::{CostAmounts, CostField, ExtractedRow};
use crate::normalize::{parse_amount, resolve_columns};
use crate::table::RawTable;

use super::{DetectionCandidate, FormatParser, ParsedCsv};

pub const FORMAT_ID: &str = "datev_payroll_v1";

const REQUIRED_COLUMNS: [&str; 3] = ["Pers.-Nr.", "Nachname", "Vorname"];

/// Needle order is load-bearing: "gesamtkosten ohne erstattung" must be
/// tried before "gesamtkosten", "sv ag anteil" before "sv ag".
const FIELD_NEEDLES: &[(&str, CostField)] = &[
    ("gesamtbrutto", CostField::Gross),
    ("ag anteil bav", CostField::AgBav),
    ("foerderbetrag", CostField::Subsidy),
    ("förderbetrag", CostField::Subsidy),
    ("nettobezuege nettoabzuege", CostField::Net),
    ("nettobezuege", CostField::Net),
    ("sv ag anteil", CostField::SvAg),
    ("sv ag", CostField::SvAg),
    ("umlage", CostField::Umlage),
    ("erstattung kk", CostField::ReimbKk),
    ("pauschale steuern", CostField::FlatTax),
    ("erstattung ba", CostField::ReimbBa),
    ("ifsg", CostField::ReimbIfsg),
    ("gesamtkosten ohne erstattung", CostField::TotalCostWoReimb),
    ("gesamtkosten ohne", CostField::TotalCostWoReimb),
    ("gesamtkosten", CostField::TotalCost),
];

/// DATEV payroll accounting export, one row per employee per month.
pub struct DatevPayrollV1;

fn cell<'a>(record: &'a [String], col: Option<usize>) -> &'a str {
    col.and_then(|i| record.get(i))
        .map(String::as_str)
        .unwrap_or("")
}

impl FormatParser for DatevPayrollV1 {
    fn format_id(&self) -> &'static str {
        FORMAT_ID
    }

    fn detect(&self, table: &RawTable) -> DetectionCandidate {
        let all_present = REQUIRED_COLUMNS
            .iter()
            .all(|c| table.column_index(c).is_some());
        DetectionCandidate {
            format_id: FORMAT_ID,
            confidence: if all_present { 1.0 } else { 0.0 },
            columns: table.headers.clone(),
        }
    }

    fn parse(&self, table: &RawTable) -> ParsedCsv {
        let resolved = resolve_columns(FIELD_NEEDLES, &table.headers);
        let id_col = table.column_index("Pers.-Nr.");
        let last_col = table.column_index("Nachname");
        let first_col = table.column_index("Vorname");

        let mut rows = Vec::new();
        for record in &table.rows {
            // Only rows with a purely numeric personnel number are
            // employee records; anything else is footer noise.
            let pid = cell(record, id_col).trim();
            if pid.is_empty() || !pid.chars().all(|c| c.is_ascii_digit()) {
                continue;
            }

            let amount = |field: CostField| -> f64 {
                resolved
                    .get(&field)
                    .map(|&i| parse_amount(cell(record, Some(i))))
                    .unwrap_or(0.0)
            };

            rows.push(ExtractedRow {
                external_employee_id: pid.to_string(),
                first_name: cell(record, first_col).trim().to_string(),
                last_name: cell(record, last_col).trim().to_string(),
                period: "unknown".to_string(),
                currency: "EUR".to_string(),
                amounts: CostAmounts {
                    gross_amount: amount(CostField::Gross),
                    ag_bav_amount: amount(CostField::AgBav),
                    subsidy_amount: amount(CostField::Subsidy),
                    net_amount: amount(CostField::Net),
                    sv_ag_amount: amount(CostField::SvAg),
                    umlage_amount: amount(CostField::Umlage),
                    reimb_kk_amount: amount(CostField::ReimbKk),
                    flat_tax_amount: amount(CostField::FlatTax),
                    reimb_ba_amount: amount(CostField::ReimbBa),
                    reimb_ifsg_amount: amount(CostField::ReimbIfsg),
                    total_cost_wo_reimb: amount(CostField::TotalCostWoReimb),
                    total_cost: amount(CostField::TotalCost),
                },
            });
        }

        let columns_used: HashMap<CostField, String> = resolved
            .iter()
            .map(|(field, &i)| (*field, table.headers[i].clone()))
            .collect();

        ParsedCsv {
            format_id: FORMAT_ID,
            period: "unknown".to_string(),
            columns_used,
            rows,
        }
    }
}
