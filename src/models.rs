#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: i64,
    pub external_id: String,
    pub first_name: String,
    pub last_name: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct ImportJob {
    pub id: i64,
    pub source_type: String,
    pub period: String,
    pub original_filename: String,
    pub status: String,
    pub error_message: Option<String>,
    pub currency: String,
    pub created_at: String,
}

#[allow(dead_code)]
#[derive(Debug, Clone)]
pub struct EmployeeCost {
    pub id: i64,
    pub import_id: i64,
    pub employee_id: i64,
    pub period: String,
    pub amounts: CostAmounts,
    pub currency: String,
}

/// The twelve monetary fields carried by every payroll cost row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CostAmounts {
    pub gross_amount: f64,
    pub ag_bav_amount: f64,
    pub subsidy_amount: f64,
    pub net_amount: f64,
    pub sv_ag_amount: f64,
    pub umlage_amount: f64,
    pub reimb_kk_amount: f64,
    pub flat_tax_amount: f64,
    pub reimb_ba_amount: f64,
    pub reimb_ifsg_amount: f64,
    pub total_cost_wo_reimb: f64,
    pub total_cost: f64,
}

/// Semantic keys for the monetary columns a format parser resolves
/// against a file's actual headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CostField {
    Gross,
    AgBav,
    Subsidy,
    Net,
    SvAg,
    Umlage,
    ReimbKk,
    FlatTax,
    ReimbBa,
    ReimbIfsg,
    TotalCostWoReimb,
    TotalCost,
}

/// Intermediate representation from a format parser before DB insert.
/// `period` stays "unknown" until the orchestrator stamps the real one.
#[derive(Debug, Clone)]
pub struct ExtractedRow {
    pub external_employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub period: String,
    pub currency: String,
    pub amounts: CostAmounts,
}
