use chrono::NaiveDateTime;

#[derive(Debug, Clone)]
pub struct ProductionRecord {
    pub employee_id: String,
    pub first_name: String,
    pub last_name: String,
    pub account_name: String,
    pub store_name: String,
    pub invoiced_on: NaiveDateTime,
    pub pieces_per_hr: f64,
    pub dollars_per_hr: f64,
    pub skus_per_hr: f64,
    pub avg_delta: f64,
    pub gap5: f64,
    pub gap10: f64,
    pub gap15: f64,
    pub total_ext_qty: f64,
}

impl ProductionRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone)]
pub struct EmployeeAggregate {
    pub name: String,
    pub pieces: f64,
    pub dollars: f64,
    pub skus: f64,
    pub avg_delta: f64,
    pub gap5: f64,
    pub gap10: f64,
    pub gap15: f64,
    pub record_count: usize,
}

#[derive(Debug, Clone, Default)]
pub struct GroupAverage {
    pub pieces: f64,
    pub dollars: f64,
    pub skus: f64,
    pub avg_delta: f64,
    pub gap5: f64,
    pub gap10: f64,
    pub gap15: f64,
    pub employee_count: usize,
}

#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: String,
    pub record_count: usize,
    pub avg_pieces: f64,
}

#[derive(Debug, Clone)]
pub struct ChartSeries {
    pub label: String,
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct EmployeeComparison {
    pub name: String,
    pub a: Option<EmployeeAggregate>,
    pub b: Option<EmployeeAggregate>,
}

#[derive(Debug, Clone)]
pub struct AccountComparison {
    pub account_a: String,
    pub account_b: String,
    pub average_a: GroupAverage,
    pub average_b: GroupAverage,
    pub employees: Vec<EmployeeComparison>,
}

#[derive(Debug, Clone)]
pub struct CrewCandidate {
    pub employee_id: String,
    pub name: String,
    pub baseline_avg: f64,
    pub record_count: usize,
}
