use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use chrono::NaiveDateTime;

use crate::accounts::AccountTable;
use crate::aggregate::{self, Direction, Metric};
use crate::filter::{self, FilterCriteria, Timeframe};
use crate::models::{
    AccountComparison, AccountSummary, ChartSeries, EmployeeAggregate, EmployeeComparison,
    GroupAverage, ProductionRecord,
};

/// Table rows for the dashboard grid: every employee, sorted by the chosen
/// column.
pub fn table_rows(
    aggregates: Vec<EmployeeAggregate>,
    metric: Metric,
    direction: Direction,
) -> Vec<EmployeeAggregate> {
    let mut rows = aggregates;
    aggregate::sort_by_metric(&mut rows, metric, direction);
    rows
}

/// Ranked top/bottom-N series for a bar chart.
pub fn chart_series(
    aggregates: Vec<EmployeeAggregate>,
    metric: Metric,
    direction: Direction,
    n: usize,
) -> ChartSeries {
    let ranked = aggregate::rank(aggregates, metric, direction, n);
    ChartSeries {
        label: metric.label().to_string(),
        names: ranked.iter().map(|row| row.name.clone()).collect(),
        values: ranked.iter().map(|row| metric.value(row)).collect(),
    }
}

/// Records per canonical account group with the mean pieces/hr, busiest
/// group first.
pub fn summarize_by_account(
    records: &[&ProductionRecord],
    accounts: &AccountTable,
) -> Vec<AccountSummary> {
    let mut map: HashMap<String, (usize, f64)> = HashMap::new();

    for record in records {
        let key = accounts.normalize(&record.account_name);
        let entry = map.entry(key).or_insert((0, 0.0));
        entry.0 += 1;
        entry.1 += record.pieces_per_hr;
    }

    let mut summaries: Vec<AccountSummary> = map
        .into_iter()
        .map(|(account, (count, total_pieces))| AccountSummary {
            account,
            record_count: count,
            avg_pieces: total_pieces / count.max(1) as f64,
        })
        .collect();

    summaries.sort_by(|a, b| b.record_count.cmp(&a.record_count));
    summaries
}

/// Group-wide average for one account group within a timeframe: filter to
/// the canonical group, average per employee, then mean of those means.
pub fn account_group_average(
    records: &[ProductionRecord],
    accounts: &AccountTable,
    account: &str,
    timeframe: Timeframe,
    now: NaiveDateTime,
) -> GroupAverage {
    let criteria = FilterCriteria {
        account: Some(account.to_string()),
        timeframe,
        ..FilterCriteria::default()
    };
    let scope = filter::filter_records(records, &criteria, accounts, now);
    aggregate::group_average(&aggregate::employee_averages(&scope))
}

/// Side-by-side rollup of two account groups plus the union of their
/// per-employee rows. An employee absent from one side has `None` there;
/// the renderer shows zeros.
pub fn compare_accounts(
    records: &[ProductionRecord],
    accounts: &AccountTable,
    account_a: &str,
    account_b: &str,
    timeframe: Timeframe,
    now: NaiveDateTime,
) -> AccountComparison {
    let side = |account: &str| {
        let criteria = FilterCriteria {
            account: Some(account.to_string()),
            timeframe,
            ..FilterCriteria::default()
        };
        let scope = filter::filter_records(records, &criteria, accounts, now);
        aggregate::employee_averages(&scope)
    };

    let per_a = side(account_a);
    let per_b = side(account_b);
    let average_a = aggregate::group_average(&per_a);
    let average_b = aggregate::group_average(&per_b);

    let names: BTreeSet<String> = per_a
        .iter()
        .chain(per_b.iter())
        .map(|row| row.name.clone())
        .collect();
    let employees = names
        .into_iter()
        .map(|name| EmployeeComparison {
            a: per_a.iter().find(|row| row.name == name).cloned(),
            b: per_b.iter().find(|row| row.name == name).cloned(),
            name,
        })
        .collect();

    AccountComparison {
        account_a: accounts.normalize(account_a),
        account_b: accounts.normalize(account_b),
        average_a,
        average_b,
        employees,
    }
}

pub fn build_report(
    criteria: &FilterCriteria,
    accounts: &AccountTable,
    records: &[ProductionRecord],
    now: NaiveDateTime,
) -> String {
    let scope = filter::filter_records(records, criteria, accounts, now);
    let aggregates = aggregate::employee_averages(&scope);
    let average = aggregate::group_average(&aggregates);
    let summaries = summarize_by_account(&scope, accounts);
    let top = aggregate::rank(aggregates, Metric::Pieces, Direction::Top, 10);

    let scope_label = criteria
        .store
        .as_deref()
        .or(criteria.account.as_deref())
        .or(criteria.employee.as_deref())
        .unwrap_or("all stores");

    let mut output = String::new();
    let _ = writeln!(output, "# Store Prep Production Report");
    match criteria.timeframe.cutoff(now) {
        Some(cutoff) if criteria.exact_date.is_none() => {
            let _ = writeln!(
                output,
                "Generated for {} (records since {})",
                scope_label,
                cutoff.date()
            );
        }
        _ => match criteria.exact_date {
            Some(day) => {
                let _ = writeln!(output, "Generated for {} (records on {})", scope_label, day);
            }
            None => {
                let _ = writeln!(output, "Generated for {} (all records)", scope_label);
            }
        },
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Account Mix");

    if summaries.is_empty() {
        let _ = writeln!(output, "No records matched this scope.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} records (avg {:.1} pieces/hr)",
                summary.account, summary.record_count, summary.avg_pieces
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Group Average");

    if average.employee_count == 0 {
        let _ = writeln!(output, "No employees in this scope.");
    } else {
        for metric in Metric::ALL {
            let _ = writeln!(
                output,
                "- {}: {:.2}",
                metric.label(),
                metric.group_value(&average)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Top Performers (pieces/hr)");

    if top.is_empty() {
        let _ = writeln!(output, "No employees in this scope.");
    } else {
        for row in top.iter() {
            let _ = writeln!(
                output,
                "- {}: {:.2} pieces/hr ({:.2} $/hr, {:.2} SKU/hr) across {} records",
                row.name, row.pieces, row.dollars, row.skus, row.record_count
            );
        }
    }

    let mut recent = scope.clone();
    recent.sort_by(|a, b| b.invoiced_on.cmp(&a.invoiced_on));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Records");

    if recent.is_empty() {
        let _ = writeln!(output, "No records matched this scope.");
    } else {
        for record in recent.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) at {} on {}: {:.1} pieces/hr",
                record.display_name(),
                record.account_name,
                record.store_name,
                record.invoiced_on.date(),
                record.pieces_per_hr
            );
        }
    }

    output
}
