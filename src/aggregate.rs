use std::collections::HashMap;

use clap::ValueEnum;

use crate::models::{EmployeeAggregate, GroupAverage, ProductionRecord};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Metric {
    #[default]
    Pieces,
    Dollars,
    Skus,
    #[value(name = "avg-delta")]
    AvgDelta,
    #[value(name = "gap5")]
    Gap5,
    #[value(name = "gap10")]
    Gap10,
    #[value(name = "gap15")]
    Gap15,
}

impl Metric {
    pub const ALL: [Metric; 7] = [
        Metric::Pieces,
        Metric::Dollars,
        Metric::Skus,
        Metric::AvgDelta,
        Metric::Gap5,
        Metric::Gap10,
        Metric::Gap15,
    ];

    pub fn value(self, row: &EmployeeAggregate) -> f64 {
        match self {
            Metric::Pieces => row.pieces,
            Metric::Dollars => row.dollars,
            Metric::Skus => row.skus,
            Metric::AvgDelta => row.avg_delta,
            Metric::Gap5 => row.gap5,
            Metric::Gap10 => row.gap10,
            Metric::Gap15 => row.gap15,
        }
    }

    pub fn group_value(self, row: &GroupAverage) -> f64 {
        match self {
            Metric::Pieces => row.pieces,
            Metric::Dollars => row.dollars,
            Metric::Skus => row.skus,
            Metric::AvgDelta => row.avg_delta,
            Metric::Gap5 => row.gap5,
            Metric::Gap10 => row.gap10,
            Metric::Gap15 => row.gap15,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Metric::Pieces => "Pieces/hr",
            Metric::Dollars => "$/hr",
            Metric::Skus => "SKU/hr",
            Metric::AvgDelta => "Avg delta",
            Metric::Gap5 => "Gap 5m",
            Metric::Gap10 => "Gap 10m",
            Metric::Gap15 => "Gap 15m",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Top,
    Bottom,
}

#[derive(Default)]
struct Sums {
    pieces: f64,
    dollars: f64,
    skus: f64,
    avg_delta: f64,
    gap5: f64,
    gap10: f64,
    gap15: f64,
    count: usize,
}

/// Per-employee arithmetic means, grouped by rendered "first last" name.
/// Two employee ids that render the same name merge into one row; the
/// crew-candidate path in `estimate` keys by id instead.
pub fn employee_averages(records: &[&ProductionRecord]) -> Vec<EmployeeAggregate> {
    let mut order: Vec<String> = Vec::new();
    let mut sums: HashMap<String, Sums> = HashMap::new();

    for record in records {
        let name = record.display_name();
        let entry = sums.entry(name.clone()).or_insert_with(|| {
            order.push(name);
            Sums::default()
        });
        entry.pieces += record.pieces_per_hr;
        entry.dollars += record.dollars_per_hr;
        entry.skus += record.skus_per_hr;
        entry.avg_delta += record.avg_delta;
        entry.gap5 += record.gap5;
        entry.gap10 += record.gap10;
        entry.gap15 += record.gap15;
        entry.count += 1;
    }

    order
        .into_iter()
        .map(|name| {
            let sum = &sums[&name];
            let n = sum.count.max(1) as f64;
            EmployeeAggregate {
                pieces: sum.pieces / n,
                dollars: sum.dollars / n,
                skus: sum.skus / n,
                avg_delta: sum.avg_delta / n,
                gap5: sum.gap5 / n,
                gap10: sum.gap10 / n,
                gap15: sum.gap15 / n,
                record_count: sum.count,
                name,
            }
        })
        .collect()
}

/// Unweighted mean of the per-employee means. An employee averaging over
/// two records counts the same as one averaging over two hundred.
pub fn group_average(aggregates: &[EmployeeAggregate]) -> GroupAverage {
    let mut total = GroupAverage::default();
    for row in aggregates {
        total.pieces += row.pieces;
        total.dollars += row.dollars;
        total.skus += row.skus;
        total.avg_delta += row.avg_delta;
        total.gap5 += row.gap5;
        total.gap10 += row.gap10;
        total.gap15 += row.gap15;
    }
    let n = aggregates.len().max(1) as f64;
    GroupAverage {
        pieces: total.pieces / n,
        dollars: total.dollars / n,
        skus: total.skus / n,
        avg_delta: total.avg_delta / n,
        gap5: total.gap5 / n,
        gap10: total.gap10 / n,
        gap15: total.gap15 / n,
        employee_count: aggregates.len(),
    }
}

/// Stable sort by the chosen metric, then the first `n` rows. Ties keep
/// their incoming order.
pub fn rank(
    mut aggregates: Vec<EmployeeAggregate>,
    metric: Metric,
    direction: Direction,
    n: usize,
) -> Vec<EmployeeAggregate> {
    sort_by_metric(&mut aggregates, metric, direction);
    aggregates.truncate(n);
    aggregates
}

pub fn sort_by_metric(aggregates: &mut [EmployeeAggregate], metric: Metric, direction: Direction) {
    aggregates.sort_by(|a, b| {
        let ordering = metric
            .value(a)
            .partial_cmp(&metric.value(b))
            .unwrap_or(std::cmp::Ordering::Equal);
        match direction {
            Direction::Top => ordering.reverse(),
            Direction::Bottom => ordering,
        }
    });
}
