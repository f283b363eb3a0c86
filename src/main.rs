use std::path::PathBuf;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use clap::{ArgGroup, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod accounts;
mod aggregate;
mod dataset;
mod estimate;
mod filter;
mod models;
mod report;

use aggregate::{Direction, Metric};
use estimate::Role;
use filter::{FilterCriteria, Timeframe};
use models::ProductionRecord;

#[derive(Parser)]
#[command(name = "prep-productivity")]
#[command(about = "Employee production analytics for store prep crews", long_about = None)]
struct Cli {
    /// Production export to read (.json sheet export or .csv)
    #[arg(long, global = true, default_value = "EmployeeProductionExport.json")]
    data: PathBuf,
    /// Sheet to read from a JSON export (defaults to the only sheet)
    #[arg(long, global = true)]
    sheet: Option<String>,
    /// JSON file of {canonical, aliases} entries replacing the built-in
    /// account groups
    #[arg(long, global = true)]
    account_groups: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List filtered production records
    #[command(group(
        ArgGroup::new("window")
            .args(["date", "timeframe"])
            .multiple(false)
    ))]
    Records {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Timeframe::All)]
        timeframe: Timeframe,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Per-employee averages as a sortable table
    #[command(group(
        ArgGroup::new("window")
            .args(["date", "timeframe"])
            .multiple(false)
    ))]
    Table {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Timeframe::All)]
        timeframe: Timeframe,
        /// Column to sort by
        #[arg(long, value_enum, default_value_t = Metric::Pieces)]
        sort: Metric,
        #[arg(long)]
        ascending: bool,
    },
    /// Rank employees by a metric
    #[command(group(
        ArgGroup::new("window")
            .args(["date", "timeframe"])
            .multiple(false)
    ))]
    Top {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Timeframe::All)]
        timeframe: Timeframe,
        #[arg(long, value_enum, default_value_t = Metric::Pieces)]
        metric: Metric,
        #[arg(long)]
        bottom: bool,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Compare two account groups
    Compare {
        #[arg(long)]
        account_a: String,
        #[arg(long)]
        account_b: String,
        #[arg(long, value_enum, default_value_t = Timeframe::Year)]
        timeframe: Timeframe,
    },
    /// List the canonical account groups and their aliases
    Accounts,
    /// Estimate staffing hours for a store's weighted workload
    Estimate {
        #[arg(long)]
        store: String,
        /// Crew picks as EMPLOYEE_ID=ROLE (general, supervisor, rx, late,
        /// early); omit to list candidates
        #[arg(long = "crew", value_name = "EMPLOYEE_ID=ROLE", value_parser = parse_crew_spec)]
        crew: Vec<(String, Role)>,
        /// Draw crew baselines from the whole store instead of its account
        /// group
        #[arg(long)]
        by_store: bool,
    },
    /// Generate a markdown report
    #[command(group(
        ArgGroup::new("window")
            .args(["date", "timeframe"])
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        store: Option<String>,
        #[arg(long)]
        employee: Option<String>,
        #[arg(long)]
        account: Option<String>,
        #[arg(long)]
        date: Option<NaiveDate>,
        #[arg(long, value_enum, default_value_t = Timeframe::All)]
        timeframe: Timeframe,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
    },
}

fn parse_crew_spec(spec: &str) -> Result<(String, Role), String> {
    let (id, role) = spec.split_once('=').unwrap_or((spec, "general"));
    let id = id.trim();
    if id.is_empty() {
        return Err("employee id is empty".to_string());
    }
    let role = <Role as clap::ValueEnum>::from_str(role.trim(), true)?;
    Ok((id.to_string(), role))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let accounts = dataset::load_account_table(cli.account_groups.as_deref())?;
    let records = dataset::load_records(&cli.data, cli.sheet.as_deref())?;
    let now = Local::now().naive_local();

    match cli.command {
        Commands::Records {
            store,
            employee,
            account,
            date,
            timeframe,
            limit,
        } => {
            let criteria = FilterCriteria {
                store,
                employee,
                account,
                exact_date: date,
                timeframe,
            };
            let scope = filter::filter_records(&records, &criteria, &accounts, now);
            if scope.is_empty() {
                println!("No records matched.");
                return Ok(());
            }
            println!("{} records matched:", scope.len());
            for record in scope.iter().take(limit) {
                println!(
                    "- {} | {} | {} | {} | {:.2} pcs/hr, {:.2} $/hr, {:.2} sku/hr",
                    record.display_name(),
                    record.account_name,
                    record.store_name,
                    record.invoiced_on.date(),
                    record.pieces_per_hr,
                    record.dollars_per_hr,
                    record.skus_per_hr
                );
            }
            if scope.len() > limit {
                println!("... and {} more", scope.len() - limit);
            }
        }
        Commands::Table {
            store,
            employee,
            account,
            date,
            timeframe,
            sort,
            ascending,
        } => {
            let criteria = FilterCriteria {
                store,
                employee,
                account,
                exact_date: date,
                timeframe,
            };
            let scope = filter::filter_records(&records, &criteria, &accounts, now);
            let aggregates = aggregate::employee_averages(&scope);
            let direction = if ascending {
                Direction::Bottom
            } else {
                Direction::Top
            };
            let rows = report::table_rows(aggregates, sort, direction);
            if rows.is_empty() {
                println!("No employees matched.");
                return Ok(());
            }
            println!("{} employees (sorted by {}):", rows.len(), sort.label());
            for row in rows {
                println!(
                    "- {}: {:.2} pcs/hr, {:.2} $/hr, {:.2} sku/hr, delta {:.2}, gaps {:.1}/{:.1}/{:.1} ({} records)",
                    row.name,
                    row.pieces,
                    row.dollars,
                    row.skus,
                    row.avg_delta,
                    row.gap5,
                    row.gap10,
                    row.gap15,
                    row.record_count
                );
            }
        }
        Commands::Top {
            store,
            employee,
            account,
            date,
            timeframe,
            metric,
            bottom,
            limit,
        } => {
            let criteria = FilterCriteria {
                store,
                employee,
                account,
                exact_date: date,
                timeframe,
            };
            let scope = filter::filter_records(&records, &criteria, &accounts, now);
            let aggregates = aggregate::employee_averages(&scope);
            let direction = if bottom {
                Direction::Bottom
            } else {
                Direction::Top
            };
            let series = report::chart_series(aggregates, metric, direction, limit);
            if series.names.is_empty() {
                println!("No employees matched.");
                return Ok(());
            }
            println!(
                "{} employees by {}:",
                if bottom { "Bottom" } else { "Top" },
                series.label
            );
            for (name, value) in series.names.iter().zip(series.values.iter()) {
                println!("- {name}: {value:.2}");
            }
        }
        Commands::Compare {
            account_a,
            account_b,
            timeframe,
        } => {
            if accounts.normalize(&account_a) == accounts.normalize(&account_b) {
                anyhow::bail!("pick two different account groups");
            }
            let comparison = report::compare_accounts(
                &records,
                &accounts,
                &account_a,
                &account_b,
                timeframe,
                now,
            );
            println!(
                "{} vs {} ({} and {} employees)",
                comparison.account_a,
                comparison.account_b,
                comparison.average_a.employee_count,
                comparison.average_b.employee_count
            );
            for metric in Metric::ALL {
                println!(
                    "- {}: {:.2} vs {:.2}",
                    metric.label(),
                    metric.group_value(&comparison.average_a),
                    metric.group_value(&comparison.average_b)
                );
            }
            println!();
            println!("Per employee (pieces/hr):");
            for row in comparison.employees.iter() {
                let a = row.a.as_ref().map(|side| side.pieces).unwrap_or(0.0);
                let b = row.b.as_ref().map(|side| side.pieces).unwrap_or(0.0);
                println!("- {}: {:.2} vs {:.2}", row.name, a, b);
            }
        }
        Commands::Accounts => {
            for group in accounts.groups() {
                println!("- {} ({} aliases)", group.canonical, group.aliases.len());
                for alias in &group.aliases {
                    println!("    {alias}");
                }
            }
        }
        Commands::Estimate {
            store,
            crew,
            by_store,
        } => {
            let store = store.trim();
            let store_scope: Vec<&ProductionRecord> = records
                .iter()
                .filter(|record| record.store_name.eq_ignore_ascii_case(store))
                .collect();
            if store_scope.is_empty() {
                println!("No records for store \"{store}\".");
                return Ok(());
            }

            let totals = estimate::daily_totals(&store_scope);
            let workload = estimate::weighted_workload(&store_scope);
            println!(
                "Weighted avg workload for \"{}\" over {} dates: {:.0} pcs.",
                store,
                totals.len(),
                workload
            );

            let candidates = if by_store {
                estimate::crew_candidates(&store_scope)
            } else {
                let key = accounts.normalize(&store_scope[0].account_name);
                let account_scope: Vec<&ProductionRecord> = records
                    .iter()
                    .filter(|record| accounts.normalize(&record.account_name) == key)
                    .collect();
                estimate::crew_candidates(&account_scope)
            };

            if crew.is_empty() {
                println!("Crew candidates (pass --crew EMPLOYEE_ID=ROLE to estimate):");
                for candidate in candidates.iter().take(15) {
                    println!(
                        "- {} ({}): {:.1} pcs/hr over {} records",
                        candidate.name,
                        candidate.employee_id,
                        candidate.baseline_avg,
                        candidate.record_count
                    );
                }
                return Ok(());
            }

            let mut selection = estimate::CrewSelection::default();
            for (employee_id, role) in &crew {
                let candidate = candidates
                    .iter()
                    .find(|candidate| &candidate.employee_id == employee_id)
                    .with_context(|| {
                        format!("employee id \"{employee_id}\" has no records in this scope")
                    })?;
                selection.add(candidate);
                selection.assign_role(employee_id, *role)?;
            }

            for member in selection.members() {
                println!(
                    "- {} as {} ({:.1} pcs/hr baseline)",
                    member.name,
                    member.role.label(),
                    member.baseline_avg
                );
            }
            let hours = estimate::staffing_hours(workload, &selection)?;
            println!(
                "Estimated: {:.2} hrs (capacity: {:.1} pph)",
                hours,
                selection.capacity()
            );
        }
        Commands::Report {
            store,
            employee,
            account,
            date,
            timeframe,
            out,
        } => {
            let criteria = FilterCriteria {
                store,
                employee,
                account,
                exact_date: date,
                timeframe,
            };
            let markdown = report::build_report(&criteria, &accounts, &records, now);
            std::fs::write(&out, markdown)?;
            println!("Report written to {}.", out.display());
        }
    }

    Ok(())
}
