use chrono::{Duration, Months, NaiveDate, NaiveDateTime};
use clap::ValueEnum;

use crate::accounts::AccountTable;
use crate::models::ProductionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Timeframe {
    #[default]
    All,
    Week,
    Month,
    #[value(name = "6month")]
    SixMonth,
    Year,
}

impl Timeframe {
    /// Calendar-aware cutoff for the window ending at `now`. `None` means
    /// no lower bound (either `All`, or month subtraction underflowed the
    /// calendar, in which case every record is in range anyway).
    pub fn cutoff(self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Timeframe::All => None,
            Timeframe::Week => Some(now - Duration::days(7)),
            Timeframe::Month => now.checked_sub_months(Months::new(1)),
            Timeframe::SixMonth => now.checked_sub_months(Months::new(6)),
            Timeframe::Year => now.checked_sub_months(Months::new(12)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterCriteria {
    pub store: Option<String>,
    pub employee: Option<String>,
    pub account: Option<String>,
    pub exact_date: Option<NaiveDate>,
    pub timeframe: Timeframe,
}

/// Single order-preserving pass over the records; every present criterion
/// must match. An exact date overrides the relative timeframe.
pub fn filter_records<'a>(
    records: &'a [ProductionRecord],
    criteria: &FilterCriteria,
    accounts: &AccountTable,
    now: NaiveDateTime,
) -> Vec<&'a ProductionRecord> {
    let store_term = criteria.store.as_deref().map(str::to_lowercase);
    let employee_term = criteria.employee.as_deref().map(str::to_lowercase);
    let account_key = criteria
        .account
        .as_deref()
        .map(|term| accounts.normalize(term));
    let cutoff = if criteria.exact_date.is_some() {
        None
    } else {
        criteria.timeframe.cutoff(now)
    };

    records
        .iter()
        .filter(|record| {
            if let Some(term) = &store_term {
                if !record.store_name.to_lowercase().contains(term) {
                    return false;
                }
            }
            if let Some(term) = &employee_term {
                if !record.display_name().to_lowercase().contains(term) {
                    return false;
                }
            }
            if let Some(key) = &account_key {
                if accounts.normalize(&record.account_name) != *key {
                    return false;
                }
            }
            if let Some(day) = criteria.exact_date {
                if record.invoiced_on.date() != day {
                    return false;
                }
            } else if let Some(cutoff) = cutoff {
                if record.invoiced_on < cutoff {
                    return false;
                }
            }
            true
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn record(name: &str, account: &str, store: &str, date: &str) -> ProductionRecord {
        let (first, last) = name.split_once(' ').unwrap_or((name, ""));
        ProductionRecord {
            employee_id: name.to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            account_name: account.to_string(),
            store_name: store.to_string(),
            invoiced_on: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_time(NaiveTime::MIN),
            pieces_per_hr: 0.0,
            dollars_per_hr: 0.0,
            skus_per_hr: 0.0,
            avg_delta: 0.0,
            gap5: 0.0,
            gap10: 0.0,
            gap15: 0.0,
            total_ext_qty: 0.0,
        }
    }

    fn noon(date: &str) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn week_window_is_inclusive_of_recent_days() {
        let records = vec![
            record("Avery Lee", "kroger", "Store 12", "2024-06-01"),
            record("Avery Lee", "kroger", "Store 12", "2024-06-10"),
        ];
        let criteria = FilterCriteria {
            timeframe: Timeframe::Week,
            ..FilterCriteria::default()
        };
        let table = AccountTable::builtin();
        let kept = filter_records(&records, &criteria, &table, noon("2024-06-15"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].invoiced_on.date().to_string(), "2024-06-10");
    }

    #[test]
    fn month_cutoff_clamps_at_month_end() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 31)
            .unwrap()
            .and_time(NaiveTime::MIN);
        let cutoff = Timeframe::Month.cutoff(now).unwrap();
        assert_eq!(cutoff.date(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn exact_date_overrides_timeframe() {
        let records = vec![
            record("Avery Lee", "kroger", "Store 12", "2023-01-05"),
            record("Avery Lee", "kroger", "Store 12", "2024-06-10"),
        ];
        let criteria = FilterCriteria {
            exact_date: NaiveDate::from_ymd_opt(2023, 1, 5),
            timeframe: Timeframe::Week,
            ..FilterCriteria::default()
        };
        let table = AccountTable::builtin();
        let kept = filter_records(&records, &criteria, &table, noon("2024-06-15"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].invoiced_on.date().to_string(), "2023-01-05");
    }

    #[test]
    fn account_term_matches_through_aliases() {
        let records = vec![
            record("Avery Lee", "Mariano's", "Store 12", "2024-06-10"),
            record("Jules Moreno", "KROGER", "Store 12", "2024-06-10"),
            record("Kiara Patel", "Sendik's", "Store 12", "2024-06-10"),
        ];
        let criteria = FilterCriteria {
            account: Some("kroger".to_string()),
            ..FilterCriteria::default()
        };
        let table = AccountTable::builtin();
        let kept = filter_records(&records, &criteria, &table, noon("2024-06-15"));
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn extra_criteria_never_grow_the_result() {
        let records = vec![
            record("Avery Lee", "kroger", "Store 12", "2024-06-10"),
            record("Jules Moreno", "kroger", "Depot 4", "2024-06-10"),
            record("Kiara Patel", "schierl", "Depot 4", "2024-06-10"),
        ];
        let table = AccountTable::builtin();
        let now = noon("2024-06-15");

        let base = FilterCriteria {
            account: Some("fuel on".to_string()),
            ..FilterCriteria::default()
        };
        let narrowed = FilterCriteria {
            store: Some("depot".to_string()),
            ..base.clone()
        };
        let wide = filter_records(&records, &base, &table, now);
        let narrow = filter_records(&records, &narrowed, &table, now);
        assert!(narrow.len() <= wide.len());
        assert_eq!(wide.len(), 1);
        assert_eq!(narrow.len(), 1);
    }

    #[test]
    fn employee_match_is_substring_of_full_name() {
        let records = vec![
            record("Avery Lee", "kroger", "Store 12", "2024-06-10"),
            record("Jules Moreno", "kroger", "Store 12", "2024-06-10"),
        ];
        let criteria = FilterCriteria {
            employee: Some("ry le".to_string()),
            ..FilterCriteria::default()
        };
        let table = AccountTable::builtin();
        let kept = filter_records(&records, &criteria, &table, noon("2024-06-15"));
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].first_name, "Avery");
    }
}
