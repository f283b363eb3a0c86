use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use clap::ValueEnum;
use thiserror::Error;

use crate::models::{CrewCandidate, ProductionRecord};

pub const MAX_SUPERVISORS: usize = 1;
pub const MAX_RX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Role {
    #[default]
    General,
    Supervisor,
    Rx,
    Late,
    Early,
}

impl Role {
    /// Share of the member's baseline throughput available in this role.
    pub fn capacity_factor(self) -> f64 {
        match self {
            Role::General => 1.0,
            Role::Early => 0.75,
            Role::Rx => 0.5,
            Role::Late => 0.5,
            Role::Supervisor => 0.3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::General => "General",
            Role::Supervisor => "Supervisor",
            Role::Rx => "Kroger Rx",
            Role::Late => "Arriving Late",
            Role::Early => "Leaving Early",
        }
    }
}

#[derive(Debug, Error)]
pub enum CrewError {
    #[error("crew capacity is zero; select at least one member with throughput")]
    ZeroCapacity,
    #[error("at most {limit} crew member(s) may hold the {role} role")]
    RoleLimit { role: &'static str, limit: usize },
    #[error("no crew member with employee id \"{0}\"")]
    UnknownMember(String),
}

#[derive(Debug, Clone)]
pub struct CrewMember {
    pub employee_id: String,
    pub name: String,
    pub baseline_avg: f64,
    pub role: Role,
}

/// Ordered roster with the role caps enforced at assignment time. The
/// estimator itself trusts a selection it is handed.
#[derive(Debug, Clone, Default)]
pub struct CrewSelection {
    members: Vec<CrewMember>,
}

impl CrewSelection {
    /// Adds a candidate in the General role.
    pub fn add(&mut self, candidate: &CrewCandidate) {
        self.members.push(CrewMember {
            employee_id: candidate.employee_id.clone(),
            name: candidate.name.clone(),
            baseline_avg: candidate.baseline_avg,
            role: Role::General,
        });
    }

    /// Whether one more member could take `role` without breaking the caps.
    /// This is the probe a front end uses to disable a choice.
    pub fn role_available(&self, role: Role) -> bool {
        match role {
            Role::Supervisor => self.count(Role::Supervisor) < MAX_SUPERVISORS,
            Role::Rx => self.count(Role::Rx) < MAX_RX,
            _ => true,
        }
    }

    /// Moves an existing member into `role`, rejecting assignments that
    /// would exceed a cap. Re-assigning a member's current role is a no-op.
    pub fn assign_role(&mut self, employee_id: &str, role: Role) -> Result<(), CrewError> {
        let index = self
            .members
            .iter()
            .position(|m| m.employee_id == employee_id)
            .ok_or_else(|| CrewError::UnknownMember(employee_id.to_string()))?;
        if self.members[index].role == role {
            return Ok(());
        }
        // the member does not hold `role` yet, so its own slot never counts
        // against the cap
        let limit = match role {
            Role::Supervisor => Some(MAX_SUPERVISORS),
            Role::Rx => Some(MAX_RX),
            _ => None,
        };
        if let Some(limit) = limit {
            if !self.role_available(role) {
                return Err(CrewError::RoleLimit {
                    role: role.label(),
                    limit,
                });
            }
        }
        self.members[index].role = role;
        Ok(())
    }

    pub fn members(&self) -> &[CrewMember] {
        &self.members
    }

    pub fn capacity(&self) -> f64 {
        self.members
            .iter()
            .map(|m| m.baseline_avg * m.role.capacity_factor())
            .sum()
    }

    fn count(&self, role: Role) -> usize {
        self.members.iter().filter(|m| m.role == role).count()
    }
}

/// Total extended quantity per calendar day, chronologically ordered.
pub fn daily_totals(records: &[&ProductionRecord]) -> BTreeMap<NaiveDate, f64> {
    let mut totals = BTreeMap::new();
    for record in records {
        *totals.entry(record.invoiced_on.date()).or_insert(0.0) += record.total_ext_qty;
    }
    totals
}

/// Recency-weighted average daily workload: the i-th distinct day in
/// chronological order carries raw weight i+1, normalized to sum 1, so the
/// newest day dominates linearly by rank rather than by elapsed time.
pub fn weighted_workload(records: &[&ProductionRecord]) -> f64 {
    let totals = daily_totals(records);
    let n = totals.len();
    if n == 0 {
        return 0.0;
    }
    let weight_sum = (n * (n + 1)) as f64 / 2.0;
    totals
        .values()
        .enumerate()
        .map(|(i, total)| total * ((i + 1) as f64 / weight_sum))
        .sum()
}

/// Per-employee baseline average pieces/hr over the scope, keyed by the
/// employee id (unlike the aggregator, which keys by rendered name), best
/// first.
pub fn crew_candidates(records: &[&ProductionRecord]) -> Vec<CrewCandidate> {
    struct Tally {
        name: String,
        total: f64,
        count: usize,
    }

    let mut tallies: HashMap<String, Tally> = HashMap::new();
    for record in records {
        let entry = tallies
            .entry(record.employee_id.clone())
            .or_insert_with(|| Tally {
                name: record.display_name(),
                total: 0.0,
                count: 0,
            });
        entry.total += record.pieces_per_hr;
        entry.count += 1;
    }

    let mut candidates: Vec<CrewCandidate> = tallies
        .into_iter()
        .map(|(employee_id, tally)| CrewCandidate {
            employee_id,
            name: tally.name,
            baseline_avg: tally.total / tally.count.max(1) as f64,
            record_count: tally.count,
        })
        .collect();
    candidates.sort_by(|a, b| {
        b.baseline_avg
            .partial_cmp(&a.baseline_avg)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    candidates
}

/// Estimated hours for the workload at the crew's combined capacity.
pub fn staffing_hours(workload: f64, crew: &CrewSelection) -> Result<f64, CrewError> {
    let capacity = crew.capacity();
    if capacity <= 0.0 {
        return Err(CrewError::ZeroCapacity);
    }
    Ok(workload / capacity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn record(employee_id: &str, date: &str, qty: f64, pieces: f64) -> ProductionRecord {
        ProductionRecord {
            employee_id: employee_id.to_string(),
            first_name: employee_id.to_string(),
            last_name: "Crew".to_string(),
            account_name: "kroger".to_string(),
            store_name: "Store 12".to_string(),
            invoiced_on: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_time(NaiveTime::MIN),
            pieces_per_hr: pieces,
            dollars_per_hr: 0.0,
            skus_per_hr: 0.0,
            avg_delta: 0.0,
            gap5: 0.0,
            gap10: 0.0,
            gap15: 0.0,
            total_ext_qty: qty,
        }
    }

    fn candidate(id: &str, avg: f64) -> CrewCandidate {
        CrewCandidate {
            employee_id: id.to_string(),
            name: format!("{id} Crew"),
            baseline_avg: avg,
            record_count: 1,
        }
    }

    #[test]
    fn later_dates_carry_more_weight() {
        let records = vec![
            record("e1", "2024-06-01", 100.0, 0.0),
            record("e1", "2024-06-08", 100.0, 0.0),
        ];
        let refs: Vec<&ProductionRecord> = records.iter().collect();
        // weights 1/3 and 2/3 over equal totals
        let workload = weighted_workload(&refs);
        let expected = 100.0 * (1.0 / 3.0) + 100.0 * (2.0 / 3.0);
        assert!((workload - expected).abs() < 1e-9);

        let totals = daily_totals(&refs);
        assert_eq!(totals.len(), 2);
    }

    #[test]
    fn workload_of_empty_scope_is_zero() {
        assert_eq!(weighted_workload(&[]), 0.0);
    }

    #[test]
    fn same_day_records_sum_before_weighting() {
        let records = vec![
            record("e1", "2024-06-08", 40.0, 0.0),
            record("e2", "2024-06-08", 60.0, 0.0),
        ];
        let refs: Vec<&ProductionRecord> = records.iter().collect();
        assert!((weighted_workload(&refs) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn candidates_key_by_employee_id() {
        // same rendered name, distinct ids: they stay separate here
        let mut a = record("1001", "2024-06-08", 0.0, 50.0);
        let mut b = record("1002", "2024-06-08", 0.0, 90.0);
        a.first_name = "Avery".to_string();
        a.last_name = "Lee".to_string();
        b.first_name = "Avery".to_string();
        b.last_name = "Lee".to_string();
        let records = vec![a, b];
        let refs: Vec<&ProductionRecord> = records.iter().collect();

        let candidates = crew_candidates(&refs);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].employee_id, "1002");
        assert!((candidates[0].baseline_avg - 90.0).abs() < 1e-9);
    }

    #[test]
    fn capacity_follows_role_factors() {
        let mut crew = CrewSelection::default();
        crew.add(&candidate("e1", 100.0));
        crew.add(&candidate("e2", 80.0));
        crew.assign_role("e2", Role::Supervisor).unwrap();

        let hours = staffing_hours(100.0, &crew).unwrap();
        assert!((crew.capacity() - 124.0).abs() < 1e-9);
        assert!((hours - 100.0 / 124.0).abs() < 1e-9);
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let crew = CrewSelection::default();
        assert!(matches!(
            staffing_hours(500.0, &crew),
            Err(CrewError::ZeroCapacity)
        ));

        let mut idle = CrewSelection::default();
        idle.add(&candidate("e1", 0.0));
        assert!(matches!(
            staffing_hours(500.0, &idle),
            Err(CrewError::ZeroCapacity)
        ));
    }

    #[test]
    fn supervisor_cap_is_one() {
        let mut crew = CrewSelection::default();
        crew.add(&candidate("e1", 100.0));
        crew.add(&candidate("e2", 90.0));
        crew.assign_role("e1", Role::Supervisor).unwrap();

        assert!(!crew.role_available(Role::Supervisor));
        assert!(matches!(
            crew.assign_role("e2", Role::Supervisor),
            Err(CrewError::RoleLimit { limit: 1, .. })
        ));
        // re-assigning the holder's own role stays allowed
        crew.assign_role("e1", Role::Supervisor).unwrap();
    }

    #[test]
    fn rx_cap_is_two() {
        let mut crew = CrewSelection::default();
        for id in ["e1", "e2", "e3"] {
            crew.add(&candidate(id, 50.0));
        }
        crew.assign_role("e1", Role::Rx).unwrap();
        crew.assign_role("e2", Role::Rx).unwrap();
        assert!(!crew.role_available(Role::Rx));
        assert!(matches!(
            crew.assign_role("e3", Role::Rx),
            Err(CrewError::RoleLimit { limit: 2, .. })
        ));
        // late has no cap
        crew.assign_role("e3", Role::Late).unwrap();
    }

    #[test]
    fn unknown_member_is_an_error() {
        let mut crew = CrewSelection::default();
        assert!(matches!(
            crew.assign_role("ghost", Role::General),
            Err(CrewError::UnknownMember(_))
        ));
    }
}
