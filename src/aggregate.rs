use std::cmp::Ordering;
use std::collections::HashMap;

use crate::dedupe;
use crate::models::{
    CompletionStatus, DepartmentCount, DepartmentSummary, Departmental, SubmissionRecord,
    UNKNOWN_DEPARTMENT,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// Departments in order of first appearance.
    #[default]
    FirstSeen,
    Alphabetical,
}

/// Department label a record is bucketed under.
pub fn department_key(record: &impl Departmental) -> &str {
    let department = record.department();
    if department.trim().is_empty() {
        UNKNOWN_DEPARTMENT
    } else {
        department
    }
}

/// Groups records by exact department string, in order of first appearance.
pub fn group_by_department<T: Departmental>(records: &[T]) -> Vec<(String, Vec<&T>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<&T>)> = Vec::new();

    for record in records {
        let key = department_key(record);
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push((key.to_string(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(record);
    }

    groups
}

pub fn department_counts<T: Departmental>(
    records: &[T],
    order: GroupOrder,
) -> Vec<DepartmentCount> {
    let mut counts: Vec<DepartmentCount> = group_by_department(records)
        .into_iter()
        .map(|(department, members)| DepartmentCount {
            department,
            count: members.len(),
        })
        .collect();

    if order == GroupOrder::Alphabetical {
        counts.sort_by(|a, b| compare_departments(&a.department, &b.department));
    }
    counts
}

/// Per-department counts of a sheet after dropping repeated names.
pub fn unique_name_counts(records: &[SubmissionRecord]) -> Vec<DepartmentCount> {
    if records.is_empty() {
        return Vec::new();
    }
    department_counts(&dedupe::unique_by_name(records), GroupOrder::FirstSeen)
}

pub fn department_summary(
    statuses: &[CompletionStatus],
    order: GroupOrder,
) -> Vec<DepartmentSummary> {
    let mut summaries: Vec<DepartmentSummary> = group_by_department(statuses)
        .into_iter()
        .map(|(department, members)| {
            let done = members.iter().filter(|s| s.is_done()).count();
            DepartmentSummary {
                department,
                total: members.len(),
                done,
                pending: members.len() - done,
            }
        })
        .collect();

    if order == GroupOrder::Alphabetical {
        summaries.sort_by(|a, b| compare_departments(&a.department, &b.department));
    }
    summaries
}

/// Case-insensitive ordering, ties broken on the raw label.
pub fn compare_departments(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
