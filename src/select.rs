use std::fmt;

use clap::ValueEnum;

use crate::aggregate::{self, department_key};
use crate::dedupe;
use crate::models::{CompletionStatus, DepartmentSummary, Status, SubmissionRecord, SummaryStats};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Selection {
    #[default]
    All,
    Pending,
    Done,
}

impl Selection {
    pub fn matches(self, status: &CompletionStatus) -> bool {
        match self {
            Selection::All => true,
            Selection::Pending => status.status == Status::Pending,
            Selection::Done => status.status == Status::Done,
        }
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Pending => write!(f, "pending"),
            Selection::Done => write!(f, "done"),
        }
    }
}

pub fn select(statuses: &[CompletionStatus], selection: Selection) -> Vec<CompletionStatus> {
    statuses
        .iter()
        .filter(|status| selection.matches(status))
        .cloned()
        .collect()
}

pub fn summary_stats(statuses: &[CompletionStatus]) -> SummaryStats {
    let total = statuses.len();
    let done = statuses.iter().filter(|s| s.is_done()).count();
    SummaryStats {
        total,
        done,
        pending: total - done,
        percent: percent_of(done, total),
    }
}

/// A named table ready for the CSV sink. Never holds zero rows.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportView {
    pub filename: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportView {
    /// Returns `None` when there is nothing to export.
    pub fn new(filename: String, headers: &[&str], rows: Vec<Vec<String>>) -> Option<Self> {
        if rows.is_empty() {
            return None;
        }
        Some(Self {
            filename,
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows,
        })
    }
}

pub fn status_view(
    factory: &str,
    selection: Selection,
    statuses: &[CompletionStatus],
) -> Option<ExportView> {
    let rows = statuses
        .iter()
        .filter(|status| selection.matches(status))
        .map(|status| {
            vec![
                status.factory.clone(),
                status.identifier.clone(),
                status.name.clone(),
                status.department.clone(),
                status.status.to_string(),
                status.value_label(),
                status.timestamp_label().to_string(),
            ]
        })
        .collect();

    ExportView::new(
        format!("{factory}_status_{selection}.csv"),
        &["factory", "identifier", "name", "department", "status", "value", "timestamp"],
        rows,
    )
}

/// Unique names of a sheet, grouped by department.
pub fn department_detail_view(
    factory: &str,
    sheet: &str,
    records: &[SubmissionRecord],
) -> Option<ExportView> {
    let unique = dedupe::unique_by_name(records);
    let factory_label = factory.to_uppercase();

    let mut rows = Vec::new();
    for (department, members) in aggregate::group_by_department(&unique) {
        for member in members {
            rows.push(vec![
                factory_label.clone(),
                department.clone(),
                member.name.clone(),
                member.timestamp.clone(),
            ]);
        }
    }

    ExportView::new(
        format!("{factory}_department_detail_{sheet}.csv"),
        &["factory", "department", "name", "timestamp"],
        rows,
    )
}

/// Every submission whose name was entered more than once.
pub fn double_input_view(
    factory: &str,
    sheet: &str,
    records: &[SubmissionRecord],
) -> Option<ExportView> {
    let rows = dedupe::duplicate_names(records)
        .into_iter()
        .map(|record| {
            let department = department_key(&record).to_string();
            vec![
                record.factory,
                record.name,
                department,
                record.timestamp,
            ]
        })
        .collect();

    ExportView::new(
        format!("{factory}_double_input_{sheet}.csv"),
        &["factory", "name", "department", "timestamp"],
        rows,
    )
}

pub fn department_summary_view(
    factory: &str,
    summaries: &[DepartmentSummary],
) -> Option<ExportView> {
    let rows = summaries
        .iter()
        .map(|summary| {
            vec![
                summary.department.clone(),
                summary.total.to_string(),
                summary.done.to_string(),
                summary.pending.to_string(),
                percent_of(summary.done, summary.total).to_string(),
            ]
        })
        .collect();

    ExportView::new(
        format!("{factory}_department_summary.csv"),
        &["department", "total", "done", "pending", "percent"],
        rows,
    )
}

fn percent_of(done: usize, total: usize) -> u32 {
    if total == 0 {
        0
    } else {
        // f64::round rounds half away from zero.
        (done as f64 / total as f64 * 100.0).round() as u32
    }
}
