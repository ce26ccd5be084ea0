use std::collections::HashSet;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::aggregate::{self, GroupOrder};
use crate::dedupe;
use crate::models::{format_number, CompletionStatus, SubmissionRecord};
use crate::select::{self, Selection};

const PENDING_LIMIT: usize = 25;

pub fn build_report(
    factory: &str,
    department: Option<&str>,
    generated_on: NaiveDate,
    statuses: &[CompletionStatus],
    submissions: &[SubmissionRecord],
) -> String {
    let stats = select::summary_stats(statuses);
    let departments = aggregate::department_summary(statuses, GroupOrder::Alphabetical);
    let pending = select::select(statuses, Selection::Pending);
    let in_scope: HashSet<&str> = statuses
        .iter()
        .map(|s| s.identifier.as_str())
        .filter(|id| !id.trim().is_empty())
        .collect();
    let doubles: Vec<SubmissionRecord> = dedupe::duplicate_identifiers(submissions)
        .into_iter()
        .filter(|s| in_scope.contains(s.identifier.as_str()))
        .collect();

    let mut output = String::new();
    let scope_label = department.unwrap_or("all departments");

    let _ = writeln!(output, "# Evaluation Completion Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) on {}",
        factory.to_uppercase(),
        scope_label,
        generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Overall");
    let _ = writeln!(
        output,
        "- {} of {} employees done ({}%), {} pending",
        stats.done, stats.total, stats.percent, stats.pending
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Departments");

    if departments.is_empty() {
        let _ = writeln!(output, "No employees in scope.");
    } else {
        let _ = writeln!(output, "| Department | Total | Done | Pending |");
        let _ = writeln!(output, "|---|---|---|---|");
        for summary in &departments {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} |",
                summary.department, summary.total, summary.done, summary.pending
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Pending Employees");

    if pending.is_empty() {
        let _ = writeln!(output, "Everyone in scope has submitted.");
    } else {
        for status in pending.iter().take(PENDING_LIMIT) {
            let _ = writeln!(
                output,
                "- {} ({}, {})",
                status.name, status.identifier, status.department
            );
        }
        if pending.len() > PENDING_LIMIT {
            let _ = writeln!(output, "- ... and {} more", pending.len() - PENDING_LIMIT);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Double Input");

    if doubles.is_empty() {
        let _ = writeln!(output, "No identifier was submitted more than once.");
    } else {
        for submission in &doubles {
            let _ = writeln!(
                output,
                "- {} ({}) at {} with value {}",
                submission.name,
                submission.identifier,
                submission.timestamp,
                format_number(submission.value)
            );
        }
    }

    output
}
