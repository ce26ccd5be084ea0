use tracing::info;

use crate::config::Dataset;
use crate::error::Result;
use crate::models::{CompletionStatus, EmployeeRecord, SubmissionRecord};
use crate::normalize;
use crate::reconcile::{self, ReconcileScope};
use crate::source::RowSource;

/// Complete rows of a published sheet. Rows without a name or department
/// are dropped.
pub async fn fetch_sheet<S>(source: &S, factory: &str, sheet: &str) -> Result<Vec<SubmissionRecord>>
where
    S: RowSource + ?Sized,
{
    let rows = source.fetch_rows(&Dataset::Sheet(sheet.to_string())).await?;
    let records: Vec<SubmissionRecord> = normalize::normalize_submissions(&rows, factory)
        .into_iter()
        .filter(|r| !r.name.is_empty() && !r.department.is_empty())
        .collect();
    info!(sheet, parsed = rows.len(), complete = records.len(), "sheet loaded");
    Ok(records)
}

/// Employees and submissions of a factory, fetched concurrently. Either
/// failure aborts the whole load.
pub async fn fetch_roster<S>(
    source: &S,
    factory: &str,
) -> Result<(Vec<EmployeeRecord>, Vec<SubmissionRecord>)>
where
    S: RowSource + ?Sized,
{
    let employees = Dataset::Employees;
    let submissions = Dataset::Submissions;
    let (employee_rows, submission_rows) = tokio::try_join!(
        source.fetch_rows(&employees),
        source.fetch_rows(&submissions),
    )?;

    Ok((
        normalize::normalize_employees(&employee_rows, factory),
        normalize::normalize_submissions(&submission_rows, factory),
    ))
}

pub async fn load_statuses<S>(source: &S, scope: &ReconcileScope) -> Result<Vec<CompletionStatus>>
where
    S: RowSource + ?Sized,
{
    let (employees, submissions) = fetch_roster(source, &scope.factory).await?;
    let statuses = reconcile::reconcile(&employees, &submissions, scope);
    info!(
        employees = employees.len(),
        submissions = submissions.len(),
        reconciled = statuses.len(),
        "reconciled"
    );
    Ok(statuses)
}
