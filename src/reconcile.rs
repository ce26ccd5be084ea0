use std::collections::HashMap;

use crate::models::{CompletionStatus, EmployeeRecord, Status, SubmissionRecord};

/// Which employees take part in a reconciliation.
#[derive(Debug, Clone, Default)]
pub struct ReconcileScope {
    /// Current tenant; employees tagged with another factory are dropped.
    pub factory: String,
    /// Exact-match department filter, `None` keeps every department.
    pub department: Option<String>,
}

impl ReconcileScope {
    pub fn new(factory: &str) -> Self {
        Self {
            factory: factory.to_string(),
            department: None,
        }
    }

    pub fn with_department(mut self, department: Option<String>) -> Self {
        self.department = department;
        self
    }

    pub fn admits(&self, employee: &EmployeeRecord) -> bool {
        let same_factory = employee.factory.trim().is_empty()
            || employee.factory.trim().eq_ignore_ascii_case(self.factory.trim());
        let same_department = self
            .department
            .as_deref()
            .map_or(true, |wanted| employee.department == wanted);
        same_factory && same_department
    }
}

/// Maps each identifier to the last submission carrying it.
///
/// Later submissions overwrite earlier ones, so a double input reports the
/// most recently listed entry. Submissions without an identifier are skipped.
pub fn latest_by_identifier(
    submissions: &[SubmissionRecord],
) -> HashMap<&str, &SubmissionRecord> {
    submissions
        .iter()
        .filter(|submission| !submission.identifier.trim().is_empty())
        .fold(HashMap::new(), |mut latest, submission| {
            latest.insert(submission.identifier.as_str(), submission);
            latest
        })
}

pub fn reconcile(
    employees: &[EmployeeRecord],
    submissions: &[SubmissionRecord],
    scope: &ReconcileScope,
) -> Vec<CompletionStatus> {
    let latest = latest_by_identifier(submissions);

    employees
        .iter()
        .filter(|employee| scope.admits(employee))
        .map(|employee| {
            let mut status = CompletionStatus {
                identifier: employee.identifier.clone(),
                name: employee.name.clone(),
                department: employee.department.clone(),
                factory: employee.factory.clone(),
                status: Status::Pending,
                value: None,
                timestamp: None,
            };
            // A blank identifier never matches.
            let matched = match employee.identifier.trim() {
                "" => None,
                identifier => latest.get(identifier),
            };
            if let Some(submission) = matched {
                status.status = Status::Done;
                status.value = Some(submission.value);
                status.timestamp = Some(submission.timestamp.clone());
            }
            status
        })
        .collect()
}
