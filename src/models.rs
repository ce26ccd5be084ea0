use std::fmt;

use serde_json::{Map, Value};

/// Department label used when a record carries no department.
pub const UNKNOWN_DEPARTMENT: &str = "Unknown Dept";

/// Rendered in place of value and timestamp for pending employees.
pub const PLACEHOLDER: &str = "-";

/// A loosely typed row as delivered by a source, before normalization.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow(pub Map<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmployeeRecord {
    pub identifier: String,
    pub name: String,
    pub department: String,
    pub factory: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionRecord {
    pub identifier: String,
    pub name: String,
    pub department: String,
    pub factory: String,
    pub value: f64,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Done,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "pending"),
            Status::Done => write!(f, "done"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionStatus {
    pub identifier: String,
    pub name: String,
    pub department: String,
    pub factory: String,
    pub status: Status,
    pub value: Option<f64>,
    pub timestamp: Option<String>,
}

impl CompletionStatus {
    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }

    pub fn value_label(&self) -> String {
        self.value
            .map(format_number)
            .unwrap_or_else(|| PLACEHOLDER.to_string())
    }

    pub fn timestamp_label(&self) -> &str {
        self.timestamp.as_deref().unwrap_or(PLACEHOLDER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentCount {
    pub department: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartmentSummary {
    pub department: String,
    pub total: usize,
    pub done: usize,
    pub pending: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryStats {
    pub total: usize,
    pub done: usize,
    pub pending: usize,
    pub percent: u32,
}

/// Records that can be grouped by department.
pub trait Departmental {
    fn department(&self) -> &str;
}

impl Departmental for EmployeeRecord {
    fn department(&self) -> &str {
        &self.department
    }
}

impl Departmental for SubmissionRecord {
    fn department(&self) -> &str {
        &self.department
    }
}

impl Departmental for CompletionStatus {
    fn department(&self) -> &str {
        &self.department
    }
}

/// Renders integral numbers without a fractional part.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_numbers_drop_fraction() {
        assert_eq!(format_number(12345.0), "12345");
        assert_eq!(format_number(87.5), "87.5");
        assert_eq!(format_number(-3.0), "-3");
    }

    #[test]
    fn pending_status_renders_placeholders() {
        let status = CompletionStatus {
            identifier: "7".to_string(),
            name: "Avery Lee".to_string(),
            department: "QA".to_string(),
            factory: "bogor".to_string(),
            status: Status::Pending,
            value: None,
            timestamp: None,
        };
        assert_eq!(status.value_label(), "-");
        assert_eq!(status.timestamp_label(), "-");
        assert!(!status.is_done());
    }
}
