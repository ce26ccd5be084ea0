use serde_json::Value;

use crate::models::{
    format_number, EmployeeRecord, RawRow, SubmissionRecord, UNKNOWN_DEPARTMENT,
};

// Source keys accepted for each canonical field, checked in order.
const IDENTIFIER_KEYS: &[&str] = &["identifier", "id", "nik", "employee_id"];
const NAME_KEYS: &[&str] = &["name", "nama"];
const DEPARTMENT_KEYS: &[&str] = &["department", "departemen", "dept"];
const FACTORY_KEYS: &[&str] = &["factory", "pabrik"];
const VALUE_KEYS: &[&str] = &["value", "nilai", "score"];
const TIMESTAMP_KEYS: &[&str] = &["timestamp", "created_at", "waktu"];

/// Values substituted for fields a row does not carry.
#[derive(Debug, Clone)]
pub struct FieldDefaults {
    pub factory: String,
    pub department: String,
}

impl FieldDefaults {
    /// Defaults for the employee roster: missing departments land in the
    /// unknown bucket.
    pub fn employees(factory: &str) -> Self {
        Self {
            factory: factory.to_string(),
            department: UNKNOWN_DEPARTMENT.to_string(),
        }
    }

    pub fn submissions(factory: &str) -> Self {
        Self {
            factory: factory.to_string(),
            department: String::new(),
        }
    }
}

pub fn normalize_employee(row: &RawRow, defaults: &FieldDefaults) -> EmployeeRecord {
    EmployeeRecord {
        identifier: text_field(row, IDENTIFIER_KEYS).unwrap_or_default(),
        name: text_field(row, NAME_KEYS).unwrap_or_default(),
        department: text_field(row, DEPARTMENT_KEYS)
            .unwrap_or_else(|| defaults.department.clone()),
        factory: text_field(row, FACTORY_KEYS).unwrap_or_else(|| defaults.factory.clone()),
    }
}

pub fn normalize_submission(row: &RawRow, defaults: &FieldDefaults) -> SubmissionRecord {
    SubmissionRecord {
        identifier: text_field(row, IDENTIFIER_KEYS).unwrap_or_default(),
        name: text_field(row, NAME_KEYS).unwrap_or_default(),
        department: text_field(row, DEPARTMENT_KEYS)
            .unwrap_or_else(|| defaults.department.clone()),
        factory: text_field(row, FACTORY_KEYS).unwrap_or_else(|| defaults.factory.clone()),
        value: number_field(row, VALUE_KEYS).unwrap_or(0.0),
        timestamp: text_field(row, TIMESTAMP_KEYS).unwrap_or_default(),
    }
}

pub fn normalize_employees(rows: &[RawRow], factory: &str) -> Vec<EmployeeRecord> {
    let defaults = FieldDefaults::employees(factory);
    rows.iter()
        .map(|row| normalize_employee(row, &defaults))
        .collect()
}

pub fn normalize_submissions(rows: &[RawRow], factory: &str) -> Vec<SubmissionRecord> {
    let defaults = FieldDefaults::submissions(factory);
    rows.iter()
        .map(|row| normalize_submission(row, &defaults))
        .collect()
}

/// Whether `key` names any canonical field under one of its aliases.
pub fn is_known_field(key: &str) -> bool {
    let key = key.trim().to_lowercase();
    [
        IDENTIFIER_KEYS,
        NAME_KEYS,
        DEPARTMENT_KEYS,
        FACTORY_KEYS,
        VALUE_KEYS,
        TIMESTAMP_KEYS,
    ]
    .iter()
    .any(|aliases| aliases.contains(&key.as_str()))
}

fn lookup<'a>(row: &'a RawRow, keys: &[&str]) -> impl Iterator<Item = &'a Value> + 'a {
    let keys: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
    keys.into_iter().filter_map(move |wanted| {
        row.iter()
            .find(|(key, _)| key.trim().to_lowercase() == wanted)
            .map(|(_, value)| value)
    })
}

/// First non-blank scalar under any of `keys`, as trimmed text.
fn text_field(row: &RawRow, keys: &[&str]) -> Option<String> {
    lookup(row, keys).find_map(|value| {
        let text = match value {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.as_f64().map(format_number)?,
            Value::Bool(b) => b.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        (!text.is_empty()).then_some(text)
    })
}

fn number_field(row: &RawRow, keys: &[&str]) -> Option<f64> {
    lookup(row, keys).find_map(|value| {
        let number = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().replace(',', ".").parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_fields_take_defaults() {
        let employee = normalize_employee(&RawRow::new(), &FieldDefaults::employees("bogor"));
        assert_eq!(employee.identifier, "");
        assert_eq!(employee.name, "");
        assert_eq!(employee.department, UNKNOWN_DEPARTMENT);
        assert_eq!(employee.factory, "bogor");

        let submission =
            normalize_submission(&RawRow::new(), &FieldDefaults::submissions("karawang"));
        assert_eq!(submission.department, "");
        assert_eq!(submission.value, 0.0);
        assert_eq!(submission.timestamp, "");
        assert_eq!(submission.factory, "karawang");
    }

    #[test]
    fn aliases_and_numeric_identifiers_are_accepted() {
        let row = RawRow::new()
            .with("NIK", json!(10234))
            .with("Nama", " Kiara Patel ")
            .with("departemen", "Welding")
            .with("nilai", "87,5")
            .with("timestamp", "2024-03-01 08:00");

        let submission = normalize_submission(&row, &FieldDefaults::submissions("bogor"));
        assert_eq!(submission.identifier, "10234");
        assert_eq!(submission.name, "Kiara Patel");
        assert_eq!(submission.department, "Welding");
        assert_eq!(submission.value, 87.5);
        assert_eq!(submission.timestamp, "2024-03-01 08:00");
    }

    #[test]
    fn explicit_factory_overrides_default() {
        let row = RawRow::new().with("id", "1").with("factory", "karawang");
        let employee = normalize_employee(&row, &FieldDefaults::employees("bogor"));
        assert_eq!(employee.factory, "karawang");
    }

    #[test]
    fn blank_and_unparseable_values_fall_back() {
        let row = RawRow::new()
            .with("department", "   ")
            .with("value", "n/a")
            .with("name", Value::Null);
        let employee = normalize_employee(&row, &FieldDefaults::employees("bogor"));
        assert_eq!(employee.department, UNKNOWN_DEPARTMENT);
        assert_eq!(employee.name, "");

        let submission = normalize_submission(&row, &FieldDefaults::submissions("bogor"));
        assert_eq!(submission.value, 0.0);
    }

    #[test]
    fn non_finite_values_fall_back_to_zero() {
        let defaults = FieldDefaults::submissions("bogor");
        for raw in ["NaN", "inf", "-infinity"] {
            let row = RawRow::new().with("nilai", raw);
            assert_eq!(normalize_submission(&row, &defaults).value, 0.0);
        }
    }

    #[test]
    fn known_fields_match_any_alias() {
        assert!(is_known_field(" NIK "));
        assert!(is_known_field("Departemen"));
        assert!(!is_known_field("colour"));
    }
}
