use std::collections::{HashMap, HashSet};

use crate::models::SubmissionRecord;

/// Result of splitting records on a normalized key.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<T> {
    /// First record seen for each key, in input order.
    pub unique: Vec<T>,
    /// Every record whose key occurs more than once, in input order.
    pub duplicates: Vec<T>,
}

pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Splits `records` by the normalized key returned from `key`.
///
/// An empty key is still a key: several records with no name collide with
/// each other.
pub fn partition_by_key<T, F>(records: &[T], key: F) -> Partition<T>
where
    T: Clone,
    F: Fn(&T) -> &str,
{
    let keys: Vec<String> = records.iter().map(|r| normalize_key(key(r))).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for k in &keys {
        *counts.entry(k.as_str()).or_insert(0) += 1;
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::new();
    let mut duplicates = Vec::new();

    for (record, k) in records.iter().zip(&keys) {
        if seen.insert(k.as_str()) {
            unique.push(record.clone());
        }
        if counts.get(k.as_str()).copied().unwrap_or(0) > 1 {
            duplicates.push(record.clone());
        }
    }

    Partition { unique, duplicates }
}

pub fn unique_by_name(records: &[SubmissionRecord]) -> Vec<SubmissionRecord> {
    partition_by_key(records, |r| r.name.as_str()).unique
}

/// Submissions entered more than once under the same name.
pub fn duplicate_names(records: &[SubmissionRecord]) -> Vec<SubmissionRecord> {
    partition_by_key(records, |r| r.name.as_str()).duplicates
}

/// Submissions entered more than once under the same identifier. Records
/// without an identifier are not compared.
pub fn duplicate_identifiers(records: &[SubmissionRecord]) -> Vec<SubmissionRecord> {
    let keyed: Vec<SubmissionRecord> = records
        .iter()
        .filter(|r| !r.identifier.trim().is_empty())
        .cloned()
        .collect();
    partition_by_key(&keyed, |r| r.identifier.as_str()).duplicates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_submission(identifier: &str, name: &str) -> SubmissionRecord {
        SubmissionRecord {
            identifier: identifier.to_string(),
            name: name.to_string(),
            department: "Assembly".to_string(),
            factory: "bogor".to_string(),
            value: 80.0,
            timestamp: "2024-03-01".to_string(),
        }
    }

    #[test]
    fn names_collide_ignoring_case_and_whitespace() {
        let records = vec![
            sample_submission("1", "Alice"),
            sample_submission("2", " alice "),
            sample_submission("3", "Bob"),
        ];

        let partition = partition_by_key(&records, |r| r.name.as_str());
        assert_eq!(partition.unique.len(), 2);
        assert_eq!(partition.unique[0].identifier, "1");
        assert_eq!(partition.unique[1].identifier, "3");
        assert_eq!(partition.duplicates.len(), 2);
        assert_eq!(partition.duplicates[0].identifier, "1");
        assert_eq!(partition.duplicates[1].identifier, "2");
    }

    #[test]
    fn deduplication_is_idempotent() {
        let records = vec![
            sample_submission("1", "Alice"),
            sample_submission("2", "Bob"),
            sample_submission("3", "ALICE"),
            sample_submission("4", "Carla"),
        ];

        let once = unique_by_name(&records);
        let twice = unique_by_name(&once);
        assert_eq!(once, twice);
        assert!(duplicate_names(&once).is_empty());
    }

    #[test]
    fn empty_keys_collide() {
        let records = vec![
            sample_submission("1", ""),
            sample_submission("2", "  "),
            sample_submission("3", "Dana"),
        ];

        let duplicates = duplicate_names(&records);
        assert_eq!(duplicates.len(), 2);
        assert_eq!(unique_by_name(&records).len(), 2);
    }

    #[test]
    fn identifier_duplicates_are_flagged() {
        let records = vec![
            sample_submission("10", "Eli"),
            sample_submission("11", "Fay"),
            sample_submission("10", "Eli Again"),
        ];

        let duplicates = duplicate_identifiers(&records);
        assert_eq!(duplicates.len(), 2);
        assert!(duplicates.iter().all(|r| r.identifier == "10"));
    }

    #[test]
    fn missing_identifiers_are_not_double_input() {
        let records = vec![
            sample_submission("", "Gus"),
            sample_submission(" ", "Hana"),
            sample_submission("12", "Ivo"),
        ];
        assert!(duplicate_identifiers(&records).is_empty());
    }
}
