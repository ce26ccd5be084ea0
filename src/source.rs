use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::{Dataset, ResolvedFactory};
use crate::error::{Result, TrackerError};
use crate::models::RawRow;
use crate::normalize;

/// How the columns of a CSV body map onto row fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvLayout {
    /// First line names the columns.
    Headers,
    /// Published form responses: timestamp in column 0, name in column 2,
    /// department in column 3. The header line is skipped.
    FormResponses,
}

impl CsvLayout {
    pub fn for_dataset(dataset: &Dataset) -> Self {
        match dataset {
            Dataset::Sheet(_) => CsvLayout::FormResponses,
            Dataset::Employees | Dataset::Submissions => CsvLayout::Headers,
        }
    }
}

#[async_trait]
pub trait RowSource: Send + Sync {
    async fn fetch_rows(&self, dataset: &Dataset) -> Result<Vec<RawRow>>;
}

/// Reads the data sets of one factory over HTTP or from local files.
pub struct ConfiguredSource {
    client: reqwest::Client,
    factory: ResolvedFactory,
}

impl ConfiguredSource {
    pub fn new(factory: ResolvedFactory, timeout_secs: u64) -> Result<Self> {
        let client = build_client(timeout_secs)?;
        Ok(Self { client, factory })
    }

    pub fn factory(&self) -> &ResolvedFactory {
        &self.factory
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    async fn fetch_text(&self, location: &str) -> Result<String> {
        if !is_remote(location) {
            debug!(%location, "reading local file");
            return Ok(tokio::fs::read_to_string(location).await?);
        }

        let response = self
            .client
            .get(location)
            .header(ACCEPT, "text/csv, application/json")
            .send()
            .await
            .map_err(|e| transport(location, e))?;

        let status = response.status();
        debug!(%location, %status, "response received");
        if !status.is_success() {
            return Err(TrackerError::Transport {
                location: location.to_string(),
                message: format!("HTTP {}", status.as_u16()),
            });
        }

        response.text().await.map_err(|e| transport(location, e))
    }
}

#[async_trait]
impl RowSource for ConfiguredSource {
    async fn fetch_rows(&self, dataset: &Dataset) -> Result<Vec<RawRow>> {
        let location = self.factory.location(dataset)?;
        info!(
            factory = %self.factory.key.to_uppercase(),
            %dataset,
            "fetching"
        );

        let body = self.fetch_text(location).await?;
        debug!(chars = body.len(), "body fetched");

        let rows = parse_body(location, &body, CsvLayout::for_dataset(dataset))?;
        info!(%dataset, rows = rows.len(), "parsed");
        Ok(rows)
    }
}

pub fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| transport("client", e))
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn transport(location: &str, err: reqwest::Error) -> TrackerError {
    TrackerError::Transport {
        location: location.to_string(),
        message: err.to_string(),
    }
}

fn malformed(location: &str, message: impl Into<String>) -> TrackerError {
    TrackerError::MalformedResponse {
        location: location.to_string(),
        message: message.into(),
    }
}

/// Decodes a fetched body. JSON is recognised by its leading bracket,
/// markup is rejected, anything else is read as CSV.
pub fn parse_body(location: &str, body: &str, layout: CsvLayout) -> Result<Vec<RawRow>> {
    let trimmed = body.trim_start();
    if trimmed.starts_with('<') {
        return Err(malformed(location, "unexpected shape"));
    }
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed)
            .map_err(|e| malformed(location, format!("unexpected shape: {e}")))?;
        return rows_from_json(location, value);
    }

    let (headers, rows) = rows_from_csv(body, layout)?;
    if layout == CsvLayout::Headers && !headers.iter().any(|h| normalize::is_known_field(h)) {
        return Err(malformed(location, "unexpected shape"));
    }
    Ok(rows)
}

pub fn rows_from_json(location: &str, value: Value) -> Result<Vec<RawRow>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(RawRow(map)),
                other => Err(malformed(
                    location,
                    format!("expected an object per row, got {other}"),
                )),
            })
            .collect(),
        Value::Object(mut map) => {
            if let Some(error) = map.get("error") {
                let message = error
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string());
                return Err(malformed(location, message));
            }
            match map.remove("data") {
                Some(data @ Value::Array(_)) => rows_from_json(location, data),
                _ => Err(malformed(location, "unexpected shape")),
            }
        }
        _ => Err(malformed(location, "unexpected shape")),
    }
}

/// Header names and rows of a CSV body.
pub fn rows_from_csv(body: &str, layout: CsvLayout) -> Result<(Vec<String>, Vec<RawRow>)> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(body.trim().as_bytes());

    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();

    for result in reader.records() {
        let record = result?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let row = match layout {
            CsvLayout::Headers => headers
                .iter()
                .zip(record.iter())
                .fold(RawRow::new(), |row, (key, value)| row.with(key, value)),
            CsvLayout::FormResponses => RawRow::new()
                .with("timestamp", record.get(0).unwrap_or_default())
                .with("name", record.get(2).unwrap_or_default())
                .with("department", record.get(3).unwrap_or_default()),
        };
        rows.push(row);
    }

    Ok((headers.iter().map(str::to_string).collect(), rows))
}

/// Posts an evaluation as form fields and returns the endpoint's JSON
/// acknowledgment.
pub async fn submit(
    client: &reqwest::Client,
    location: &str,
    fields: &[(String, String)],
) -> Result<Value> {
    info!(%location, fields = fields.len(), "submitting evaluation");
    let response = client
        .post(location)
        .form(fields)
        .send()
        .await
        .map_err(|e| transport(location, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(TrackerError::Transport {
            location: location.to_string(),
            message: format!("HTTP {}", status.as_u16()),
        });
    }

    let ack: Value = response.json().await.map_err(|e| transport(location, e))?;
    if let Some(error) = ack.get("error") {
        let message = error
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(malformed(location, message));
    }
    Ok(ack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use std::io::Write;

    #[test]
    fn json_error_object_surfaces_message() {
        let err = parse_body("endpoint", r#"{"error": "sheet not shared"}"#, CsvLayout::Headers)
            .unwrap_err();
        match err {
            TrackerError::MalformedResponse { message, .. } => {
                assert_eq!(message, "sheet not shared")
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn html_error_page_is_rejected() {
        let body = "<!DOCTYPE html>\n<html><body>Script error</body></html>\n";
        let err = parse_body("endpoint", body, CsvLayout::Headers).unwrap_err();
        match err {
            TrackerError::MalformedResponse { message, .. } => {
                assert_eq!(message, "unexpected shape")
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(parse_body("endpoint", body, CsvLayout::FormResponses).is_err());
    }

    #[test]
    fn csv_without_known_columns_is_rejected() {
        let body = "colour,size\nred,10\n";
        let err = parse_body("endpoint", body, CsvLayout::Headers).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedResponse { .. }));

        let rows = parse_body("endpoint", "NIK,Shoe\n1001,42\n", CsvLayout::Headers).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn broken_json_is_malformed() {
        let err = parse_body("endpoint", "[{\"nik\": 1,", CsvLayout::Headers).unwrap_err();
        assert!(matches!(err, TrackerError::MalformedResponse { .. }));
    }

    #[test]
    fn json_without_rows_is_unexpected_shape() {
        let err = parse_body("endpoint", r#"{"ok": true}"#, CsvLayout::Headers).unwrap_err();
        assert!(err.to_string().contains("unexpected shape"));
    }

    #[test]
    fn json_array_and_data_wrapper_yield_rows() {
        let rows = parse_body("endpoint", r#"[{"nik": 1}, {"nik": 2}]"#, CsvLayout::Headers)
            .unwrap();
        assert_eq!(rows.len(), 2);

        let rows = parse_body("endpoint", r#"{"data": [{"nik": 3}]}"#, CsvLayout::Headers)
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn header_csv_keys_rows_by_column() {
        let body = "nik,nama,departemen\n1001,Avery Lee,Paint\n\n1002,\"Moreno, Jules\",Weld\n";
        let (headers, rows) = rows_from_csv(body, CsvLayout::Headers).unwrap();
        assert_eq!(headers, vec!["nik", "nama", "departemen"]);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].0.get("nama"), Some(&Value::from("Moreno, Jules")));
    }

    #[test]
    fn form_responses_are_positional() {
        let body = "Timestamp,Email,Nama,Departemen\n\
                    3/1/2024 8:00:00,a@x.com, Avery Lee ,Paint\n\
                    3/1/2024 9:00:00,b@x.com,Jules\n";
        let (_, rows) = rows_from_csv(body, CsvLayout::FormResponses).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].0.get("name"), Some(&Value::from("Avery Lee")));
        assert_eq!(rows[0].0.get("timestamp"), Some(&Value::from("3/1/2024 8:00:00")));
        assert_eq!(rows[1].0.get("department"), Some(&Value::from("")));
    }

    #[tokio::test]
    async fn reads_local_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "nik,nama,departemen").unwrap();
        writeln!(file, "1001,Avery Lee,Paint").unwrap();

        let toml = format!(
            "[factories.bogor]\nemployees = \"{}\"\n",
            file.path().display()
        );
        let factory = TrackerConfig::from_toml(&toml)
            .unwrap()
            .resolve_factory(Some("bogor"), None)
            .unwrap();
        let source = ConfiguredSource::new(factory, 5).unwrap();

        let rows = source.fetch_rows(&Dataset::Employees).await.unwrap();
        assert_eq!(rows.len(), 1);

        let err = source.fetch_rows(&Dataset::Submissions).await.unwrap_err();
        assert!(matches!(err, TrackerError::ConfigurationMissing { .. }));
    }
}
