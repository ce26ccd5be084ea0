use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::Result;
use crate::select::ExportView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written { path: PathBuf, rows: usize },
    NothingToExport,
}

/// Writes `view` into `dir` with every field quoted. A missing view writes
/// nothing.
pub fn write_view(dir: &Path, view: Option<&ExportView>) -> Result<ExportOutcome> {
    let Some(view) = view.filter(|v| !v.rows.is_empty()) else {
        warn!("no data to export");
        return Ok(ExportOutcome::NothingToExport);
    };

    std::fs::create_dir_all(dir)?;
    let path = dir.join(&view.filename);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_path(&path)?;
    writer.write_record(&view.headers)?;
    for row in &view.rows {
        writer.write_record(row)?;
    }
    writer.flush()?;

    info!(rows = view.rows.len(), path = %path.display(), "exported");
    Ok(ExportOutcome::Written {
        path,
        rows: view.rows.len(),
    })
}
