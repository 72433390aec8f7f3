//! CSV export of verdicts

use std::path::{Path, PathBuf};

use chrono::Utc;
use shared_types::ComplianceVerdict;
use tracing::info;

pub const CSV_HEADER: [&str; 7] = [
    "Feature ID",
    "Title",
    "Requires Geo-Compliance",
    "Risk Score",
    "Reasoning",
    "Regions Affected",
    "Timestamp",
];

/// Separator between regions inside the "Regions Affected" column
pub const REGION_SEPARATOR: &str = "; ";

/// Render verdicts as CSV text with a header row
pub fn to_csv(verdicts: &[ComplianceVerdict]) -> String {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));

    for verdict in verdicts {
        push_row(
            &mut out,
            [
                verdict.feature_id.clone(),
                verdict.title.clone(),
                verdict.requires_geo_compliance.to_string(),
                verdict.risk_score.to_string(),
                verdict.reasoning.clone(),
                verdict
                    .regions_affected
                    .iter()
                    .cloned()
                    .collect::<Vec<_>>()
                    .join(REGION_SEPARATOR),
                verdict.timestamp.to_rfc3339(),
            ],
        );
    }
    out
}

/// Write verdicts to `compliance_analysis_<YYYYmmdd_HHMMSS>.csv` inside `dir`
pub async fn write_csv_export(
    dir: impl AsRef<Path>,
    verdicts: &[ComplianceVerdict],
) -> std::io::Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;

    let path = dir.join(export_file_name());
    tokio::fs::write(&path, to_csv(verdicts)).await?;

    info!(path = %path.display(), rows = verdicts.len(), "CSV export written");
    Ok(path)
}

pub fn export_file_name() -> String {
    format!("compliance_analysis_{}.csv", Utc::now().format("%Y%m%d_%H%M%S"))
}

fn push_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row: Vec<String> = fields.into_iter().map(|f| escape_field(&f)).collect();
    out.push_str(&row.join(","));
    out.push_str("\r\n");
}

/// Quote a field when it contains a delimiter, quote or line break
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
