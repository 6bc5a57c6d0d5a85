//! JSON reports.

use std::path::Path;

use crate::compare::{CompareReport, FileOutcome};
use crate::model::analysis::AnalysisResult;

/// JSON document for one analysed file.
pub fn analysis_json(path: &Path, result: &AnalysisResult) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::json!({
        "file": path.to_string_lossy(),
        "analysis": serde_json::to_value(result)?,
    }))
}

fn outcome_json(outcome: &FileOutcome) -> anyhow::Result<serde_json::Value> {
    Ok(match &outcome.result {
        Ok(result) => analysis_json(&outcome.path, result)?,
        Err(e) => serde_json::json!({
            "file": outcome.path.to_string_lossy(),
            "error": e.to_string(),
            "stage": e.stage(),
        }),
    })
}

/// JSON document for a two-file comparison.
pub fn comparison_json(report: &CompareReport) -> anyhow::Result<serde_json::Value> {
    Ok(serde_json::json!({
        "a": outcome_json(&report.a)?,
        "b": outcome_json(&report.b)?,
        "comparison": serde_json::to_value(&report.comparison)?,
    }))
}
