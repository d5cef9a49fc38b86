use crate::domain::model::LabReport;
use crate::utils::error::{LabError, Result};
use std::fmt::Write;

/// Human readable summary of a finished run.
pub fn render_summary(report: &LabReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "📋 Isolation lab report ({})",
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    for scenario in &report.scenarios {
        let mark = if scenario.passed { "✅" } else { "❌" };
        let _ = writeln!(
            out,
            "  {} {} ({}ms)",
            mark, scenario.name, scenario.duration_ms
        );
        for note in &scenario.observations {
            let _ = writeln!(out, "      {}", note);
        }
        if let Some(error) = &scenario.error {
            let _ = writeln!(out, "      error: {}", error);
        }
    }

    let passed = report.scenarios.len() - report.failed().len();
    let _ = writeln!(
        out,
        "  {}/{} scenario(s) passed, {} transfer(s) recorded",
        passed,
        report.scenarios.len(),
        report.transfers.len()
    );
    out
}

pub fn render_json(report: &LabReport) -> Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Turns failed scenarios into an error so the binaries can map it to an
/// exit code.
pub fn ensure_passed(report: &LabReport) -> Result<()> {
    let failed = report.failed();
    if failed.is_empty() {
        return Ok(());
    }
    let names: Vec<&str> = failed.iter().map(|s| s.name.as_str()).collect();
    Err(LabError::ScenarioFailed {
        scenario: names.join(", "),
        message: format!("{} of {} scenario(s) failed", failed.len(), report.scenarios.len()),
    })
}
