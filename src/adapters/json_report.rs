//! JSON report adapter implementing ReportPort.

use crate::domain::error::StratsimError;
use crate::domain::report::Report;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct JsonReportAdapter;

impl ReportPort for JsonReportAdapter {
    fn write(&self, report: &Report, output_path: &Path) -> Result<(), StratsimError> {
        let json = serde_json::to_string_pretty(report).map_err(|e| StratsimError::Report {
            reason: format!("failed to serialize report: {e}"),
        })?;
        fs::write(output_path, json)?;
        Ok(())
    }
}
