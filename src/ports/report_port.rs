//! Report output port trait.

use crate::domain::error::StratsimError;
use crate::domain::report::Report;
use std::path::Path;

/// Port for persisting a finished report.
pub trait ReportPort {
    fn write(&self, report: &Report, output_path: &Path) -> Result<(), StratsimError>;
}
