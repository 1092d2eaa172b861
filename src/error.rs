use thiserror::Error;

/// Hard failures of the analysis core.
///
/// Recoverable conditions (a malformed frame, too few samples for a
/// histogram) are represented in the data model instead, so that one bad
/// feature never blocks the rest of a report.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Rejected at configuration construction, before any data is touched.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Two histograms built under different binning policies were compared.
    /// This is a caller bug, comparing them would be scientifically invalid.
    #[error("histogram policy mismatch: {0}")]
    PolicyMismatch(String),
}
