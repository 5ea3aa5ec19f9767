//! Scan summary types and helpers.

mod scan_summary;

pub use scan_summary::ScanSummary;
