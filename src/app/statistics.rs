//! End-of-cycle statistics printing.

use log::{info, warn};
use strum::IntoEnumIterator;

use crate::error_handling::{FailureKind, InfoType, ProcessingStats, WarningType};
use crate::CycleReport;

/// Prints the one-line cycle summary followed by the failure, warning and
/// info counters.
pub fn print_cycle_statistics(report: &CycleReport, stats: &ProcessingStats) {
    info!(
        "✅ Checked {} product{} ({} recorded, {} skipped, {} alert{} sent) in {:.1}s{}",
        report.total_products,
        if report.total_products == 1 { "" } else { "s" },
        report.recorded,
        report.skipped,
        report.alerts_sent,
        if report.alerts_sent == 1 { "" } else { "s" },
        report.elapsed_seconds,
        if report.cancelled { " (cancelled)" } else { "" }
    );
    if report.history_failures > 0 {
        warn!(
            "{} record{} could not be written to history",
            report.history_failures,
            if report.history_failures == 1 { "" } else { "s" }
        );
    }
    print_processing_statistics(stats);
}

/// Prints failure, warning, and info counters to the log.
///
/// Categories with a zero total are omitted.
pub fn print_processing_statistics(stats: &ProcessingStats) {
    let total_failures = stats.total_failures();
    let total_warnings = stats.total_warnings();
    let total_info = stats.total_info();

    if total_failures > 0 {
        info!("Failure Counts ({} total):", total_failures);
        for kind in FailureKind::iter() {
            let count = stats.get_failure_count(kind);
            if count > 0 {
                info!("   {}: {}", kind.as_str(), count);
            }
        }
    }

    if total_warnings > 0 {
        info!("Warning Counts ({} total):", total_warnings);
        for warning_type in WarningType::iter() {
            let count = stats.get_warning_count(warning_type);
            if count > 0 {
                info!("   {}: {}", warning_type.as_str(), count);
            }
        }
    }

    if total_info > 0 {
        info!("Info Counts ({} total):", total_info);
        for info_type in InfoType::iter() {
            let count = stats.get_info_count(info_type);
            if count > 0 {
                info!("   {}: {}", info_type.as_str(), count);
            }
        }
    }
}
