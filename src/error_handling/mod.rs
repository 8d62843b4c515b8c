//! Error handling and processing statistics.
//!
//! This module provides:
//! - Error type definitions for every layer (initialization, config, transport,
//!   extraction, registry, history, alerts)
//! - Processing statistics tracking (failures, warnings, info metrics)
//! - Transport error categorization and the alert retry strategy
//!
//! Statistics are categorized into:
//! - **Failures**: Terminal reason classes for a skipped cycle
//! - **Warnings**: Fields missing from an otherwise valid record
//! - **Info**: Informational metrics (warm-up failures, alerts, recoveries)

mod categorization;
mod stats;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, get_retry_strategy};
pub use stats::ProcessingStats;
pub use types::{
    AlertError, ConfigError, ExtractionFailure, FailureKind, HistoryError, InfoType,
    InitializationError, RegistryError, TransportError, WarningType,
};

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_processing_stats_initialization() {
        let stats = ProcessingStats::new();
        for kind in FailureKind::iter() {
            assert_eq!(stats.get_failure_count(kind), 0);
        }
        for warning_type in WarningType::iter() {
            assert_eq!(stats.get_warning_count(warning_type), 0);
        }
        for info_type in InfoType::iter() {
            assert_eq!(stats.get_info_count(info_type), 0);
        }
    }

    #[test]
    fn test_processing_stats_increment() {
        let stats = ProcessingStats::new();
        stats.increment_failure(FailureKind::Blocked);
        assert_eq!(stats.get_failure_count(FailureKind::Blocked), 1);

        stats.increment_warning(WarningType::MissingRating);
        assert_eq!(stats.get_warning_count(WarningType::MissingRating), 1);

        stats.increment_info(InfoType::WarmupFailed);
        assert_eq!(stats.get_info_count(InfoType::WarmupFailed), 1);
    }

    #[test]
    fn test_processing_stats_totals() {
        let stats = ProcessingStats::new();
        stats.increment_failure(FailureKind::Blocked);
        stats.increment_failure(FailureKind::TransportError);
        stats.increment_warning(WarningType::MissingTitle);
        stats.increment_info(InfoType::PriceAlert);

        assert_eq!(stats.total_failures(), 2);
        assert_eq!(stats.total_warnings(), 1);
        assert_eq!(stats.total_info(), 1);
    }
}
