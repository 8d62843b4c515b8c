//! Tests for command-line parsing and the option to configuration mapping.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use price_tracker::config::{LogFormat, LogLevel, Opt};
use price_tracker::Config;

#[test]
fn test_defaults() {
    let opt = Opt::try_parse_from(["price_tracker"]).expect("parse");
    assert!(!opt.run_loop);
    assert!(!opt.list);
    assert_eq!(opt.interval_minutes, 30);
    assert_eq!(opt.products, PathBuf::from("data/products.json"));
    assert_eq!(opt.history, PathBuf::from("data/history.csv"));

    let config = Config::from(&opt);
    assert_eq!(config.max_concurrency, 1);
    assert_eq!(config.fetch.retry_count, 3);
    assert_eq!(config.fetch.backoff_base, Duration::from_secs(3));
    assert_eq!(config.fetch.request_timeout, Duration::from_secs(15));
}

#[test]
fn test_loop_and_tuning_flags() {
    let opt = Opt::try_parse_from([
        "price_tracker",
        "--loop",
        "--interval-minutes",
        "15",
        "--retries",
        "5",
        "--backoff-seconds",
        "2",
        "--timeout-seconds",
        "20",
        "--max-concurrency",
        "0",
        "--log-level",
        "debug",
        "--log-format",
        "json",
    ])
    .expect("parse");
    assert!(opt.run_loop);
    assert!(matches!(opt.log_level, LogLevel::Debug));
    assert!(matches!(opt.log_format, LogFormat::Json));

    let config = Config::from(&opt);
    assert_eq!(config.interval_minutes, 15);
    assert_eq!(config.fetch.retry_count, 5);
    assert_eq!(config.fetch.backoff_base, Duration::from_secs(2));
    assert_eq!(config.fetch.request_timeout, Duration::from_secs(20));
    assert_eq!(config.max_concurrency, 1, "zero workers is raised to one");
}

#[test]
fn test_registry_commands() {
    let opt = Opt::try_parse_from([
        "price_tracker",
        "--import-csv",
        "products.csv",
        "--export-csv",
        "out.csv",
        "--list",
        "--products",
        "/tmp/p.json",
    ])
    .expect("parse");
    assert_eq!(opt.import_csv, Some(PathBuf::from("products.csv")));
    assert_eq!(opt.export_csv, Some(PathBuf::from("out.csv")));
    assert!(opt.list);
    assert_eq!(Config::from(&opt).products_path, PathBuf::from("/tmp/p.json"));
}

#[test]
fn test_invalid_log_level_rejected() {
    assert!(Opt::try_parse_from(["price_tracker", "--log-level", "verbose"]).is_err());
}
