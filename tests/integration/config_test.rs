//! Integration tests for configuration loading

use depth_mirror::config::Config;
use rust_decimal_macros::dec;
use std::io::Write;

#[test]
fn test_example_config_parses() {
    let config: Config = toml::from_str(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.market.symbol, "BTCUSD");
    assert_eq!(config.book.spread, dec!(0.05));
    assert_eq!(config.book.max_levels, 100);
    assert!(config.credentials.api_key.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        [market]
        symbol = "LTCUSD"

        [book]
        max_amount_per_order = 2
        "#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.market.symbol, "LTCUSD");
    assert_eq!(config.book.max_amount_per_order, dec!(2));
    assert_eq!(config.book.book_config().max_amount_per_order, dec!(2));
    assert_eq!(config.sync.snapshot_interval_secs, 60);
}

#[test]
fn test_load_rejects_invalid_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "this is not toml = = =").unwrap();
    assert!(Config::load(file.path()).is_err());
}
