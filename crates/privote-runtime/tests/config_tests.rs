//! Integration tests for runtime configuration

use privote_runtime::{
    config::{CONTRACT_ADDRESS_VAR, DEFAULT_NETWORK, MODE_VAR, NETWORK_VAR},
    LedgerConfig, Mode, ProverConfig, VoteError,
};
use std::collections::HashMap;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> =
        vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn test_defaults_without_variables() {
    let config = LedgerConfig::from_lookup(lookup(&[])).unwrap();

    assert_eq!(config, LedgerConfig::development());
    assert_eq!(config.network, DEFAULT_NETWORK);
    assert!(config.contract_address.is_none());
}

#[test]
fn test_production_from_variables() {
    let config = LedgerConfig::from_lookup(lookup(&[
        (MODE_VAR, "production"),
        (NETWORK_VAR, "mainnet"),
        (CONTRACT_ADDRESS_VAR, "0xabc"),
    ]))
    .unwrap();

    assert_eq!(config.mode, Mode::Production);
    assert_eq!(config.network, "mainnet");
    assert_eq!(config.contract_address.as_deref(), Some("0xabc"));
}

#[test]
fn test_blank_contract_address_is_none() {
    let config =
        LedgerConfig::from_lookup(lookup(&[(MODE_VAR, "prod"), (CONTRACT_ADDRESS_VAR, "  ")]))
            .unwrap();

    assert!(config.mode.is_production());
    assert!(config.contract_address.is_none());
}

#[test]
fn test_unknown_mode_is_rejected() {
    let result = LedgerConfig::from_lookup(lookup(&[(MODE_VAR, "staging")]));
    assert!(matches!(result, Err(VoteError::Validation(_))));
}

#[test]
fn test_mode_parsing_aliases() {
    assert_eq!("DEV".parse::<Mode>().unwrap(), Mode::Development);
    assert_eq!("demo".parse::<Mode>().unwrap(), Mode::Development);
    assert_eq!(" Production ".parse::<Mode>().unwrap(), Mode::Production);
}

#[test]
fn test_mode_labels() {
    assert_eq!(Mode::Development.wire_label(), "demo");
    assert_eq!(Mode::Production.wire_label(), "production");
    assert_eq!(Mode::Production.to_string(), "production");
    assert_eq!(serde_json::to_string(&Mode::Development).unwrap(), "\"development\"");
}

#[test]
fn test_prover_config() {
    let config = ProverConfig::new(8, "/tmp/keys");
    assert_eq!(config.k(), 8);
    assert_eq!(config.cache_dir().to_str(), Some("/tmp/keys"));

    assert_eq!(ProverConfig::default().k(), 9);
}
