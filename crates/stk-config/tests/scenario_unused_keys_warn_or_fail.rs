//! Unused config keys.
//!
//! GREEN when:
//! - a config that only uses consumed keys reports clean under both policies
//! - a misspelled key is reported (sorted) under Warn
//! - the same config is an error under Fail

use stk_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

const CLEAN: &str = r#"
merge:
  key_field: "barcode"
feeds:
  store: "store.xml"
  supplier: "supplier.xml"
output:
  json: "rows.json"
"#;

const TYPO: &str = r#"
feeds:
  store: "store.xml"
  suplier: "supplier.xml"
output:
  xlm: "out.xml"
"#;

#[test]
fn clean_config_passes_both_policies() {
    let cfg = load_layered_yaml_from_strings(&[CLEAN]).unwrap();
    assert!(report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Warn)
        .unwrap()
        .is_clean());
    assert!(report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Fail)
        .unwrap()
        .is_clean());
}

#[test]
fn empty_config_is_clean() {
    let cfg = load_layered_yaml_from_strings(&[]).unwrap();
    assert!(report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Fail)
        .unwrap()
        .is_clean());
}

#[test]
fn typos_reported_under_warn() {
    let cfg = load_layered_yaml_from_strings(&[TYPO]).unwrap();
    let report = report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/feeds/suplier".to_string(), "/output/xlm".to_string()]
    );
}

#[test]
fn typos_fail_under_fail() {
    let cfg = load_layered_yaml_from_strings(&[TYPO]).unwrap();
    let err = report_unused_keys(&cfg.config_json, UnusedKeyPolicy::Fail).unwrap_err();
    assert!(err.to_string().contains("CONFIG_UNUSED_KEYS"), "{err}");
}
