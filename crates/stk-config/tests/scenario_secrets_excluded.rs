//! Credential-bearing feed URLs stay out of config files.
//!
//! GREEN when:
//! - a config URL with a token query parameter or userinfo is rejected
//! - the error names the leaf but never echoes the value
//! - plain URLs and file paths load fine

use stk_config::{load_layered_yaml_from_strings, url_carries_credentials};

#[test]
fn token_query_param_rejected_without_echo() {
    let yaml = r#"
feeds:
  supplier: "https://supplier.example.com/stock.xml?token=s3cr3t-value"
"#;
    let err = load_layered_yaml_from_strings(&[yaml]).unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("CONFIG_SECRET_DETECTED"), "{msg}");
    assert!(msg.contains("/feeds/supplier"), "{msg}");
    assert!(!msg.contains("s3cr3t-value"), "secret leaked: {msg}");
}

#[test]
fn userinfo_rejected_even_in_overlay() {
    let base = r#"
feeds:
  store: "store.xml"
"#;
    let overlay = r#"
feeds:
  store: "https://user:pw@store.example.com/feed.xml"
"#;
    assert!(load_layered_yaml_from_strings(&[base, overlay]).is_err());
}

#[test]
fn plain_sources_accepted() {
    let yaml = r#"
feeds:
  store: "/srv/feeds/store.xml"
  supplier: "https://supplier.example.com/stock.xml?format=xml"
"#;
    assert!(load_layered_yaml_from_strings(&[yaml]).is_ok());
    assert!(!url_carries_credentials("/srv/feeds/store.xml"));
    assert!(!url_carries_credentials("ftp://user:pw@host/feed.xml"));
}
