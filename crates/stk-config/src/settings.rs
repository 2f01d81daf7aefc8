//! Typed merge settings.
//!
//! # Precedence
//! command-line flag > layered YAML config > environment > default.
//!
//! Flags are applied by the binary; this module resolves config and
//! environment. Feed sources are file paths or `http(s)://` URLs.

use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use stk_feed::KeyField;

/// Store feed location used when config names none.
pub const ENV_STORE_FEED_URL: &str = "STORE_FEED_URL";
/// Supplier feed location used when config names none.
pub const ENV_SUPPLIER_FEED_URL: &str = "SUPPLIER_FEED_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, PartialEq, Eq)]
pub struct MergeSettings {
    pub key_field: KeyField,
    pub store: Option<String>,
    pub supplier: Option<String>,
    pub fetch_timeout_secs: u64,
    pub xml_out: Option<PathBuf>,
    pub csv_out: Option<PathBuf>,
    pub csv_delimiter: u8,
    pub json_out: Option<PathBuf>,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            key_field: KeyField::default(),
            store: None,
            supplier: None,
            fetch_timeout_secs: DEFAULT_TIMEOUT_SECS,
            xml_out: None,
            csv_out: None,
            csv_delimiter: b',',
            json_out: None,
        }
    }
}

// Feed URLs from the environment may embed tokens; never print them.
impl fmt::Debug for MergeSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergeSettings")
            .field("key_field", &self.key_field)
            .field("store", &self.store.as_deref().map(redact_source))
            .field("supplier", &self.supplier.as_deref().map(redact_source))
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("xml_out", &self.xml_out)
            .field("csv_out", &self.csv_out)
            .field("csv_delimiter", &(self.csv_delimiter as char))
            .field("json_out", &self.json_out)
            .finish()
    }
}

/// Strip the query string and userinfo from URL sources; paths pass through.
pub fn redact_source(src: &str) -> String {
    match url::Url::parse(src) {
        Ok(mut u) if matches!(u.scheme(), "http" | "https") => {
            u.set_query(None);
            let _ = u.set_username("");
            let _ = u.set_password(None);
            u.to_string()
        }
        _ => src.to_string(),
    }
}

impl MergeSettings {
    /// Read settings from a merged config document. Absent keys take their
    /// defaults; present keys of the wrong type are errors.
    pub fn from_config_json(config: &Value) -> Result<MergeSettings> {
        let mut s = MergeSettings::default();

        if let Some(k) = opt_str(config, "/merge/key_field")? {
            s.key_field = KeyField::parse(&k).context("CONFIG_INVALID /merge/key_field")?;
        }
        s.store = opt_str(config, "/feeds/store")?;
        s.supplier = opt_str(config, "/feeds/supplier")?;

        match config.pointer("/feeds/timeout_secs") {
            None | Some(Value::Null) => {}
            Some(v) => match v.as_u64() {
                Some(n) if n > 0 => s.fetch_timeout_secs = n,
                _ => bail!("CONFIG_INVALID /feeds/timeout_secs must be a positive integer"),
            },
        }

        s.xml_out = opt_str(config, "/output/xml")?.map(PathBuf::from);
        s.csv_out = opt_str(config, "/output/csv")?.map(PathBuf::from);
        s.json_out = opt_str(config, "/output/json")?.map(PathBuf::from);

        if let Some(d) = opt_str(config, "/output/csv_delimiter")? {
            s.csv_delimiter = parse_delimiter(&d).context("CONFIG_INVALID /output/csv_delimiter")?;
        }

        Ok(s)
    }

    /// Fill feed sources still unset from the environment.
    ///
    /// `lookup` is `std::env::var(..).ok()` in production; tests pass a map.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        if self.store.is_none() {
            self.store = non_empty(ENV_STORE_FEED_URL);
        }
        if self.supplier.is_none() {
            self.supplier = non_empty(ENV_SUPPLIER_FEED_URL);
        }
    }
}

/// A delimiter must be exactly one ASCII character.
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [b] if b.is_ascii() && *b != b'"' && *b != b'\n' && *b != b'\r' => Ok(*b),
        _ => bail!("delimiter must be a single ASCII character other than quote or newline, got {s:?}"),
    }
}

fn opt_str(config: &Value, ptr: &str) -> Result<Option<String>> {
    match config.pointer(ptr) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(other) => bail!("CONFIG_INVALID {ptr} must be a string, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_when_config_empty() {
        let s = MergeSettings::from_config_json(&json!({})).unwrap();
        assert_eq!(s, MergeSettings::default());
        assert_eq!(s.key_field, KeyField::Barcode);
        assert_eq!(s.fetch_timeout_secs, 30);
        assert_eq!(s.csv_delimiter, b',');
    }

    #[test]
    fn reads_every_consumed_pointer() {
        let cfg = json!({
            "merge": { "key_field": "stokKodu" },
            "feeds": { "store": "a.xml", "supplier": "https://ex.com/b.xml", "timeout_secs": 5 },
            "output": { "xml": "out.xml", "csv": "out.csv", "csv_delimiter": ";", "json": "rows.json" }
        });
        let s = MergeSettings::from_config_json(&cfg).unwrap();
        assert_eq!(s.key_field, KeyField::StockCode);
        assert_eq!(s.store.as_deref(), Some("a.xml"));
        assert_eq!(s.supplier.as_deref(), Some("https://ex.com/b.xml"));
        assert_eq!(s.fetch_timeout_secs, 5);
        assert_eq!(s.xml_out, Some(PathBuf::from("out.xml")));
        assert_eq!(s.csv_out, Some(PathBuf::from("out.csv")));
        assert_eq!(s.json_out, Some(PathBuf::from("rows.json")));
        assert_eq!(s.csv_delimiter, b';');
    }

    #[test]
    fn invalid_values_are_errors() {
        for cfg in [
            json!({ "merge": { "key_field": "sku" } }),
            json!({ "feeds": { "timeout_secs": 0 } }),
            json!({ "feeds": { "store": 12 } }),
            json!({ "output": { "csv_delimiter": "::" } }),
        ] {
            assert!(MergeSettings::from_config_json(&cfg).is_err(), "accepted {cfg}");
        }
    }

    #[test]
    fn env_fills_only_missing_sources() {
        let mut s = MergeSettings {
            store: Some("local.xml".to_string()),
            ..MergeSettings::default()
        };
        s.apply_env(|name| match name {
            ENV_STORE_FEED_URL => Some("https://ex.com/store.xml".to_string()),
            ENV_SUPPLIER_FEED_URL => Some("https://ex.com/supplier.xml".to_string()),
            _ => None,
        });
        assert_eq!(s.store.as_deref(), Some("local.xml"));
        assert_eq!(s.supplier.as_deref(), Some("https://ex.com/supplier.xml"));
    }

    #[test]
    fn blank_env_value_is_ignored() {
        let mut s = MergeSettings::default();
        s.apply_env(|_| Some("  ".to_string()));
        assert_eq!(s.store, None);
    }

    #[test]
    fn debug_redacts_url_query() {
        let s = MergeSettings {
            store: Some("https://ex.com/store.xml?token=hunter2".to_string()),
            ..MergeSettings::default()
        };
        let dbg = format!("{s:?}");
        assert!(!dbg.contains("hunter2"), "{dbg}");
        assert!(dbg.contains("https://ex.com/store.xml"));
    }
}
