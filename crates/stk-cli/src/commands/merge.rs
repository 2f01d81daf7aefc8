//! `stk merge`: fetch both feeds, merge, write the outputs.
//!
//! Precedence for every setting: flag > config file > environment > default.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use stk_config::{
    load_layered_yaml, parse_delimiter, report_unused_keys, MergeSettings, UnusedKeyPolicy,
    ENV_STORE_FEED_URL, ENV_SUPPLIER_FEED_URL,
};
use stk_feed::KeyField;
use stk_merge::TableOptions;
use tracing::{info, warn};

use super::write_output;
use crate::source::{http_client, FeedSource};

#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Store feed (authoritative): file path or http(s) URL
    #[arg(long)]
    pub store: Option<String>,

    /// Supplier feed: file path or http(s) URL
    #[arg(long)]
    pub supplier: Option<String>,

    /// Join field: barkod | stokKodu
    #[arg(long)]
    pub key: Option<String>,

    /// Write merged XML here instead of stdout
    #[arg(long)]
    pub xml_out: Option<PathBuf>,

    /// Write the summary table (CSV) here
    #[arg(long)]
    pub csv_out: Option<PathBuf>,

    /// CSV field delimiter (single ASCII character)
    #[arg(long)]
    pub csv_delimiter: Option<String>,

    /// Write summary rows as JSON here
    #[arg(long)]
    pub json_out: Option<PathBuf>,

    /// Layered config paths in merge order
    #[arg(long = "config")]
    pub config_paths: Vec<String>,

    /// Fail (instead of warn) on config keys nothing reads
    #[arg(long, default_value_t = false)]
    pub strict_config: bool,

    /// HTTP fetch timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,
}

/// Resolve settings from config, then flags, then environment.
pub fn resolve_settings<F>(args: &MergeArgs, env: F) -> Result<MergeSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let mut s = if args.config_paths.is_empty() {
        MergeSettings::default()
    } else {
        let refs: Vec<&str> = args.config_paths.iter().map(|p| p.as_str()).collect();
        let loaded = load_layered_yaml(&refs)?;
        let policy = if args.strict_config {
            UnusedKeyPolicy::Fail
        } else {
            UnusedKeyPolicy::Warn
        };
        let report = report_unused_keys(&loaded.config_json, policy)?;
        for ptr in &report.unused_leaf_pointers {
            warn!(pointer = %ptr, "unused config key");
        }
        info!(config_hash = %loaded.config_hash, "config loaded");
        MergeSettings::from_config_json(&loaded.config_json)?
    };

    if let Some(k) = &args.key {
        s.key_field = KeyField::parse(k)?;
    }
    if let Some(v) = &args.store {
        s.store = Some(v.clone());
    }
    if let Some(v) = &args.supplier {
        s.supplier = Some(v.clone());
    }
    if let Some(p) = &args.xml_out {
        s.xml_out = Some(p.clone());
    }
    if let Some(p) = &args.csv_out {
        s.csv_out = Some(p.clone());
    }
    if let Some(p) = &args.json_out {
        s.json_out = Some(p.clone());
    }
    if let Some(d) = &args.csv_delimiter {
        s.csv_delimiter = parse_delimiter(d).context("invalid --csv-delimiter")?;
    }
    if let Some(t) = args.timeout_secs {
        anyhow::ensure!(t > 0, "--timeout-secs must be positive");
        s.fetch_timeout_secs = t;
    }

    s.apply_env(env);
    Ok(s)
}

pub async fn run(args: MergeArgs) -> Result<()> {
    let settings = resolve_settings(&args, |k| std::env::var(k).ok())?;

    let store = settings.store.as_deref().with_context(|| {
        format!("no store feed: pass --store, set /feeds/store, or set {ENV_STORE_FEED_URL}")
    })?;
    let supplier = settings.supplier.as_deref().with_context(|| {
        format!("no supplier feed: pass --supplier, set /feeds/supplier, or set {ENV_SUPPLIER_FEED_URL}")
    })?;
    let store = FeedSource::parse(store)?;
    let supplier = FeedSource::parse(supplier)?;
    info!(store = %store, supplier = %supplier, key_field = %settings.key_field, "merging feeds");

    let client = http_client(settings.fetch_timeout_secs)?;
    let (store_xml, supplier_xml) =
        tokio::try_join!(store.fetch(&client), supplier.fetch(&client))?;

    let merged = stk_merge::merge_feeds(&store_xml, &supplier_xml, settings.key_field.tag())?;

    info!(
        store_products = merged.rows.len(),
        matched = merged.matched,
        clamped = merged.clamped_keys().count(),
        diagnostics = merged.diagnostics.len(),
        "merge summary"
    );

    let xml = merged.to_xml()?;
    write_output(settings.xml_out.as_deref(), &xml).await?;

    if let Some(p) = &settings.csv_out {
        let table = merged.to_table(&TableOptions {
            delimiter: settings.csv_delimiter,
        })?;
        write_output(Some(p), &table).await?;
    }

    if let Some(p) = &settings.json_out {
        let json = serde_json::to_vec_pretty(&merged.rows).context("rows json serialize failed")?;
        write_output(Some(p), &json).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> MergeArgs {
        MergeArgs {
            store: None,
            supplier: None,
            key: None,
            xml_out: None,
            csv_out: None,
            csv_delimiter: None,
            json_out: None,
            config_paths: Vec::new(),
            strict_config: false,
            timeout_secs: None,
        }
    }

    fn env(name: &str) -> Option<String> {
        match name {
            ENV_STORE_FEED_URL => Some("https://env.example.com/store.xml".to_string()),
            ENV_SUPPLIER_FEED_URL => Some("https://env.example.com/supplier.xml".to_string()),
            _ => None,
        }
    }

    #[test]
    fn env_used_when_nothing_else_set() {
        let s = resolve_settings(&args(), env).unwrap();
        assert_eq!(s.store.as_deref(), Some("https://env.example.com/store.xml"));
        assert_eq!(s.key_field, KeyField::Barcode);
    }

    #[test]
    fn flags_beat_config_and_env() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = dir.path().join("merge.yaml");
        std::fs::write(
            &cfg,
            "merge:\n  key_field: stokKodu\nfeeds:\n  store: cfg-store.xml\n  supplier: cfg-supplier.xml\n",
        )
        .unwrap();

        let a = MergeArgs {
            store: Some("flag-store.xml".to_string()),
            key: Some("barkod".to_string()),
            config_paths: vec![cfg.to_string_lossy().to_string()],
            ..args()
        };
        let s = resolve_settings(&a, env).unwrap();
        assert_eq!(s.store.as_deref(), Some("flag-store.xml"));
        assert_eq!(s.supplier.as_deref(), Some("cfg-supplier.xml"));
        assert_eq!(s.key_field, KeyField::Barcode);
    }

    #[test]
    fn invalid_flag_values_rejected() {
        let bad_key = MergeArgs {
            key: Some("sku".to_string()),
            ..args()
        };
        assert!(resolve_settings(&bad_key, env).is_err());

        let bad_delim = MergeArgs {
            csv_delimiter: Some("tab".to_string()),
            ..args()
        };
        assert!(resolve_settings(&bad_delim, env).is_err());
    }
}
