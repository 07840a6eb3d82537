//! Report export: JSON persistence and a Markdown summary.
//!
//! The JSON file is the boundary other components read, so it is only ever
//! replaced whole: the report is written to a sibling temp file and renamed
//! over the target. Unknown schema versions are rejected on load.

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use aurum_core::analysis::Correlation;
use aurum_core::{Report, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a `Report` to pretty JSON.
pub fn export_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize Report to JSON")
}

/// Deserialize a `Report` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<Report> {
    let report: Report =
        serde_json::from_str(json).context("failed to deserialize Report from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

/// Write the report to `path`, replacing any previous report atomically.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = export_json(report)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, json)
        .with_context(|| format!("failed to write {}", tmp_path.display()))?;

    // Atomic rename
    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file on rename failure
        let _ = fs::remove_file(&tmp_path);
        anyhow::anyhow!("atomic rename to {} failed: {e}", path.display())
    })?;
    Ok(())
}

/// Load a report previously written by `write_report`.
pub fn read_report(path: &Path) -> Result<Report> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

// ─── Markdown summary ───────────────────────────────────────────────

fn level(value: Option<f64>) -> String {
    value.map_or_else(|| "none".to_string(), |v| format!("{v:.2}"))
}

/// Generate a Markdown summary of a report.
pub fn render_markdown(report: &Report) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# {}: {}\n\n", report.symbol, report.status));
    md.push_str(&format!("{}\n\n", report.reason));

    md.push_str("## Snapshot\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Price | {:.2} |\n", report.price));
    md.push_str(&format!(
        "| RSI (short / long) | {:.1} / {:.1} |\n",
        report.rsi, report.rsi_long
    ));
    md.push_str(&format!("| SMA Deviation | {:+.2}% |\n", report.deviation));
    md.push_str(&format!(
        "| ATR | {:.2}{} |\n",
        report.atr,
        if report.atr_expanding { " (expanding)" } else { "" }
    ));
    let correlation = match (&report.correlation, &report.proxy_symbol) {
        (Correlation::Value(r), Some(proxy)) => format!("{r:+.3} vs {proxy}"),
        (Correlation::Value(r), None) => format!("{r:+.3}"),
        (Correlation::Unavailable, _) => "unavailable".to_string(),
    };
    md.push_str(&format!("| Correlation | {correlation} |\n"));
    md.push_str(&format!(
        "| Volume Spike | {} |\n",
        if report.vol_spike { "yes" } else { "no" }
    ));
    md.push_str(&format!("| Buy Ratio | {}% |\n", report.buy_ratio));
    md.push('\n');

    md.push_str("## Scores\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Composite Short | {:+} |\n", report.composite_short));
    md.push_str(&format!("| Composite Long | {:+} |\n", report.composite_long));
    md.push_str(&format!("| Long Trend | {} |\n", report.long_trend));
    md.push_str(&format!(
        "| Fast Sync | {} ({}) |\n",
        if report.is_synced { "synced" } else { "split" },
        report.sync_direction
    ));
    md.push('\n');

    md.push_str("## Levels\n\n");
    md.push_str("| Level | Price |\n");
    md.push_str("| --- | ---: |\n");
    md.push_str(&format!("| Rolling Resistance | {:.2} |\n", report.resistance));
    md.push_str(&format!("| Rolling Support | {:.2} |\n", report.support));
    md.push_str(&format!("| CISD Resistance | {} |\n", level(report.cisd_resistance)));
    md.push_str(&format!("| CISD Support | {} |\n", level(report.cisd_support)));
    md.push('\n');

    if !report.vacuum_zones.is_empty() {
        md.push_str("## Vacuum Zones\n\n");
        for zone in &report.vacuum_zones {
            md.push_str(&format!("- {:.2} to {:.2}\n", zone.from, zone.to));
        }
        md.push('\n');
    }

    md.push_str("## Metadata\n\n");
    md.push_str(&format!("- Updated: {}\n", report.update_timestamp.to_rfc3339()));
    md.push_str(&format!("- Dataset Hash: {}\n", report.dataset_hash));
    if report.synthetic {
        md.push_str("- Data: **SYNTHETIC**\n");
    }

    md
}
