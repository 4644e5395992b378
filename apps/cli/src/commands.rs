//! CLI command implementations

use crate::output::{format_bytes, format_rate, print_speed_log};
use crate::progress::MeasureSpinner;
use crate::{ConfigAction, OutputFormat};
use anyhow::{anyhow, Result};
use console::style;
use speedlog_core::{bucket_index, BucketTable, Bridge, SpeedMonitor, Storage, OVERFLOW_INDEX};
use speedlog_types::MonitorSettings;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

// ============================================================================
// Sampling Commands
// ============================================================================

pub async fn watch(
    storage: &Storage,
    report_every: u64,
    count: Option<u64>,
    format: OutputFormat,
) -> Result<()> {
    if report_every == 0 {
        return Err(anyhow!("--report-every must be at least 1 second"));
    }

    let settings = storage.load_settings().await?;
    let monitor = SpeedMonitor::from_settings(&settings)?;
    monitor.start();

    if matches!(format, OutputFormat::Human) {
        println!(
            "{} Sampling every {} ms, reporting every {} s (Ctrl-C to stop)",
            style("●").green().bold(),
            settings.interval_ms,
            report_every
        );
    }

    info!(report_every, ?count, "Watching network throughput");
    let result = report_until(
        &monitor,
        Duration::from_secs(report_every),
        count,
        format,
        tokio::signal::ctrl_c(),
    )
    .await;

    monitor.stop().await;
    let emitted = result?;
    info!(emitted, "Stopped watching");
    Ok(())
}

/// Print a speed log every `period` until `count` reports were printed or
/// `shutdown` completes. Returns the number of reports printed.
async fn report_until(
    monitor: &SpeedMonitor,
    period: Duration,
    count: Option<u64>,
    format: OutputFormat,
    shutdown: impl Future,
) -> Result<u64> {
    let mut reports = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    let mut emitted = 0;
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!(emitted, "Shutdown requested");
                break;
            }
            _ = reports.tick() => {
                let log = monitor.fetch_speed_log();
                print_speed_log(&log, format)?;
                emitted += 1;
                debug!(emitted, samples = log.sample_count(), "Printed speed log");
                if count.is_some_and(|limit| emitted >= limit) {
                    break;
                }
            }
        }
    }

    Ok(emitted)
}

pub async fn sample(storage: &Storage, seconds: u64, format: OutputFormat) -> Result<()> {
    let settings = storage.load_settings().await?;
    let monitor = SpeedMonitor::from_settings(&settings)?;

    let spinner = match format {
        OutputFormat::Human => Some(MeasureSpinner::new(format!("Measuring for {}s", seconds))),
        _ => None,
    };
    tokio::time::sleep(Duration::from_secs(seconds.max(1))).await;
    let outcome = monitor.tick_now();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "sample": outcome.sample,
                    "threshold": outcome.threshold,
                }))?
            );
        }
        OutputFormat::Human | OutputFormat::Table => {
            if let Some(spinner) = spinner {
                spinner.finish("Measurement complete");
            }
            println!("  Speed: {}", style(format_rate(outcome.sample.bytes_per_ms)).cyan());
            println!("  Transferred: {}", format_bytes(outcome.sample.bytes));
            match outcome.threshold {
                Some(threshold) => println!("  Bucket: {} KB/s", threshold),
                None => println!("  Bucket: {}", style("none (no traffic)").dim()),
            }
        }
    }

    Ok(())
}

pub fn classify(rate: f64, format: OutputFormat) -> Result<()> {
    let table = BucketTable::standard();
    let index = bucket_index(rate);
    let threshold = index.and_then(|i| table.threshold(i));

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "rate": rate,
                    "index": index,
                    "threshold": threshold,
                }))?
            );
        }
        OutputFormat::Human | OutputFormat::Table => match (index, threshold) {
            (Some(index), Some(threshold)) => {
                println!(
                    "{} {} -> bucket {} ({} KB/s)",
                    style("✓").green().bold(),
                    format_rate(rate),
                    index,
                    style(threshold).cyan()
                );
            }
            _ => println!("{} {} is not counted", style("○").dim(), rate),
        },
    }

    Ok(())
}

pub fn show_buckets(format: OutputFormat) -> Result<()> {
    let rows = BucketTable::standard().rows();

    match format {
        OutputFormat::Json => {
            let rows: Vec<_> = rows
                .iter()
                .map(|(index, threshold)| serde_json::json!({ "index": index, "threshold": threshold }))
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct BucketRow {
                index: i32,
                threshold: u32,
            }

            let rows: Vec<BucketRow> = rows
                .into_iter()
                .map(|(index, threshold)| BucketRow { index, threshold })
                .collect();
            println!("{}", Table::new(rows));
        }
        OutputFormat::Human => {
            println!("Speed buckets:");
            for (index, threshold) in rows {
                let label = if index == OVERFLOW_INDEX {
                    style("overflow".to_string()).yellow()
                } else {
                    style(index.to_string()).dim()
                };
                println!("  {:>8}  {} KB/s", label, threshold);
            }
        }
    }

    Ok(())
}

pub async fn invoke(
    storage: &Storage,
    action: &str,
    args: &str,
    format: OutputFormat,
) -> Result<()> {
    let args: serde_json::Value = serde_json::from_str(args)?;
    let settings = storage.load_settings().await?;
    let bridge = Bridge::new(SpeedMonitor::from_settings(&settings)?);

    tokio::time::sleep(Duration::from_millis(settings.interval_ms)).await;
    bridge.monitor().tick_now();

    let result = bridge.execute(action, &args)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&result)?),
        OutputFormat::Human | OutputFormat::Table => {
            println!("{}", serde_json::to_string_pretty(&result)?)
        }
    }

    Ok(())
}

// ============================================================================
// Config Commands
// ============================================================================

pub async fn config_action(
    storage: &Storage,
    action: Option<ConfigAction>,
    format: OutputFormat,
) -> Result<()> {
    match action {
        None | Some(ConfigAction::Show) => {
            let settings = storage.load_settings().await?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                }
                _ => {
                    println!("SpeedLog Configuration:");
                    println!();
                    println!("  Warm-up: {} ms", settings.warmup_ms);
                    println!("  Interval: {} ms", settings.interval_ms);
                    println!("  Counters: {}", settings.counters_path.display());
                    println!(
                        "  Excluded interfaces: {}",
                        settings.exclude_interfaces.join(", ")
                    );
                    println!("  Data directory: {}", storage.data_dir().display());
                    println!("  Settings file: {}", storage.settings_path().display());
                }
            }
        }

        Some(ConfigAction::Get { key }) => {
            let settings = storage.load_settings().await?;
            let value = match key.as_str() {
                "warmup_ms" => settings.warmup_ms.to_string(),
                "interval_ms" => settings.interval_ms.to_string(),
                "counters_path" => settings.counters_path.display().to_string(),
                "exclude_interfaces" => settings.exclude_interfaces.join(","),
                _ => return Err(anyhow!("Unknown config key: {}", key)),
            };
            println!("{}", value);
        }

        Some(ConfigAction::Set { key, value }) => {
            let mut settings = storage.load_settings().await?;

            match key.as_str() {
                "warmup_ms" => settings.warmup_ms = value.parse()?,
                "interval_ms" => settings.interval_ms = value.parse()?,
                "counters_path" => settings.counters_path = PathBuf::from(value),
                "exclude_interfaces" => {
                    settings.exclude_interfaces = value
                        .split(',')
                        .map(str::trim)
                        .filter(|s| !s.is_empty())
                        .map(String::from)
                        .collect()
                }
                _ => return Err(anyhow!("Unknown config key: {}", key)),
            }

            storage.save_settings(&settings).await?;
            println!("{} Config updated", style("✓").green().bold());
        }

        Some(ConfigAction::Reset) => {
            storage.reset_settings().await?;
            println!(
                "{} Settings reset to defaults ({} ms interval)",
                style("✓").green().bold(),
                MonitorSettings::default().interval_ms
            );
        }
    }

    Ok(())
}
