//! Output formatting utilities

use crate::OutputFormat;
use console::style;
use speedlog_types::SpeedLog;

/// Format bytes as human-readable
pub fn format_bytes(bytes: u64) -> String {
    human_bytes::human_bytes(bytes as f64)
}

/// Format a bytes/ms rate as a per-second speed
pub fn format_rate(bytes_per_ms: f64) -> String {
    format!("{}/s", human_bytes::human_bytes(bytes_per_ms * 1000.0))
}

/// Print a speed log in the requested format
pub fn print_speed_log(log: &SpeedLog, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string(log)?);
        }
        OutputFormat::Table => {
            use tabled::{Table, Tabled};

            #[derive(Tabled)]
            struct BucketRow {
                threshold: u32,
                samples: u64,
            }

            let rows: Vec<BucketRow> = log
                .distribution_in_kbps
                .iter()
                .map(|(threshold, samples)| BucketRow {
                    threshold: *threshold,
                    samples: *samples,
                })
                .collect();

            println!("Transferred: {}", format_bytes(log.total_kb_downloaded * 1024));
            println!("{}", Table::new(rows));
        }
        OutputFormat::Human => {
            let now = chrono::Local::now().format("%H:%M:%S");
            if log.is_empty() {
                println!("{} {}", style(now).dim(), style("No traffic").dim());
                return Ok(());
            }

            println!(
                "{} {} transferred, {} samples",
                style(now).dim(),
                style(format_bytes(log.total_kb_downloaded * 1024)).cyan().bold(),
                log.sample_count()
            );

            let peak = log.distribution_in_kbps.values().copied().max().unwrap_or(1);
            for (threshold, samples) in &log.distribution_in_kbps {
                let width = ((*samples * 30) / peak).max(1) as usize;
                println!(
                    "  {:>6} KB/s  {} {}",
                    threshold,
                    style("█".repeat(width)).green(),
                    samples
                );
            }
        }
    }
    Ok(())
}
