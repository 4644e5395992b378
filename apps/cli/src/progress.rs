//! Spinner shown while a measurement window elapses

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

pub struct MeasureSpinner {
    bar: ProgressBar,
}

impl MeasureSpinner {
    pub fn new(message: impl Into<String>) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        bar.set_message(message.into());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn finish(self, message: &str) {
        self.bar
            .finish_with_message(format!("{} {}", style("✓").green().bold(), message));
    }
}
