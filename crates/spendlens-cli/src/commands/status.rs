//! Config and health commands

use std::fmt;

use anyhow::{bail, Result};
use spendlens_core::{AnalyzerConfig, ClassifierBackend, ClassifierClient};

pub fn cmd_config(config: &AnalyzerConfig) -> Result<()> {
    print!("{}", render_config(config));
    Ok(())
}

/// Human-readable effective configuration
pub fn render_config(config: &AnalyzerConfig) -> String {
    ConfigView(config).to_string()
}

struct ConfigView<'a>(&'a AnalyzerConfig);

impl fmt::Display for ConfigView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let config = self.0;

        writeln!(f, "⚙️  Configuration ({})", config.source)?;
        writeln!(f)?;

        writeln!(f, "Thresholds:")?;
        if config.thresholds.is_empty() {
            writeln!(f, "   (none)")?;
        }
        for (category, limit) in config.thresholds.iter() {
            writeln!(f, "   {:<24} ${:.2}", category, limit)?;
        }

        writeln!(f)?;
        writeln!(f, "Category mapping:")?;
        if config.categories.is_empty() {
            writeln!(f, "   (none)")?;
        }
        for (from, to) in config.categories.sorted() {
            writeln!(f, "   {} → {}", from, to)?;
        }

        writeln!(f)?;
        writeln!(f, "Classifier:")?;
        writeln!(f, "   timeout: {}s", config.classifier.timeout.as_secs())?;
        writeln!(f, "   retries: {}", config.classifier.max_retries)?;
        writeln!(f, "   concurrency: {}", config.classifier.concurrency)?;
        if !config.category_hints.is_empty() {
            writeln!(f, "   hints: {}", config.category_hints.join(", "))?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "Alerts: debits_are_negative = {}",
            config.alerts.debits_are_negative
        )
    }
}

/// Check the classifier connection
pub async fn cmd_health(classifier: &ClassifierClient) -> Result<()> {
    println!("🔍 Checking classifier...\n");
    println!("  Backend: {}", classifier.backend_name());
    println!("  Host: {}", classifier.host());
    println!("  Model: {}\n", classifier.model());

    if classifier.health_check().await {
        println!("✅ Connected");
        Ok(())
    } else {
        println!("❌ Not responding");
        println!("\nTo set up Ollama:");
        println!("  1. Install Ollama: https://ollama.ai/download");
        println!("  2. Start the server: ollama serve");
        println!("  3. Pull the model: ollama pull {}", classifier.model());
        println!("  4. Set environment variable: export OLLAMA_HOST=http://localhost:11434");
        bail!("Classifier at {} is not responding", classifier.host())
    }
}
