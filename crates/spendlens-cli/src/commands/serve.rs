//! Server command implementation

use std::sync::Arc;

use anyhow::Result;
use spendlens_core::{AnalyzerConfig, ClassifierBackend, ClassifierClient, StatementAnalyzer};
use spendlens_server::ServerConfig;

pub async fn cmd_serve(
    config: AnalyzerConfig,
    classifier: ClassifierClient,
    host: &str,
    port: u16,
) -> Result<()> {
    println!("🚀 Starting SpendLens upload API...");
    println!("   Config: {}", config.source);
    println!(
        "   Classifier: {} ({}, model {})",
        classifier.host(),
        classifier.backend_name(),
        classifier.model()
    );
    println!("   Listening: http://{}:{}", host, port);
    println!("   Upload: POST http://{}:{}/api/upload", host, port);

    let server_config = ServerConfig::from_env();
    if !server_config.allowed_origins.is_empty() {
        println!(
            "   CORS origins: {} (SPENDLENS_ALLOWED_ORIGINS)",
            server_config.allowed_origins.join(", ")
        );
    }

    let analyzer = StatementAnalyzer::new(Arc::new(config), classifier);
    spendlens_server::serve(analyzer, host, port, server_config).await
}
