//! CLI entry point for dermascan.

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dermascan::cli::Cli;
use dermascan::config::Config;
use dermascan::inference::{Classifier, Device, Variant};
use dermascan::labels::ClassLabels;
use dermascan::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    // Load optional config, then apply CLI overrides
    let mut config = if let Some(config_path) = &cli.config {
        Config::from_yaml_file(config_path)
            .with_context(|| format!("Failed to load config: {}", config_path.display()))?
    } else {
        Config::default()
    };

    if let Some(weights) = cli.weights {
        config.model.weights_path = weights.to_string_lossy().into_owned();
    }
    if let Some(device) = cli.device {
        config.model.device = device;
    }
    if let Some(variant) = cli.variant {
        config.model.variant = variant;
    }
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    if cli.check {
        return check(&config);
    }

    let state = AppState::new(server::boot(&config.model));
    server::serve(&config, state).await?;

    Ok(())
}

/// Attempt the model load and report status without serving.
fn check(config: &Config) -> Result<()> {
    let device: Device = config.model.device.parse()?;
    let variant: Variant = config.model.variant.parse()?;
    let labels = ClassLabels::default();

    println!("dermascan v{}", env!("CARGO_PKG_VERSION"));
    println!("Weights: {}", config.model.weights_path);
    println!("Architecture: EfficientNet-{}", variant);
    println!("Device: {}", device);
    println!("Classes: {}", labels.len());

    info!("Loading model...");
    match Classifier::load(&config.model.weights_path, variant, &device, labels) {
        Ok(_) => {
            println!("Status: OK (model loaded successfully)");
            Ok(())
        }
        Err(e) => {
            eprintln!("Status: FAILED ({})", e);
            std::process::exit(1);
        }
    }
}
