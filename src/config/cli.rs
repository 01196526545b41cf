use crate::config::toml_config::SessionConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "crop-disease-kb")]
#[command(about = "Crop disease knowledge base: simulated detection, search and statistics")]
pub struct CliConfig {
    /// Path to a TOML session configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Image reference to run a simulated detection on (repeatable)
    #[arg(long = "image")]
    pub images: Vec<String>,

    /// Free-text search over disease and scientific names
    #[arg(long)]
    pub query: Option<String>,

    #[arg(long = "crop")]
    pub crops: Vec<String>,

    #[arg(long = "severity")]
    pub severities: Vec<String>,

    #[arg(long = "region")]
    pub regions: Vec<String>,

    /// Print the statistics summary
    #[arg(long)]
    pub stats: bool,

    /// Print the detection history after all detections ran
    #[arg(long)]
    pub history: bool,

    /// Override detection.delay_ms from the config file
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Override detection.seed from the config file
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines instead of compact text
    #[arg(long)]
    pub json_logs: bool,
}

impl CliConfig {
    pub fn wants_search(&self) -> bool {
        self.query.is_some()
            || !self.crops.is_empty()
            || !self.severities.is_empty()
            || !self.regions.is_empty()
    }

    /// Loads the config file (or defaults) and applies command line overrides.
    pub fn session_config(&self) -> Result<SessionConfig> {
        let mut config = match &self.config {
            Some(path) => SessionConfig::from_file(path)?,
            None => SessionConfig::default(),
        };

        if let Some(delay_ms) = self.delay_ms {
            config.detection.delay_ms = delay_ms;
            tracing::info!("🔧 detection.delay_ms overridden to: {}", delay_ms);
        }
        if let Some(seed) = self.seed {
            config.detection.seed = Some(seed);
            tracing::info!("🔧 detection.seed overridden to: {}", seed);
        }

        Ok(config)
    }
}
