use clap::Parser;
use crop_disease_kb::utils::{error::ErrorSeverity, logger};
use crop_disease_kb::{CliConfig, KbError, SearchCriteria, Session};
use serde_json::json;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting crop-disease-kb session");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.session_config() {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };

    let session = match Session::start(&config) {
        Ok(session) => session,
        Err(e) => exit_with(&e),
    };

    let mut report = serde_json::Map::new();

    if !cli.images.is_empty() {
        let mut detections = Vec::new();
        for image in &cli.images {
            match session.submit_detection(image.as_str()).await {
                Ok(result) => detections.push(serde_json::to_value(&result)?),
                Err(e) => {
                    tracing::error!("❌ Detection for {} failed: {}", image, e);
                    detections.push(json!({
                        "imageRef": image,
                        "error": e.user_friendly_message(),
                        "retryable": e.is_retryable(),
                    }));
                }
            }
        }
        report.insert("detections".to_string(), detections.into());
    }

    if cli.wants_search() {
        let criteria = match SearchCriteria::from_tokens(
            cli.query.as_deref().unwrap_or(""),
            &cli.crops,
            &cli.severities,
            &cli.regions,
        ) {
            Ok(criteria) => criteria,
            Err(e) => exit_with(&e),
        };
        let results: Vec<_> = session
            .search(&criteria)
            .into_iter()
            .map(|d| json!({ "id": d.id, "name": d.name, "severity": d.severity }))
            .collect();
        report.insert("search".to_string(), results.into());
    }

    if cli.history {
        report.insert("history".to_string(), serde_json::to_value(session.get_history())?);
    }

    if cli.stats {
        report.insert("stats".to_string(), serde_json::to_value(session.get_stats())?);
    }

    if report.is_empty() {
        report.insert("catalog".to_string(), serde_json::to_value(session.load_catalog())?);
    }

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn exit_with(e: &KbError) -> ! {
    tracing::error!(
        "❌ {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
    eprintln!("❌ {}", e.user_friendly_message());

    let exit_code = match e.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}
