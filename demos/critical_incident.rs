use std::sync::Arc;

use nta_logger::environment::{AppInfo, EnvironmentSnapshot};
use nta_logger::notifier::StderrNotifier;
use nta_logger::{LogRecord, Logger, LoggerConfig, Param, Thrown};

fn parse_amount(raw: &str) -> Result<u32, std::num::ParseIntError> {
    raw.parse()
}

/// Dump a critical incident: the main log gets a pointer line, the full
/// report goes to `var/err/`.
fn main() {
    let config = LoggerConfig::from_env();

    let mut app = AppInfo::new(config.app_name.clone(), "GS United Labs", "3.7");
    app.installed_modules = vec!["Accounting".to_string(), "Bug Reporter".to_string()];

    let logger = Logger::with_collaborators(
        &config,
        Arc::new(EnvironmentSnapshot::capture(app)),
        Arc::new(StderrNotifier),
    );
    logger.bind("Ledger").expect("bind logger");

    let raw = "12a";
    if let Err(e) = parse_amount(raw) {
        let record = LogRecord::new("Ledger")
            .method("post")
            .params(vec![Param::of(&raw)])
            .message("Posting aborted, ledger totals are no longer trustworthy.")
            .thrown(Thrown::from_error(&e));
        logger.critical(&record).expect("critical record carries a fault");
    }

    println!("log file:     {}", logger.log_path().display());
    println!("incident dir: {}", logger.incident_dir().display());
    logger.close();
}
