use chrono::{TimeZone, Utc};
use nta_logger::critical::incident_file_name;
use nta_logger::environment::{AppInfo, EnvironmentSnapshot};
use nta_logger::notifier::NoopNotifier;
use nta_logger::{Level, LogRecord, Logger, LoggerConfig, LoggerError, Param, Thrown};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn open_logger(root: &Path, level: Level) -> Logger {
    let mut config = LoggerConfig::new(root, "Ledger");
    config.level = level;
    let mut app = AppInfo::new("Ledger", "GS United Labs", "3.7");
    app.installed_modules = vec!["Accounting".to_string()];
    Logger::with_collaborators(
        &config,
        Arc::new(EnvironmentSnapshot::capture(app)),
        Arc::new(NoopNotifier),
    )
}

fn read(logger: &Logger) -> String {
    fs::read_to_string(logger.log_path()).expect("read log")
}

#[test]
fn info_threshold_drops_debug_and_formats_info() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Info);
    logger.bind("Inventory").unwrap();

    let record = LogRecord::new("Inventory")
        .method("load")
        .message("Loaded %d items")
        .params(vec![Param::of(&5)]);

    logger.debug(&record).unwrap();
    assert_eq!(read(&logger), "");

    logger.info(&record).unwrap();
    let text = read(&logger);
    assert!(text.contains("Loaded 5 items"), "{text}");
    assert_eq!(text.lines().count(), 1);
    assert!(logger.log_path().ends_with("var/log/Ledger - Inventory.log"));
}

#[test]
fn binding_twice_or_blank_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Info);

    assert!(matches!(logger.set_class_name(""), Err(LoggerError::InvalidArgument(_))));
    logger.set_class_name("Inventory").unwrap();
    assert!(matches!(
        logger.set_class_name("Inventory"),
        Err(LoggerError::InvalidState(_))
    ));

    // The placeholder name sticks until the rename is requested.
    assert!(logger.log_path().ends_with("Ledger - null.log"));
    logger.update_log_name().unwrap();
    assert!(logger.log_path().ends_with("Ledger - Inventory.log"));
}

#[test]
fn lines_written_before_bind_survive_the_rename() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Info);
    logger.info(&LogRecord::new("Inventory").message("early")).unwrap();
    logger.bind("Inventory").unwrap();
    logger.info(&LogRecord::new("Inventory").message("late")).unwrap();

    let text = read(&logger);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("; early"));
    assert!(lines[1].ends_with("; late"));
}

#[test]
fn critical_writes_one_incident_and_one_pointer() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Error);
    logger.bind("Ledger").unwrap();

    let instant = Utc.with_ymd_and_hms(2021, 10, 28, 22, 9, 45).unwrap();
    let record = LogRecord::new("Ledger")
        .method("post")
        .at(instant)
        .params(vec![Param::of(&"12a")])
        .message("posting aborted")
        .thrown(Thrown::new("ParseIntError", "invalid digit found in string")
            .with_stack_trace(["ledger::post", "main"]));

    logger.critical(&record).unwrap();

    let err_dir = tmp.path().join("var").join("err");
    let incidents: Vec<_> = fs::read_dir(&err_dir).unwrap().map(|e| e.unwrap().path()).collect();
    assert_eq!(incidents.len(), 1);

    let incident = &incidents[0];
    let expected_name = incident_file_name(&record, &instant);
    assert_eq!(incident.file_name().unwrap().to_string_lossy(), expected_name);
    assert_eq!(expected_name, "2021-10-28T22-09-45.000Z-Ledger.post.err.log");

    let report = fs::read_to_string(incident).unwrap();
    assert!(report.starts_with("ParseIntError thrown at 2021-10-28T22:09:45Z\n"));
    assert!(report.contains("Location: Ledger.post(&str [12a])"));
    assert!(report.contains("Ledger (GS United Labs)"));
    assert!(report.contains("\tAccounting\n"));
    assert!(report.contains("Runtime Information:"));
    assert!(report.contains("Exception Message: invalid digit found in string"));
    assert!(report.contains("\n\tledger::post\n\tmain"));

    let log = read(&logger);
    let pointers: Vec<&str> = log.lines().filter(|l| l.contains("CRITICAL:")).collect();
    assert_eq!(pointers.len(), 1);
    assert!(pointers[0].starts_with("2021-10-28T22:09:45Z: CRITICAL: See detailed error log at "));
    assert!(pointers[0].ends_with(&incident.display().to_string()));
}

#[test]
fn critical_still_points_when_incident_cannot_be_written() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Info);
    fs::write(tmp.path().join("var").join("err"), "blocks the incident directory").unwrap();

    let record = LogRecord::new("Ledger")
        .method("post")
        .thrown(Thrown::new("Panic", "boom"));
    logger.critical(&record).unwrap();

    let log = read(&logger);
    assert!(log.contains(": CRITICAL: See detailed error log at "));
}

#[test]
fn method_tracing_round_trip_at_trace() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Trace);

    let enter = LogRecord::new("Calculator")
        .method("add")
        .sequence(1)
        .params(vec![Param::of(&2), Param::of(&3)])
        .message("Adding two numbers.");
    let exit = LogRecord::new("Calculator")
        .method("add")
        .sequence(2)
        .params(vec![Param::of(&5)])
        .message("The sum of 2 + 3 is 5");

    logger.enter(&enter).unwrap();
    logger.exit(&exit).unwrap();

    let text = read(&logger);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains(" [SEQ 1]: ENTERING: Calculator.add(i32 [2], i32 [3]); Thread ID: "));
    assert!(lines[1].contains(" [SEQ 2]: EXITING: Calculator.add() RETURNINGi32 [5]; Thread ID: "));
    assert!(lines[1].ends_with("; The sum of 2 + 3 is 5"));
}

#[test]
fn concurrent_writers_never_interleave() {
    let tmp = TempDir::new().unwrap();
    let logger = Arc::new(open_logger(tmp.path(), Level::Info));

    let handles: Vec<_> = (0..8)
        .map(|worker| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..50 {
                    let record = LogRecord::new("Worker")
                        .method("run")
                        .message("worker %d line %d")
                        .params(vec![Param::of(&worker), Param::of(&i)]);
                    logger.info(&record).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let text = read(&logger);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 400);
    assert!(lines
        .iter()
        .all(|l| l.contains("INFO: Worker.run(); Thread ID: ") && l.contains(" line ")));
}

#[test]
fn reused_record_is_read_at_call_time() {
    let tmp = TempDir::new().unwrap();
    let logger = open_logger(tmp.path(), Level::Info);

    let mut record = LogRecord::new("Inventory").method("scan");
    for n in 1..=3u32 {
        record.message = format!("pass {}", n);
        record.sequence_number = u64::from(n);
        logger.info(&record).unwrap();
    }

    let text = read(&logger);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].contains("[SEQ 1]") && lines[0].ends_with("pass 1"));
    assert!(lines[2].contains("[SEQ 3]") && lines[2].ends_with("pass 3"));
}

#[test]
fn second_unbound_logger_leaves_first_log_intact() {
    let tmp = TempDir::new().unwrap();
    let first = open_logger(tmp.path(), Level::Info);
    first.info(&LogRecord::new("Inventory").message("early from inventory")).unwrap();

    let second = open_logger(tmp.path(), Level::Info);
    first.bind("Inventory").unwrap();
    second.bind("Orders").unwrap();
    second.info(&LogRecord::new("Orders").message("from orders")).unwrap();

    assert!(second.log_path().ends_with("var/log/Ledger - Orders.log"));
    let inventory = read(&first);
    assert!(inventory.contains("early from inventory"));
    assert!(!inventory.contains("from orders"));
    assert!(read(&second).contains("from orders"));
}
