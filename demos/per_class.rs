use std::sync::Arc;

use nta_logger::init::init_tracing;
use nta_logger::{Level, LogRecord, LoggerConfig, LoggerRegistry, Param};

/// One logger per class, looked up through the registry. Run with
/// `--formatted-logs` to get wrapped output with dividers.
fn main() {
    let config = LoggerConfig::from_env().with_args(std::env::args());
    let registry = LoggerRegistry::new(config);

    let inventory = registry.logger_for("Inventory").expect("bind Inventory logger");
    inventory.set_level(Level::Trace);

    let record = LogRecord::new("Inventory")
        .method("load")
        .params(vec![Param::of(&"warehouse-7")])
        .message("loading stock");
    let _ = inventory.enter(&record);

    let record = LogRecord::new("Inventory")
        .method("load")
        .message("Loaded %d items from %s")
        .params(vec![Param::of(&5), Param::of(&"warehouse-7")])
        .sequence(1);
    let _ = inventory.info(&record);

    // Everything emitted through `tracing` from here on lands in the
    // Orders log as well.
    let orders = registry.logger_for("Orders").expect("bind Orders logger");
    init_tracing(Arc::clone(&orders)).expect("install tracing bridge");
    tracing::warn!(target: "demo::orders", pending = 12, "order queue is backing up");

    println!("inventory log: {}", inventory.log_path().display());
    println!("orders log:    {}", orders.log_path().display());

    registry.close_all();
}
