// src/metrics.rs
//! Series names and one-time descriptions. The binary installs no exporter;
//! an embedding process (or a test) can install any `metrics` recorder.

use metrics::{describe_counter, describe_gauge, describe_histogram};
use once_cell::sync::OnceCell;

pub const ITEMS_FETCHED: &str = "alerts_items_fetched_total";
pub const ITEMS_FILTERED: &str = "alerts_items_filtered_total";
pub const SOURCE_ERRORS: &str = "alerts_source_errors_total";
pub const DISPATCHED: &str = "alerts_dispatched_total";
pub const DELIVERY_ERRORS: &str = "alerts_delivery_errors_total";
pub const FETCH_MS: &str = "alerts_fetch_ms";
pub const LAST_RUN_TS: &str = "alerts_last_run_ts";

pub fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(ITEMS_FETCHED, "Items parsed from all sources.");
        describe_counter!(
            ITEMS_FILTERED,
            "Items dropped before dispatch, labelled by reason."
        );
        describe_counter!(SOURCE_ERRORS, "Source fetch/parse failures.");
        describe_counter!(DISPATCHED, "Notifications accepted by the sink.");
        describe_counter!(DELIVERY_ERRORS, "Notifications the sink rejected.");
        describe_histogram!(FETCH_MS, "Source fetch + parse time in milliseconds.");
        describe_gauge!(LAST_RUN_TS, "Unix ts when the last run finished.");
    });
}
