use prometheus::{IntCounterVec, IntGaugeVec};

lazy_static! {
    pub static ref CACHE_LOOKUPS: IntCounterVec = register_int_counter_vec!(
        "cache_lookups",
        "cache lookups by table and result",
        &["table", "result"]
    )
    .unwrap();
    pub static ref CACHE_EVICTIONS: IntCounterVec = register_int_counter_vec!(
        "cache_evictions",
        "entries evicted by lru pressure",
        &["table"]
    )
    .unwrap();
    pub static ref CACHE_ALLOC_FAILURES: IntCounterVec = register_int_counter_vec!(
        "cache_alloc_failures",
        "stores dropped for lack of memory",
        &["table"]
    )
    .unwrap();
    pub static ref CACHE_USED_BYTES: IntGaugeVec = register_int_gauge_vec!(
        "cache_used_bytes",
        "bytes accounted to each table",
        &["table"]
    )
    .unwrap();
}

#[inline]
pub fn record_lookup(table: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    CACHE_LOOKUPS.with_label_values(&[table, result]).inc();
}
