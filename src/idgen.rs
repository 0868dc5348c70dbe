use snowflake::SnowflakeIdGenerator;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, UNIX_EPOCH};

// 2024-03-01T00:00:00Z
const LEDGER_EPOCH: u64 = 1709251200000;

static GENERATOR: once_cell::sync::Lazy<Mutex<SnowflakeIdGenerator>> = once_cell::sync::Lazy::new(|| {
    let epoch = UNIX_EPOCH + Duration::from_millis(LEDGER_EPOCH);
    let machine_id = fastrand::i32(0..32);
    let node_id = fastrand::i32(0..32);
    Mutex::new(SnowflakeIdGenerator::with_epoch(machine_id, node_id, epoch))
});

/// Next id for transactions, order requests and notifications.
pub fn next_id() -> i64 {
    GENERATOR
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .generate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_next_id_is_positive_and_unique() {
        let mut seen = HashSet::new();
        for idx in 0..10000 {
            let id = next_id();
            assert!(id > 0, "id: {}, idx: {}", id, idx);
            assert!(seen.insert(id), "duplicate id {} at {}", id, idx);
        }
    }
}
