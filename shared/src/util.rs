//! Time and ID helpers shared by the whole stack.

/// Current UTC timestamp in milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Generate a Snowflake-style i64 for use as a resource ID.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random (4096 values per ms, collision-free at shop scale)
pub fn snowflake_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    let now = now_millis();
    let ts = (now - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
    let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
    (ts << 12) | rand_bits
}

/// Generate a prefixed, time-ordered entity ID, e.g. `drop_8796093022208`.
///
/// Entity IDs are opaque strings everywhere else in the system; the prefix
/// only exists to make logs and DB dumps readable.
pub fn entity_id(prefix: &str) -> String {
    format!("{prefix}_{}", snowflake_id())
}

/// Render a millisecond timestamp as RFC 3339 (UTC), for API payloads.
pub fn millis_to_rfc3339(ms: i64) -> Option<String> {
    chrono::DateTime::from_timestamp_millis(ms).map(|dt| dt.to_rfc3339())
}

/// Parse an RFC 3339 timestamp into milliseconds.
pub fn rfc3339_to_millis(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_prefixed_and_time_ordered() {
        let a = entity_id("item");
        assert!(a.starts_with("item_"));
        let na: i64 = a.trim_start_matches("item_").parse().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let b = entity_id("item");
        let nb: i64 = b.trim_start_matches("item_").parse().unwrap();
        assert!(nb > na);
    }

    #[test]
    fn rfc3339_round_trip() {
        let ms = 1_755_000_000_000;
        let s = millis_to_rfc3339(ms).unwrap();
        assert_eq!(rfc3339_to_millis(&s), Some(ms));
    }
}
